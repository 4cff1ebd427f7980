//! Migration to create the news tables.
//!
//! Captured stories point at their canonical story through a nullable
//! foreign key. Deleting a canonical story clears the link instead of
//! cascading.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewsArticles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NewsArticles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NewsArticles::Title).string_len(200).not_null())
                    .col(ColumnDef::new(NewsArticles::Summary).text().not_null())
                    .col(ColumnDef::new(NewsArticles::Content).text().not_null())
                    .col(
                        ColumnDef::new(NewsArticles::Category)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(NewsArticles::Url).text().null())
                    .col(
                        ColumnDef::new(NewsArticles::PublishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NewsArticles::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(NewsArticles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NewsArticles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CanonicalNewsStories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CanonicalNewsStories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::Title)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::Summary)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::EventTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(CanonicalNewsStories::Rank).integer().null())
                    .col(
                        ColumnDef::new(CanonicalNewsStories::Status)
                            .string_len(50)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::IsNoteworthy)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::NotionPageId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CanonicalNewsStories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_canonical_news_stories_status_rank")
                    .table(CanonicalNewsStories::Table)
                    .col(CanonicalNewsStories::Status)
                    .col(CanonicalNewsStories::Rank)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CapturedNewsStories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CapturedNewsStories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CapturedNewsStories::CanonicalStoryId)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CapturedNewsStories::Title).text().not_null())
                    .col(
                        ColumnDef::new(CapturedNewsStories::Text)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(CapturedNewsStories::Url).text().not_null())
                    .col(
                        ColumnDef::new(CapturedNewsStories::Source)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CapturedNewsStories::Author).string_len(255).null())
                    .col(
                        ColumnDef::new(CapturedNewsStories::PublishedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CapturedNewsStories::CapturedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_captured_news_stories_canonical_story_id")
                            .from(
                                CapturedNewsStories::Table,
                                CapturedNewsStories::CanonicalStoryId,
                            )
                            .to(CanonicalNewsStories::Table, CanonicalNewsStories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_captured_news_stories_canonical_story_id")
                    .table(CapturedNewsStories::Table)
                    .col(CapturedNewsStories::CanonicalStoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CapturedNewsStories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CanonicalNewsStories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NewsArticles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NewsArticles {
    Table,
    Id,
    Title,
    Summary,
    Content,
    Category,
    Url,
    PublishedAt,
    IsFeatured,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CanonicalNewsStories {
    Table,
    Id,
    Title,
    Summary,
    EventTime,
    Rank,
    Status,
    IsNoteworthy,
    NotionPageId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CapturedNewsStories {
    Table,
    Id,
    CanonicalStoryId,
    Title,
    Text,
    Url,
    Source,
    Author,
    PublishedDate,
    CapturedAt,
}
