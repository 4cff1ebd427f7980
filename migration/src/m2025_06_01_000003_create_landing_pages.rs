//! Migration to create landing pages, waiting-list submissions and the
//! subscription session/transition tables backing the multi-step signup flow.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LandingPages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LandingPages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LandingPages::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(LandingPages::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LandingPages::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(LandingPages::TemplateContent).text().null())
                    .col(
                        ColumnDef::new(LandingPages::MailerliteGroupIds)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LandingPages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LandingPages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LandingPages::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WaitingListSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitingListSubmissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::Name)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::Email)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::BusinessName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::ProjectNature)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::Budget)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::MailerliteSubscribed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WaitingListSubmissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubscriptionSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSessions::LandingPageId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSessions::Email)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSessions::State)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSessions::BusinessType)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_sessions_landing_page_id")
                            .from(
                                SubscriptionSessions::Table,
                                SubscriptionSessions::LandingPageId,
                            )
                            .to(LandingPages::Table, LandingPages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_sessions_page_email")
                    .table(SubscriptionSessions::Table)
                    .col(SubscriptionSessions::LandingPageId)
                    .col(SubscriptionSessions::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubscriptionTransitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionTransitions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionTransitions::SessionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionTransitions::FromState)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionTransitions::ToState)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionTransitions::Step)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionTransitions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_transitions_session_id")
                            .from(
                                SubscriptionTransitions::Table,
                                SubscriptionTransitions::SessionId,
                            )
                            .to(SubscriptionSessions::Table, SubscriptionSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_transitions_session_id")
                    .table(SubscriptionTransitions::Table)
                    .col(SubscriptionTransitions::SessionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubscriptionTransitions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubscriptionSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WaitingListSubmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LandingPages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LandingPages {
    Table,
    Id,
    Title,
    Slug,
    Description,
    TemplateContent,
    MailerliteGroupIds,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WaitingListSubmissions {
    Table,
    Id,
    Name,
    Email,
    BusinessName,
    ProjectNature,
    Budget,
    MailerliteSubscribed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SubscriptionSessions {
    Table,
    Id,
    LandingPageId,
    Email,
    State,
    BusinessType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SubscriptionTransitions {
    Table,
    Id,
    SessionId,
    FromState,
    ToState,
    Step,
    OccurredAt,
}
