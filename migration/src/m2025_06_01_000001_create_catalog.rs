//! Migration to create the catalog tables.
//!
//! Tools (with their categories), automations and n8n templates. Each catalog
//! row carries a nullable `external_id` that joins it to vector-index matches.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tools::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tools::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tools::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Tools::Description).text().not_null())
                    .col(ColumnDef::new(Tools::Features).json_binary().not_null())
                    .col(ColumnDef::new(Tools::NewFeatures).json_binary().not_null())
                    .col(
                        ColumnDef::new(Tools::WebsiteUrl)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Tools::SourceUrl).text().null())
                    .col(ColumnDef::new(Tools::ImageUrl).text().null())
                    .col(ColumnDef::new(Tools::AffiliateUrl).text().null())
                    .col(ColumnDef::new(Tools::ExternalId).string_len(255).null())
                    .col(
                        ColumnDef::new(Tools::ShowOnSite)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Tools::Pricing).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Tools::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Tools::Rating).double().null())
                    .col(
                        ColumnDef::new(Tools::TableOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Tools::DateAdded).date().null())
                    .col(ColumnDef::new(Tools::LastUpdated).date().null())
                    .col(
                        ColumnDef::new(Tools::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tools::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tools_external_id")
                    .table(Tools::Table)
                    .col(Tools::ExternalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tools_table_order")
                    .table(Tools::Table)
                    .col(Tools::TableOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ToolCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ToolCategories::ToolId).integer().not_null())
                    .col(
                        ColumnDef::new(ToolCategories::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ToolCategories::ToolId)
                            .col(ToolCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tool_categories_tool_id")
                            .from(ToolCategories::Table, ToolCategories::ToolId)
                            .to(Tools::Table, Tools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tool_categories_category_id")
                            .from(ToolCategories::Table, ToolCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Automations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Automations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Automations::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Automations::Description).text().not_null())
                    .col(
                        ColumnDef::new(Automations::Category)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Automations::Complexity)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Automations::TimeSaved)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Automations::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Automations::SetupInstructions)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Automations::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Automations::ExternalId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Automations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Automations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_automations_external_id")
                    .table(Automations::Table)
                    .col(Automations::ExternalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(N8nTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(N8nTemplates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(N8nTemplates::Name).string_len(200).not_null())
                    .col(ColumnDef::new(N8nTemplates::Description).text().not_null())
                    .col(ColumnDef::new(N8nTemplates::DownloadUrl).text().not_null())
                    .col(
                        ColumnDef::new(N8nTemplates::ExternalId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(N8nTemplates::Score)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(N8nTemplates::AvailableOnWebsite)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(N8nTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(N8nTemplates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_n8n_templates_external_id")
                    .table(N8nTemplates::Table)
                    .col(N8nTemplates::ExternalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(N8nTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Automations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ToolCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tools::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Tools {
    Table,
    Id,
    Name,
    Description,
    Features,
    NewFeatures,
    WebsiteUrl,
    SourceUrl,
    ImageUrl,
    AffiliateUrl,
    ExternalId,
    ShowOnSite,
    Pricing,
    IsFeatured,
    Rating,
    TableOrder,
    DateAdded,
    LastUpdated,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ToolCategories {
    Table,
    ToolId,
    CategoryId,
}

#[derive(DeriveIden)]
enum Automations {
    Table,
    Id,
    Name,
    Description,
    Category,
    Complexity,
    TimeSaved,
    Status,
    SetupInstructions,
    IsFeatured,
    ExternalId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum N8nTemplates {
    Table,
    Id,
    Name,
    Description,
    DownloadUrl,
    ExternalId,
    Score,
    AvailableOnWebsite,
    CreatedAt,
    UpdatedAt,
}
