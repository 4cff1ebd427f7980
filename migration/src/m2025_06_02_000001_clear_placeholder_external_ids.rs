//! Data migration that clears placeholder external ids.
//!
//! Catalog imports have historically written `''` and `'NaN'` into
//! `external_id`. Neither is a real vector-index id, so both become NULL.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const PLACEHOLDERS: [&str; 2] = ["", "NaN"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [CatalogTable::Tools, CatalogTable::Automations, CatalogTable::N8nTemplates] {
            let stmt = Query::update()
                .table(table)
                .value(ExternalId::ExternalId, Option::<String>::None)
                .and_where(Expr::col(ExternalId::ExternalId).is_in(PLACEHOLDERS))
                .to_owned();
            manager.exec_stmt(stmt).await?;
        }
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Cleared placeholders are not restored.
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum CatalogTable {
    Tools,
    Automations,
    N8nTemplates,
}

#[derive(DeriveIden)]
enum ExternalId {
    ExternalId,
}
