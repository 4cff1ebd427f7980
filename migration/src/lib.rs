//! Database migrations for the Applied AI API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_catalog;
mod m2025_06_01_000002_create_news;
mod m2025_06_01_000003_create_landing_pages;
mod m2025_06_01_000004_create_mastermind;
mod m2025_06_01_000005_create_contact_submissions;
mod m2025_06_02_000001_clear_placeholder_external_ids;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000001_create_catalog::Migration),
            Box::new(m2025_06_01_000002_create_news::Migration),
            Box::new(m2025_06_01_000003_create_landing_pages::Migration),
            Box::new(m2025_06_01_000004_create_mastermind::Migration),
            Box::new(m2025_06_01_000005_create_contact_submissions::Migration),
            Box::new(m2025_06_02_000001_clear_placeholder_external_ids::Migration),
        ]
    }
}
