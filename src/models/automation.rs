//! Automation entity model
//!
//! Ready-made business automations listed alongside the tool catalog.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Allowed values for [`Model::complexity`].
pub const COMPLEXITY_CHOICES: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Allowed values for [`Model::status`].
pub const STATUS_CHOICES: [&str; 3] = ["available", "coming_soon", "beta"];

/// Automation entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "automations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Free-form category label
    pub category: String,

    /// One of [`COMPLEXITY_CHOICES`]
    pub complexity: String,

    /// Human readable estimate, e.g. "5 hours/week"
    pub time_saved: String,

    /// One of [`STATUS_CHOICES`]
    pub status: String,

    #[sea_orm(column_type = "Text")]
    pub setup_instructions: String,

    pub is_featured: bool,

    /// Identifier used by the vector index
    pub external_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
