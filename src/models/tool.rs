//! Tool entity model
//!
//! This module contains the SeaORM entity model for the tools table, the
//! public catalog of AI tools shown on the website.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

/// Allowed values for [`Model::pricing`].
pub const PRICING_CHOICES: [&str; 4] = ["free", "freemium", "paid", "enterprise"];

/// Tool entity representing one catalog entry
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tools")]
pub struct Model {
    /// Auto-incrementing identifier (primary key)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name
    pub name: String,

    /// Long-form description
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Feature bullet points (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub features: JsonValue,

    /// Recently shipped features (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub new_features: JsonValue,

    #[sea_orm(column_type = "Text")]
    pub website_url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub source_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub affiliate_url: Option<String>,

    /// Identifier used by the vector index (join key for search results)
    pub external_id: Option<String>,

    /// Whether the tool is visible on the public site
    pub show_on_site: bool,

    /// Pricing model, one of [`PRICING_CHOICES`]
    pub pricing: String,

    pub is_featured: bool,

    pub rating: Option<f64>,

    /// Manual position in the public listing (0-based)
    pub table_order: i32,

    pub date_added: Option<Date>,

    pub last_updated: Option<Date>,

    /// Timestamp when the tool was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the tool was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tool_category::Entity")]
    ToolCategory,
}

impl Related<super::tool_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ToolCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
