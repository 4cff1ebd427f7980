//! n8n template entity model
//!
//! Downloadable n8n workflow templates. These are the "templates" exposed
//! by the public API and searchable through the template vector index.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "n8n_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub download_url: String,

    /// Identifier used by the vector index (metadata key `templateID`)
    pub external_id: Option<String>,

    /// Editorial score, higher sorts first
    pub score: f64,

    /// Only templates with this flag are served publicly
    pub available_on_website: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
