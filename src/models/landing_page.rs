//! Landing page entity model
//!
//! Landing pages drive the multi-step email subscription flow. Each page
//! carries the ordered list of MailerLite groups a subscriber joins.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "landing_pages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// URL slug (unique)
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Content returned to the visitor when the flow completes
    #[sea_orm(column_type = "Text", nullable)]
    pub template_content: Option<String>,

    /// Ordered JSON array of MailerLite group id strings
    #[sea_orm(column_type = "JsonBinary")]
    pub mailerlite_group_ids: JsonValue,

    /// Inactive pages are hidden from the public API
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Configured group ids in order, skipping anything that is not a
    /// non-empty string.
    pub fn group_ids(&self) -> Vec<String> {
        self.mailerlite_group_ids
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subscription_session::Entity")]
    SubscriptionSession,
}

impl Related<super::subscription_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
