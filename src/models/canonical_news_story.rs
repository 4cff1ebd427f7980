//! Canonical news story entity model
//!
//! A canonical story is the deduplicated news event. Captured stories from
//! individual sources link to it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Status value for stories that are published to the public feed.
pub const STATUS_RANKED: &str = "ranked";

/// Minimum rank for a ranked story to appear in the public feed.
pub const FEED_MIN_RANK: i32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "canonical_news_stories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub summary: String,

    /// When the underlying event happened, if known
    pub event_time: Option<DateTimeWithTimeZone>,

    /// Editorial rank assigned by the ranking pipeline
    pub rank: Option<i32>,

    /// Pipeline status (e.g. `ranked`)
    pub status: Option<String>,

    /// Set once the story has been pushed to the Notion reading list
    pub is_noteworthy: bool,

    /// Notion page created for this story
    pub notion_page_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::captured_news_story::Entity")]
    CapturedNewsStory,
}

impl Related<super::captured_news_story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CapturedNewsStory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
