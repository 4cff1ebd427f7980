//! Captured news story entity model
//!
//! One source's take on a news event. The link to the canonical story is
//! nullable and is cleared, never cascaded, when the canonical story goes.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "captured_news_stories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Canonical story this capture belongs to
    pub canonical_story_id: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    /// Source name (e.g. "techcrunch")
    pub source: String,

    pub author: Option<String>,

    pub published_date: Option<DateTimeWithTimeZone>,

    pub captured_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::canonical_news_story::Entity",
        from = "Column::CanonicalStoryId",
        to = "super::canonical_news_story::Column::Id",
        on_delete = "SetNull"
    )]
    CanonicalNewsStory,
}

impl Related<super::canonical_news_story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CanonicalNewsStory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
