//! Subscription session entity model
//!
//! Tracks where a visitor is in a landing page's signup flow. One row per
//! (landing page, email).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscription_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub landing_page_id: i32,

    /// Normalised (trimmed, lower-cased) address
    pub email: String,

    /// Current state, see `crate::subscription::SubscriptionState`
    pub state: String,

    /// Answer given at the business type step
    pub business_type: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::landing_page::Entity",
        from = "Column::LandingPageId",
        to = "super::landing_page::Column::Id",
        on_delete = "Cascade"
    )]
    LandingPage,
    #[sea_orm(has_many = "super::subscription_transition::Entity")]
    SubscriptionTransition,
}

impl Related<super::landing_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LandingPage.def()
    }
}

impl Related<super::subscription_transition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionTransition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
