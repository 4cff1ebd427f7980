//! Subscription transition entity model
//!
//! Append-only history of accepted signup steps.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscription_transitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub session_id: i32,

    /// State before the step, `None` for the first recorded step
    pub from_state: Option<String>,

    pub to_state: String,

    /// Step name that caused the transition (`email` or `business_type`)
    pub step: String,

    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subscription_session::Entity",
        from = "Column::SessionId",
        to = "super::subscription_session::Column::Id",
        on_delete = "Cascade"
    )]
    SubscriptionSession,
}

impl Related<super::subscription_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
