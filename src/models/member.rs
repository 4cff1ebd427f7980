//! Member entity model (mastermind members)

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub first_name: String,

    pub last_name: String,

    /// Contact email (unique)
    #[sea_orm(unique)]
    pub email: String,

    pub membership_tier_id: Option<i32>,

    pub is_active: bool,

    pub joined_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::membership_tier::Entity",
        from = "Column::MembershipTierId",
        to = "super::membership_tier::Column::Id",
        on_delete = "SetNull"
    )]
    MembershipTier,
}

impl Related<super::membership_tier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipTier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
