//! Category entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

/// Tool category (unique by name)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
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
