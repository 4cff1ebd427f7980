//! Mastermind repository: membership tiers and members

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::{apply_ordering, search_condition, search_term};
use crate::models::member::{self, Entity as Member};
use crate::models::membership_tier::{self, Entity as MembershipTier};
use crate::pagination::PageRequest;

pub const MEMBER_ORDERING_FIELDS: &[(&str, member::Column)] = &[
    ("joined_at", member::Column::JoinedAt),
    ("last_name", member::Column::LastName),
    ("email", member::Column::Email),
];

/// Writable fields of a member
#[derive(Debug, Clone)]
pub struct MemberInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub membership_tier_id: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct MastermindRepository {
    pub db: Arc<DatabaseConnection>,
}

impl MastermindRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active tiers, cheapest first
    pub async fn list_active_tiers(&self) -> Result<Vec<membership_tier::Model>, DbErr> {
        MembershipTier::find()
            .filter(membership_tier::Column::IsActive.eq(true))
            .order_by_asc(membership_tier::Column::PriceCents)
            .order_by_asc(membership_tier::Column::Name)
            .all(&*self.db)
            .await
    }

    pub async fn find_active_tier(
        &self,
        id: i32,
    ) -> Result<Option<membership_tier::Model>, DbErr> {
        MembershipTier::find_by_id(id)
            .filter(membership_tier::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
    }

    pub async fn tier_exists(&self, id: i32) -> Result<bool, DbErr> {
        Ok(MembershipTier::find_by_id(id).one(&*self.db).await?.is_some())
    }

    pub async fn list_members(
        &self,
        search: Option<&str>,
        ordering: Vec<(member::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<member::Model>, u64), DbErr> {
        let mut select = Member::find();

        if let Some(term) = search_term(search) {
            select = select.filter(search_condition(
                &[
                    member::Column::FirstName,
                    member::Column::LastName,
                    member::Column::Email,
                ],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            select.order_by_desc(member::Column::JoinedAt)
        } else {
            apply_ordering(select, ordering)
        }
        .order_by_desc(member::Column::Id);

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let members = paginator.fetch_page(page.index()).await?;
        Ok((members, total))
    }

    pub async fn find_member(&self, id: i32) -> Result<Option<member::Model>, DbErr> {
        Member::find_by_id(id).one(&*self.db).await
    }

    pub async fn create_member(&self, input: MemberInput) -> Result<member::Model, DbErr> {
        member::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            membership_tier_id: Set(input.membership_tier_id),
            is_active: Set(input.is_active),
            joined_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
    }

    pub async fn update_member(
        &self,
        id: i32,
        input: MemberInput,
    ) -> Result<Option<member::Model>, DbErr> {
        let Some(existing) = self.find_member(id).await? else {
            return Ok(None);
        };

        let mut active: member::ActiveModel = existing.into();
        active.first_name = Set(input.first_name);
        active.last_name = Set(input.last_name);
        active.email = Set(input.email);
        active.membership_tier_id = Set(input.membership_tier_id);
        active.is_active = Set(input.is_active);
        active.update(&*self.db).await.map(Some)
    }

    pub async fn delete_member(&self, id: i32) -> Result<bool, DbErr> {
        let result = Member::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
