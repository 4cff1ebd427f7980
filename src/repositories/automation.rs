//! Automation repository for database operations

use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};

use super::{apply_ordering, search_condition, search_term};
use crate::models::automation::{self, Entity as Automation};
use crate::pagination::PageRequest;

pub const ORDERING_FIELDS: &[(&str, automation::Column)] = &[
    ("name", automation::Column::Name),
    ("created_at", automation::Column::CreatedAt),
];

/// Filters accepted by the automations listing
#[derive(Debug, Clone, Default)]
pub struct AutomationFilter {
    pub category: Option<String>,
    pub complexity: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AutomationRepository {
    pub db: Arc<DatabaseConnection>,
}

impl AutomationRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn default_order(select: Select<Automation>) -> Select<Automation> {
        select
            .order_by_desc(automation::Column::IsFeatured)
            .order_by_asc(automation::Column::Name)
            .order_by_asc(automation::Column::Id)
    }

    pub async fn list(
        &self,
        filter: &AutomationFilter,
        ordering: Vec<(automation::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<automation::Model>, u64), DbErr> {
        let mut select = Automation::find();

        if let Some(category) = &filter.category {
            select = select.filter(automation::Column::Category.eq(category.clone()));
        }
        if let Some(complexity) = &filter.complexity {
            select = select.filter(automation::Column::Complexity.eq(complexity.clone()));
        }
        if let Some(status) = &filter.status {
            select = select.filter(automation::Column::Status.eq(status.clone()));
        }
        if let Some(is_featured) = filter.is_featured {
            select = select.filter(automation::Column::IsFeatured.eq(is_featured));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            select = select.filter(search_condition(
                &[automation::Column::Name, automation::Column::Description],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            Self::default_order(select)
        } else {
            apply_ordering(select, ordering).order_by_asc(automation::Column::Id)
        };

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let automations = paginator.fetch_page(page.index()).await?;
        Ok((automations, total))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<automation::Model>, DbErr> {
        Automation::find_by_id(id).one(&*self.db).await
    }
}
