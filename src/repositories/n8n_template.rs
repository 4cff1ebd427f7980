//! n8n template repository for database operations
//!
//! Only templates flagged `available_on_website` are ever returned.

use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};

use super::{apply_ordering, search_condition, search_term};
use crate::models::n8n_template::{self, Entity as N8nTemplate};
use crate::pagination::PageRequest;

pub const ORDERING_FIELDS: &[(&str, n8n_template::Column)] = &[
    ("name", n8n_template::Column::Name),
    ("score", n8n_template::Column::Score),
    ("created_at", n8n_template::Column::CreatedAt),
];

#[derive(Debug, Clone)]
pub struct TemplateRepository {
    pub db: Arc<DatabaseConnection>,
}

impl TemplateRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn available() -> Select<N8nTemplate> {
        N8nTemplate::find().filter(n8n_template::Column::AvailableOnWebsite.eq(true))
    }

    fn default_order(select: Select<N8nTemplate>) -> Select<N8nTemplate> {
        select
            .order_by_desc(n8n_template::Column::Score)
            .order_by_asc(n8n_template::Column::Name)
            .order_by_asc(n8n_template::Column::Id)
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        ordering: Vec<(n8n_template::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<n8n_template::Model>, u64), DbErr> {
        let mut select = Self::available();

        if let Some(term) = search_term(search) {
            select = select.filter(search_condition(
                &[n8n_template::Column::Name, n8n_template::Column::Description],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            Self::default_order(select)
        } else {
            apply_ordering(select, ordering).order_by_asc(n8n_template::Column::Id)
        };

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let templates = paginator.fetch_page(page.index()).await?;
        Ok((templates, total))
    }

    pub async fn find_available(&self, id: i32) -> Result<Option<n8n_template::Model>, DbErr> {
        Self::available()
            .filter(n8n_template::Column::Id.eq(id))
            .one(&*self.db)
            .await
    }

    /// Every available template in default order
    pub async fn all_available(&self) -> Result<Vec<n8n_template::Model>, DbErr> {
        Self::default_order(Self::available()).all(&*self.db).await
    }

    pub async fn find_available_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<n8n_template::Model>, DbErr> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        Self::available()
            .filter(n8n_template::Column::ExternalId.is_in(external_ids.iter().cloned()))
            .all(&*self.db)
            .await
    }
}
