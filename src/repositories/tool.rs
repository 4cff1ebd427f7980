//! Tool repository for database operations
//!
//! Public listing, category lookups, external-id resolution for search and
//! manual reordering of the tools table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};

use super::{apply_ordering, search_condition, search_term};
use crate::models::category::{self, Entity as Category};
use crate::models::tool::{self, Entity as Tool};
use crate::models::tool_category::{self, Entity as ToolCategory};
use crate::pagination::PageRequest;

/// Public `ordering` field names for the tools listing.
pub const ORDERING_FIELDS: &[(&str, tool::Column)] = &[
    ("table_order", tool::Column::TableOrder),
    ("rating", tool::Column::Rating),
    ("name", tool::Column::Name),
    ("created_at", tool::Column::CreatedAt),
    ("updated_at", tool::Column::UpdatedAt),
];

/// Filters accepted by the tools listing
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// Category id
    pub category: Option<i32>,
    pub pricing: Option<String>,
    pub is_featured: Option<bool>,
    /// Case-insensitive match on name and description
    pub search: Option<String>,
}

/// Repository for tool database operations
#[derive(Debug, Clone)]
pub struct ToolRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ToolRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn visible() -> Select<Tool> {
        Tool::find().filter(tool::Column::ShowOnSite.eq(true))
    }

    fn default_order(select: Select<Tool>) -> Select<Tool> {
        select
            .order_by_asc(tool::Column::TableOrder)
            .order_by_desc(tool::Column::CreatedAt)
            .order_by_asc(tool::Column::Name)
            .order_by_asc(tool::Column::Id)
    }

    /// Lists visible tools with filters, ordering and pagination.
    ///
    /// Returns the page of tools together with the total match count.
    pub async fn list(
        &self,
        filter: &ToolFilter,
        ordering: Vec<(tool::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<tool::Model>, u64), DbErr> {
        let mut select = Self::visible();

        if let Some(category_id) = filter.category {
            select = select
                .inner_join(ToolCategory)
                .filter(tool_category::Column::CategoryId.eq(category_id));
        }
        if let Some(pricing) = &filter.pricing {
            select = select.filter(tool::Column::Pricing.eq(pricing.clone()));
        }
        if let Some(is_featured) = filter.is_featured {
            select = select.filter(tool::Column::IsFeatured.eq(is_featured));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            select = select.filter(search_condition(
                &[tool::Column::Name, tool::Column::Description],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            Self::default_order(select)
        } else {
            apply_ordering(select, ordering).order_by_asc(tool::Column::Id)
        };

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let tools = paginator.fetch_page(page.index()).await?;
        Ok((tools, total))
    }

    /// Finds a visible tool by id
    pub async fn find_visible(&self, id: i32) -> Result<Option<tool::Model>, DbErr> {
        Self::visible()
            .filter(tool::Column::Id.eq(id))
            .one(&*self.db)
            .await
    }

    /// Every visible tool in default order
    pub async fn all_visible(&self) -> Result<Vec<tool::Model>, DbErr> {
        Self::default_order(Self::visible()).all(&*self.db).await
    }

    /// Visible tools whose `external_id` is one of `external_ids`
    pub async fn find_visible_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<tool::Model>, DbErr> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        Self::visible()
            .filter(tool::Column::ExternalId.is_in(external_ids.iter().cloned()))
            .all(&*self.db)
            .await
    }

    /// All categories ordered by name
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, DbErr> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
    }

    /// Categories of each tool in `tool_ids`, keyed by tool id and sorted by name.
    pub async fn categories_for(
        &self,
        tool_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<category::Model>>, DbErr> {
        if tool_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = ToolCategory::find()
            .filter(tool_category::Column::ToolId.is_in(tool_ids.iter().copied()))
            .all(&*self.db)
            .await?;

        let mut category_ids: Vec<i32> = links.iter().map(|link| link.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();

        let categories: HashMap<i32, category::Model> = Category::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|category| (category.id, category))
            .collect();

        let mut by_tool: HashMap<i32, Vec<category::Model>> = HashMap::new();
        for link in links {
            if let Some(category) = categories.get(&link.category_id) {
                by_tool.entry(link.tool_id).or_default().push(category.clone());
            }
        }
        for list in by_tool.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(by_tool)
    }

    /// Moves a tool to `position` in the manual ordering and renumbers every
    /// tool so `table_order` runs `0..count` without gaps or duplicates.
    ///
    /// Returns `None` when the tool does not exist.
    pub async fn reorder(&self, id: i32, position: usize) -> Result<Option<tool::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let current = Tool::find()
            .order_by_asc(tool::Column::TableOrder)
            .order_by_desc(tool::Column::CreatedAt)
            .order_by_asc(tool::Column::Name)
            .order_by_asc(tool::Column::Id)
            .all(&txn)
            .await?;

        let ids: Vec<i32> = current.iter().map(|tool| tool.id).collect();
        let Some(new_order) = reorder_positions(&ids, id, position) else {
            txn.rollback().await?;
            return Ok(None);
        };

        let by_id: HashMap<i32, tool::Model> =
            current.into_iter().map(|tool| (tool.id, tool)).collect();
        let now = Utc::now().fixed_offset();
        let mut moved = None;

        for (index, tool_id) in new_order.iter().enumerate() {
            let Some(existing) = by_id.get(tool_id) else {
                continue;
            };
            let table_order = i32::try_from(index).unwrap_or(i32::MAX);

            let model = if existing.table_order != table_order || existing.id == id {
                let mut active: tool::ActiveModel = existing.clone().into();
                active.table_order = Set(table_order);
                active.updated_at = Set(now);
                active.update(&txn).await?
            } else {
                existing.clone()
            };

            if model.id == id {
                moved = Some(model);
            }
        }

        txn.commit().await?;
        tracing::info!(tool_id = id, position, "Tool reordered");
        Ok(moved)
    }
}

/// Computes the tool id order after moving `moved_id` to `position`.
///
/// The index of each id in the result is its new `table_order`. Positions
/// past the end clamp to the last slot. Returns `None` if `moved_id` is not
/// in `ordered_ids`.
pub fn reorder_positions(ordered_ids: &[i32], moved_id: i32, position: usize) -> Option<Vec<i32>> {
    let current = ordered_ids.iter().position(|id| *id == moved_id)?;
    let mut ids = ordered_ids.to_vec();
    let id = ids.remove(current);
    let target = position.min(ids.len());
    ids.insert(target, id);
    Some(ids)
}
