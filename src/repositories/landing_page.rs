//! Landing page repository for database operations

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::models::landing_page::{self, Entity as LandingPage};
use crate::pagination::PageRequest;

/// Writable fields of a landing page
#[derive(Debug, Clone)]
pub struct LandingPageInput {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub template_content: Option<String>,
    /// Ordered MailerLite group ids; the first one is used when creating
    /// a subscriber
    pub mailerlite_group_ids: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct LandingPageRepository {
    pub db: Arc<DatabaseConnection>,
}

impl LandingPageRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds an active page by slug; inactive pages are invisible publicly.
    pub async fn find_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<landing_page::Model>, DbErr> {
        LandingPage::find()
            .filter(landing_page::Column::Slug.eq(slug))
            .filter(landing_page::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<landing_page::Model>, DbErr> {
        LandingPage::find()
            .filter(landing_page::Column::Slug.eq(slug))
            .one(&*self.db)
            .await
    }

    /// All pages, newest first
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<landing_page::Model>, u64), DbErr> {
        let paginator = LandingPage::find()
            .order_by_desc(landing_page::Column::CreatedAt)
            .order_by_desc(landing_page::Column::Id)
            .paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let pages = paginator.fetch_page(page.index()).await?;
        Ok((pages, total))
    }

    pub async fn create(&self, input: LandingPageInput) -> Result<landing_page::Model, DbErr> {
        let now = Utc::now().fixed_offset();
        let page = landing_page::ActiveModel {
            title: Set(input.title),
            slug: Set(input.slug),
            description: Set(input.description),
            template_content: Set(input.template_content),
            mailerlite_group_ids: Set(serde_json::json!(input.mailerlite_group_ids)),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = page.insert(&*self.db).await?;
        tracing::info!(slug = %created.slug, "Landing page created");
        Ok(created)
    }

    /// Replaces every writable field of the page currently at `slug`.
    pub async fn update(
        &self,
        slug: &str,
        input: LandingPageInput,
    ) -> Result<Option<landing_page::Model>, DbErr> {
        let Some(existing) = self.find_by_slug(slug).await? else {
            return Ok(None);
        };

        let mut page: landing_page::ActiveModel = existing.into();
        page.title = Set(input.title);
        page.slug = Set(input.slug);
        page.description = Set(input.description);
        page.template_content = Set(input.template_content);
        page.mailerlite_group_ids = Set(serde_json::json!(input.mailerlite_group_ids));
        page.is_active = Set(input.is_active);
        page.updated_at = Set(Utc::now().fixed_offset());
        page.update(&*self.db).await.map(Some)
    }
}
