//! News repository for database operations
//!
//! Canonical stories, the captured stories linked to them, the public feed
//! and editorial news articles.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::{apply_ordering, search_condition, search_term};
use crate::models::canonical_news_story::{self, Entity as CanonicalNewsStory};
use crate::models::captured_news_story::{self, Entity as CapturedNewsStory};
use crate::models::news_article::{self, Entity as NewsArticle};
use crate::pagination::PageRequest;

pub const CANONICAL_ORDERING_FIELDS: &[(&str, canonical_news_story::Column)] = &[
    ("created_at", canonical_news_story::Column::CreatedAt),
    ("event_time", canonical_news_story::Column::EventTime),
    ("rank", canonical_news_story::Column::Rank),
];

pub const CAPTURED_ORDERING_FIELDS: &[(&str, captured_news_story::Column)] = &[
    ("captured_at", captured_news_story::Column::CapturedAt),
    ("published_date", captured_news_story::Column::PublishedDate),
];

pub const ARTICLE_ORDERING_FIELDS: &[(&str, news_article::Column)] = &[
    ("published_at", news_article::Column::PublishedAt),
    ("title", news_article::Column::Title),
    ("created_at", news_article::Column::CreatedAt),
];

/// Writable fields of a canonical story
#[derive(Debug, Clone)]
pub struct CanonicalStoryInput {
    pub title: String,
    pub summary: String,
    pub event_time: Option<DateTimeWithTimeZone>,
    pub rank: Option<i32>,
    pub status: Option<String>,
}

/// Writable fields of a captured story
#[derive(Debug, Clone)]
pub struct CapturedStoryInput {
    pub canonical_story_id: Option<i32>,
    pub title: String,
    pub text: String,
    pub url: String,
    pub source: String,
    pub author: Option<String>,
    pub published_date: Option<DateTimeWithTimeZone>,
}

/// Filters accepted by the captured stories listing
#[derive(Debug, Clone, Default)]
pub struct CapturedFilter {
    pub source: Option<String>,
    pub canonical_story: Option<i32>,
    pub search: Option<String>,
}

/// Filters accepted by the news articles listing
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub is_featured: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsRepository {
    pub db: Arc<DatabaseConnection>,
}

impl NewsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // Canonical stories

    pub async fn list_canonical(
        &self,
        status: Option<&str>,
        search: Option<&str>,
        ordering: Vec<(canonical_news_story::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<canonical_news_story::Model>, u64), DbErr> {
        let mut select = CanonicalNewsStory::find();

        if let Some(status) = status {
            select = select.filter(canonical_news_story::Column::Status.eq(status));
        }
        if let Some(term) = search_term(search) {
            select = select.filter(search_condition(
                &[
                    canonical_news_story::Column::Title,
                    canonical_news_story::Column::Summary,
                ],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            select.order_by_desc(canonical_news_story::Column::CreatedAt)
        } else {
            apply_ordering(select, ordering)
        }
        .order_by_desc(canonical_news_story::Column::Id);

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let stories = paginator.fetch_page(page.index()).await?;
        Ok((stories, total))
    }

    /// Ranked stories for the public feed, newest event first.
    pub async fn feed(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<canonical_news_story::Model>, u64), DbErr> {
        let select = CanonicalNewsStory::find()
            .filter(canonical_news_story::Column::Status.eq(canonical_news_story::STATUS_RANKED))
            .filter(canonical_news_story::Column::Rank.gte(canonical_news_story::FEED_MIN_RANK))
            .order_by_with_nulls(
                canonical_news_story::Column::EventTime,
                Order::Desc,
                NullOrdering::Last,
            )
            .order_by_desc(canonical_news_story::Column::CreatedAt)
            .order_by_desc(canonical_news_story::Column::Id);

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let stories = paginator.fetch_page(page.index()).await?;
        Ok((stories, total))
    }

    pub async fn find_canonical(
        &self,
        id: i32,
    ) -> Result<Option<canonical_news_story::Model>, DbErr> {
        CanonicalNewsStory::find_by_id(id).one(&*self.db).await
    }

    pub async fn create_canonical(
        &self,
        input: CanonicalStoryInput,
    ) -> Result<canonical_news_story::Model, DbErr> {
        let now = Utc::now().fixed_offset();
        let story = canonical_news_story::ActiveModel {
            title: Set(input.title),
            summary: Set(input.summary),
            event_time: Set(input.event_time),
            rank: Set(input.rank),
            status: Set(input.status),
            is_noteworthy: Set(false),
            notion_page_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        story.insert(&*self.db).await
    }

    pub async fn update_canonical(
        &self,
        id: i32,
        input: CanonicalStoryInput,
    ) -> Result<Option<canonical_news_story::Model>, DbErr> {
        let Some(existing) = self.find_canonical(id).await? else {
            return Ok(None);
        };

        let mut story: canonical_news_story::ActiveModel = existing.into();
        story.title = Set(input.title);
        story.summary = Set(input.summary);
        story.event_time = Set(input.event_time);
        story.rank = Set(input.rank);
        story.status = Set(input.status);
        story.updated_at = Set(Utc::now().fixed_offset());
        story.update(&*self.db).await.map(Some)
    }

    /// Deletes a canonical story. Captured stories that pointed at it are kept
    /// with their link cleared.
    pub async fn delete_canonical(&self, id: i32) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        let unlinked = CapturedNewsStory::update_many()
            .col_expr(
                captured_news_story::Column::CanonicalStoryId,
                Expr::value(Option::<i32>::None),
            )
            .filter(captured_news_story::Column::CanonicalStoryId.eq(id))
            .exec(&txn)
            .await?;

        let deleted = CanonicalNewsStory::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        if deleted.rows_affected > 0 {
            tracing::info!(
                story_id = id,
                unlinked = unlinked.rows_affected,
                "Canonical story deleted"
            );
        }
        Ok(deleted.rows_affected > 0)
    }

    /// Records that a story was sent to the reading list.
    pub async fn mark_noteworthy(
        &self,
        story: canonical_news_story::Model,
        notion_page_id: String,
    ) -> Result<canonical_news_story::Model, DbErr> {
        let mut active: canonical_news_story::ActiveModel = story.into();
        active.is_noteworthy = Set(true);
        active.notion_page_id = Set(Some(notion_page_id));
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&*self.db).await
    }

    /// Number of captured stories linked to each canonical story in `ids`.
    /// Stories with no captures are absent from the map.
    pub async fn captured_counts(&self, ids: &[i32]) -> Result<HashMap<i32, u64>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Option<i32>, i64)> = CapturedNewsStory::find()
            .select_only()
            .column(captured_news_story::Column::CanonicalStoryId)
            .column_as(
                Expr::col(captured_news_story::Column::Id).count(),
                "captured_count",
            )
            .filter(captured_news_story::Column::CanonicalStoryId.is_in(ids.iter().copied()))
            .group_by(captured_news_story::Column::CanonicalStoryId)
            .into_tuple()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, count)| id.map(|id| (id, u64::try_from(count).unwrap_or(0))))
            .collect())
    }

    /// Captured stories linked to `canonical_id`, most recently captured first.
    pub async fn captured_for(
        &self,
        canonical_id: i32,
    ) -> Result<Vec<captured_news_story::Model>, DbErr> {
        CapturedNewsStory::find()
            .filter(captured_news_story::Column::CanonicalStoryId.eq(canonical_id))
            .order_by_desc(captured_news_story::Column::CapturedAt)
            .order_by_desc(captured_news_story::Column::Id)
            .all(&*self.db)
            .await
    }

    /// Most recently captured story for each canonical story in `ids`.
    pub async fn latest_captured_for(
        &self,
        ids: &[i32],
    ) -> Result<HashMap<i32, captured_news_story::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let captured = CapturedNewsStory::find()
            .filter(captured_news_story::Column::CanonicalStoryId.is_in(ids.iter().copied()))
            .order_by_desc(captured_news_story::Column::CapturedAt)
            .order_by_desc(captured_news_story::Column::Id)
            .all(&*self.db)
            .await?;

        let mut latest = HashMap::new();
        for story in captured {
            if let Some(canonical_id) = story.canonical_story_id {
                latest.entry(canonical_id).or_insert(story);
            }
        }
        Ok(latest)
    }

    /// Titles of the canonical stories in `ids`
    pub async fn canonical_titles(&self, ids: &[i32]) -> Result<HashMap<i32, String>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, String)> = CanonicalNewsStory::find()
            .select_only()
            .column(canonical_news_story::Column::Id)
            .column(canonical_news_story::Column::Title)
            .filter(canonical_news_story::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().collect())
    }

    // Captured stories

    pub async fn list_captured(
        &self,
        filter: &CapturedFilter,
        ordering: Vec<(captured_news_story::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<captured_news_story::Model>, u64), DbErr> {
        let mut select = CapturedNewsStory::find();

        if let Some(source) = &filter.source {
            select = select.filter(captured_news_story::Column::Source.eq(source.clone()));
        }
        if let Some(canonical_id) = filter.canonical_story {
            select = select.filter(captured_news_story::Column::CanonicalStoryId.eq(canonical_id));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            select = select.filter(search_condition(
                &[
                    captured_news_story::Column::Title,
                    captured_news_story::Column::Text,
                    captured_news_story::Column::Author,
                ],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            select.order_by_desc(captured_news_story::Column::CapturedAt)
        } else {
            apply_ordering(select, ordering)
        }
        .order_by_desc(captured_news_story::Column::Id);

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let stories = paginator.fetch_page(page.index()).await?;
        Ok((stories, total))
    }

    pub async fn find_captured(
        &self,
        id: i32,
    ) -> Result<Option<captured_news_story::Model>, DbErr> {
        CapturedNewsStory::find_by_id(id).one(&*self.db).await
    }

    pub async fn create_captured(
        &self,
        input: CapturedStoryInput,
    ) -> Result<captured_news_story::Model, DbErr> {
        let story = captured_news_story::ActiveModel {
            canonical_story_id: Set(input.canonical_story_id),
            title: Set(input.title),
            text: Set(input.text),
            url: Set(input.url),
            source: Set(input.source),
            author: Set(input.author),
            published_date: Set(input.published_date),
            captured_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        story.insert(&*self.db).await
    }

    pub async fn update_captured(
        &self,
        id: i32,
        input: CapturedStoryInput,
    ) -> Result<Option<captured_news_story::Model>, DbErr> {
        let Some(existing) = self.find_captured(id).await? else {
            return Ok(None);
        };

        let mut story: captured_news_story::ActiveModel = existing.into();
        story.canonical_story_id = Set(input.canonical_story_id);
        story.title = Set(input.title);
        story.text = Set(input.text);
        story.url = Set(input.url);
        story.source = Set(input.source);
        story.author = Set(input.author);
        story.published_date = Set(input.published_date);
        story.update(&*self.db).await.map(Some)
    }

    pub async fn delete_captured(&self, id: i32) -> Result<bool, DbErr> {
        let result = CapturedNewsStory::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    // News articles

    pub async fn list_articles(
        &self,
        filter: &ArticleFilter,
        ordering: Vec<(news_article::Column, Order)>,
        page: PageRequest,
    ) -> Result<(Vec<news_article::Model>, u64), DbErr> {
        let mut select = NewsArticle::find();

        if let Some(category) = &filter.category {
            select = select.filter(news_article::Column::Category.eq(category.clone()));
        }
        if let Some(is_featured) = filter.is_featured {
            select = select.filter(news_article::Column::IsFeatured.eq(is_featured));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            select = select.filter(search_condition(
                &[news_article::Column::Title, news_article::Column::Summary],
                term,
            ));
        }

        let select = if ordering.is_empty() {
            select.order_by_desc(news_article::Column::PublishedAt)
        } else {
            apply_ordering(select, ordering)
        }
        .order_by_desc(news_article::Column::Id);

        let paginator = select.paginate(&*self.db, page.page_size);
        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.index()).await?;
        Ok((articles, total))
    }

    pub async fn find_article(&self, id: i32) -> Result<Option<news_article::Model>, DbErr> {
        NewsArticle::find_by_id(id).one(&*self.db).await
    }
}
