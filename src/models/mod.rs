//! # Data Models
//!
//! This module contains all the data models used throughout the Applied AI API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod automation;
pub mod canonical_news_story;
pub mod captured_news_story;
pub mod category;
pub mod contact_submission;
pub mod landing_page;
pub mod member;
pub mod membership_tier;
pub mod n8n_template;
pub mod news_article;
pub mod subscription_session;
pub mod subscription_transition;
pub mod tool;
pub mod tool_category;
pub mod waiting_list_submission;

pub use automation::Entity as Automation;
pub use canonical_news_story::Entity as CanonicalNewsStory;
pub use captured_news_story::Entity as CapturedNewsStory;
pub use category::Entity as Category;
pub use contact_submission::Entity as ContactSubmission;
pub use landing_page::Entity as LandingPage;
pub use member::Entity as Member;
pub use membership_tier::Entity as MembershipTier;
pub use n8n_template::Entity as N8nTemplate;
pub use news_article::Entity as NewsArticle;
pub use subscription_session::Entity as SubscriptionSession;
pub use subscription_transition::Entity as SubscriptionTransition;
pub use tool::Entity as Tool;
pub use tool_category::Entity as ToolCategory;
pub use waiting_list_submission::Entity as WaitingListSubmission;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "applied-ai-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
