//! Clients for the third-party HTTP APIs the service talks to.

pub mod groups_cache;
pub mod mailerlite;
pub mod notion;
pub mod openai;
pub mod pinecone;
pub mod postmark;

pub use groups_cache::GroupsCache;
pub use mailerlite::MailerLiteClient;
pub use notion::NotionClient;
pub use postmark::PostmarkClient;
