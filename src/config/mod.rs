//! Configuration loading for the Applied AI API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `APPLIED_AI_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "APPLIED_AI_";
const REDACTED: &str = "[REDACTED]";

/// Application configuration derived from `APPLIED_AI_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Bearer tokens accepted on admin-only endpoints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admin_tokens: Vec<String>,
    /// Origins allowed by CORS; empty means any origin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors_allowed_origins: Vec<String>,
    /// Upper bound for proxied upload bodies
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub mailerlite: MailerLiteConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// MailerLite subscriber API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MailerLiteConfig {
    /// API key (`APPLIED_AI_MAILERLITE_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_mailerlite_api_base")]
    pub api_base: String,
    #[serde(default = "default_mailerlite_timeout_seconds")]
    pub timeout_seconds: u64,
    /// How long a fetched group listing stays fresh
    #[serde(default = "default_groups_cache_ttl_seconds")]
    pub groups_cache_ttl_seconds: u64,
    /// Group joined by waiting-list submissions, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_list_group_id: Option<String>,
}

/// Notion reading-list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NotionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
    /// Value sent in the `Notion-Version` header
    #[serde(default = "default_notion_api_version")]
    pub api_version: String,
    #[serde(default = "default_http_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Embedding and vector-index settings for semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinecone_api_key: Option<String>,
    /// Base URL of the tools index (e.g. `https://ai-tools-xxxx.svc.pinecone.io`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_index_host: Option<String>,
    /// Base URL of the templates index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_index_host: Option<String>,
    #[serde(default = "default_search_top_k")]
    pub top_k: u32,
    #[serde(default = "default_http_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Outbound email (Postmark) used for contact form notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postmark_server_token: Option<String>,
    #[serde(default = "default_postmark_api_base")]
    pub postmark_api_base: String,
    #[serde(default = "default_postmark_message_stream")]
    pub message_stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    /// Who receives contact form notifications
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact_recipients: Vec<String>,
    #[serde(default = "default_http_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default = "default_storage_region")]
    pub region: String,
    /// Service endpoint; defaults to `https://<region>.digitaloceanspaces.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Put the bucket in the path instead of the host name
    #[serde(default)]
    pub force_path_style: bool,
    /// Public CDN base used to build `publicUrl` for public objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_base_url: Option<String>,
    #[serde(default = "default_presign_expires_seconds")]
    pub presign_expires_seconds: u64,
    /// Bearer token required by the proxied upload endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_token: Option<String>,
    #[serde(default = "default_http_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            admin_tokens: Vec::new(),
            cors_allowed_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
            mailerlite: MailerLiteConfig::default(),
            notion: NotionConfig::default(),
            search: SearchConfig::default(),
            storage: StorageConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            postmark_server_token: None,
            postmark_api_base: default_postmark_api_base(),
            message_stream: default_postmark_message_stream(),
            from_address: None,
            contact_recipients: Vec::new(),
            timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

impl Default for MailerLiteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_mailerlite_api_base(),
            timeout_seconds: default_mailerlite_timeout_seconds(),
            groups_cache_ttl_seconds: default_groups_cache_ttl_seconds(),
            waiting_list_group_id: None,
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            api_base: default_notion_api_base(),
            api_version: default_notion_api_version(),
            timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_base: default_openai_api_base(),
            embedding_model: default_embedding_model(),
            pinecone_api_key: None,
            tools_index_host: None,
            templates_index_host: None,
            top_k: default_search_top_k(),
            timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            bucket: None,
            region: default_storage_region(),
            endpoint: None,
            force_path_style: false,
            cdn_base_url: None,
            presign_expires_seconds: default_presign_expires_seconds(),
            upload_token: None,
            timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

impl MailerLiteConfig {
    /// Validate MailerLite configuration bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 || self.timeout_seconds > 120 {
            return Err(ConfigError::InvalidTimeout {
                field: "MAILERLITE_TIMEOUT_SECONDS",
                value: self.timeout_seconds,
            });
        }
        if self.groups_cache_ttl_seconds == 0 || self.groups_cache_ttl_seconds > 86_400 {
            return Err(ConfigError::InvalidGroupsCacheTtl {
                value: self.groups_cache_ttl_seconds,
            });
        }
        Ok(())
    }
}

impl NotionConfig {
    /// Validate Notion configuration bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 || self.timeout_seconds > 120 {
            return Err(ConfigError::InvalidTimeout {
                field: "NOTION_TIMEOUT_SECONDS",
                value: self.timeout_seconds,
            });
        }
        Ok(())
    }
}

impl EmailConfig {
    /// A server token without a sender or recipients cannot deliver anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 || self.timeout_seconds > 120 {
            return Err(ConfigError::InvalidTimeout {
                field: "EMAIL_TIMEOUT_SECONDS",
                value: self.timeout_seconds,
            });
        }
        if self.postmark_server_token.is_some()
            && (self.from_address.is_none() || self.contact_recipients.is_empty())
        {
            return Err(ConfigError::IncompleteEmailConfig);
        }
        Ok(())
    }
}

impl SearchConfig {
    /// Validate search configuration bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 || self.top_k > 100 {
            return Err(ConfigError::InvalidSearchTopK { value: self.top_k });
        }
        if self.timeout_seconds == 0 || self.timeout_seconds > 120 {
            return Err(ConfigError::InvalidTimeout {
                field: "SEARCH_TIMEOUT_SECONDS",
                value: self.timeout_seconds,
            });
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Validate storage configuration bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        // SigV4 presigned URLs are valid for at most seven days
        if self.presign_expires_seconds == 0 || self.presign_expires_seconds > 604_800 {
            return Err(ConfigError::InvalidPresignExpiry {
                value: self.presign_expires_seconds,
            });
        }
        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(ConfigError::InvalidTimeout {
                field: "STORAGE_TIMEOUT_SECONDS",
                value: self.timeout_seconds,
            });
        }
        Ok(())
    }

    /// Endpoint URL of the object store, without trailing slash.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.digitaloceanspaces.com", self.region),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if !config.admin_tokens.is_empty() {
            config.admin_tokens = vec![REDACTED.to_string()];
        }
        redact(&mut config.mailerlite.api_key);
        redact(&mut config.notion.api_key);
        redact(&mut config.search.openai_api_key);
        redact(&mut config.search.pinecone_api_key);
        redact(&mut config.storage.access_key_id);
        redact(&mut config.storage.secret_access_key);
        redact(&mut config.storage.upload_token);
        redact(&mut config.email.postmark_server_token);
        serde_json::to_string_pretty(&config)
    }

    /// Whether the profile is a developer profile (`local` or `test`).
    pub fn is_dev_profile(&self) -> bool {
        matches!(self.profile.as_str(), "local" | "test")
    }

    /// Validates the configuration, returning an error if required settings are missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_dev_profile() && self.admin_tokens.is_empty() {
            return Err(ConfigError::MissingAdminTokens);
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidMaxUploadBytes {
                value: self.max_upload_bytes,
            });
        }

        self.mailerlite.validate()?;
        self.notion.validate()?;
        self.search.validate()?;
        self.storage.validate()?;
        self.email.validate()?;

        Ok(())
    }
}

fn redact(value: &mut Option<String>) {
    if value.is_some() {
        *value = Some(REDACTED.to_string());
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "postgresql://postgres@localhost:5432/applied_ai_db".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_mailerlite_api_base() -> String {
    "https://connect.mailerlite.com/api".to_string()
}

fn default_mailerlite_timeout_seconds() -> u64 {
    10
}

fn default_groups_cache_ttl_seconds() -> u64 {
    600 // 10 minutes
}

fn default_notion_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_api_version() -> String {
    "2022-06-28".to_string()
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_search_top_k() -> u32 {
    10
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_postmark_api_base() -> String {
    "https://api.postmarkapp.com".to_string()
}

fn default_postmark_message_stream() -> String {
    "outbound".to_string()
}

fn default_storage_region() -> String {
    "nyc3".to_string()
}

fn default_presign_expires_seconds() -> u64 {
    300 // 5 minutes
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("no admin tokens configured; set APPLIED_AI_ADMIN_TOKEN or APPLIED_AI_ADMIN_TOKENS")]
    MissingAdminTokens,
    #[error("{field} must be between 1 and the allowed maximum, got {value}")]
    InvalidTimeout { field: &'static str, value: u64 },
    #[error("MailerLite groups cache TTL must be between 1 and 86400 seconds, got {value}")]
    InvalidGroupsCacheTtl { value: u64 },
    #[error("search top_k must be between 1 and 100, got {value}")]
    InvalidSearchTopK { value: u32 },
    #[error("presigned URL expiry must be between 1 and 604800 seconds, got {value}")]
    InvalidPresignExpiry { value: u64 },
    #[error("max upload size must be positive, got {value}")]
    InvalidMaxUploadBytes { value: usize },
    #[error("POSTMARK_SERVER_TOKEN requires CONTACT_FROM_ADDRESS and CONTACT_RECIPIENTS")]
    IncompleteEmailConfig,
}

/// Loads configuration using layered `.env` files and `APPLIED_AI_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = take_string(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let api_bind_addr =
            take_string(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take_string(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format =
            take_string(&mut layered, "LOG_FORMAT").unwrap_or_else(default_log_format);
        let database_url =
            take_string(&mut layered, "DATABASE_URL").unwrap_or_else(default_database_url);
        let db_max_connections = take_parsed(&mut layered, "DB_MAX_CONNECTIONS")
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = take_parsed(&mut layered, "DB_ACQUIRE_TIMEOUT_MS")
            .unwrap_or_else(default_db_acquire_timeout_ms);

        // Support both a comma-separated list and a single token
        let admin_tokens = if let Some(tokens) = layered.remove("ADMIN_TOKENS") {
            split_list(&tokens)
        } else if let Some(token) = take_string(&mut layered, "ADMIN_TOKEN") {
            vec![token]
        } else {
            Vec::new()
        };

        let cors_allowed_origins = layered
            .remove("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        let max_upload_bytes = take_parsed(&mut layered, "MAX_UPLOAD_BYTES")
            .unwrap_or_else(default_max_upload_bytes);

        let mailerlite = MailerLiteConfig {
            api_key: take_string(&mut layered, "MAILERLITE_API_KEY"),
            api_base: take_string(&mut layered, "MAILERLITE_API_BASE")
                .unwrap_or_else(default_mailerlite_api_base),
            timeout_seconds: take_parsed(&mut layered, "MAILERLITE_TIMEOUT_SECONDS")
                .unwrap_or_else(default_mailerlite_timeout_seconds),
            groups_cache_ttl_seconds: take_parsed(&mut layered, "MAILERLITE_GROUPS_CACHE_TTL_SECONDS")
                .unwrap_or_else(default_groups_cache_ttl_seconds),
            waiting_list_group_id: take_string(&mut layered, "MAILERLITE_WAITING_LIST_GROUP_ID"),
        };

        let notion = NotionConfig {
            api_key: take_string(&mut layered, "NOTION_API_KEY"),
            database_id: take_string(&mut layered, "NOTION_DATABASE_ID"),
            api_base: take_string(&mut layered, "NOTION_API_BASE")
                .unwrap_or_else(default_notion_api_base),
            api_version: take_string(&mut layered, "NOTION_API_VERSION")
                .unwrap_or_else(default_notion_api_version),
            timeout_seconds: take_parsed(&mut layered, "NOTION_TIMEOUT_SECONDS")
                .unwrap_or_else(default_http_timeout_seconds),
        };

        let search = SearchConfig {
            openai_api_key: take_string(&mut layered, "OPENAI_API_KEY"),
            openai_api_base: take_string(&mut layered, "OPENAI_API_BASE")
                .unwrap_or_else(default_openai_api_base),
            embedding_model: take_string(&mut layered, "EMBEDDING_MODEL")
                .unwrap_or_else(default_embedding_model),
            pinecone_api_key: take_string(&mut layered, "PINECONE_API_KEY"),
            tools_index_host: take_string(&mut layered, "PINECONE_TOOLS_INDEX_HOST"),
            templates_index_host: take_string(&mut layered, "PINECONE_TEMPLATES_INDEX_HOST"),
            top_k: take_parsed(&mut layered, "SEARCH_TOP_K").unwrap_or_else(default_search_top_k),
            timeout_seconds: take_parsed(&mut layered, "SEARCH_TIMEOUT_SECONDS")
                .unwrap_or_else(default_http_timeout_seconds),
        };

        let storage = StorageConfig {
            access_key_id: take_string(&mut layered, "SPACES_KEY"),
            secret_access_key: take_string(&mut layered, "SPACES_SECRET"),
            bucket: take_string(&mut layered, "SPACES_BUCKET"),
            region: take_string(&mut layered, "SPACES_REGION")
                .unwrap_or_else(default_storage_region),
            endpoint: take_string(&mut layered, "SPACES_ENDPOINT"),
            force_path_style: take_parsed(&mut layered, "SPACES_FORCE_PATH_STYLE")
                .unwrap_or(false),
            cdn_base_url: take_string(&mut layered, "SPACES_CDN_BASE"),
            presign_expires_seconds: take_parsed(&mut layered, "PRESIGN_EXPIRES_SECONDS")
                .unwrap_or_else(default_presign_expires_seconds),
            upload_token: take_string(&mut layered, "UPLOAD_TOKEN"),
            timeout_seconds: take_parsed(&mut layered, "STORAGE_TIMEOUT_SECONDS")
                .unwrap_or_else(default_http_timeout_seconds),
        };

        let email = EmailConfig {
            postmark_server_token: take_string(&mut layered, "POSTMARK_SERVER_TOKEN"),
            postmark_api_base: take_string(&mut layered, "POSTMARK_API_BASE")
                .unwrap_or_else(default_postmark_api_base),
            message_stream: take_string(&mut layered, "POSTMARK_MESSAGE_STREAM")
                .unwrap_or_else(default_postmark_message_stream),
            from_address: take_string(&mut layered, "CONTACT_FROM_ADDRESS"),
            contact_recipients: layered
                .remove("CONTACT_RECIPIENTS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            timeout_seconds: take_parsed(&mut layered, "EMAIL_TIMEOUT_SECONDS")
                .unwrap_or_else(default_http_timeout_seconds),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            admin_tokens,
            cors_allowed_origins,
            max_upload_bytes,
            mailerlite,
            notion,
            search,
            storage,
            email,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a key, treating blank values as unset.
fn take_string(values: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .remove(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Removes and parses a key; unparsable values fall back to the default.
fn take_parsed<T: std::str::FromStr>(values: &mut BTreeMap<String, String>, key: &str) -> Option<T> {
    values.remove(key).and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
