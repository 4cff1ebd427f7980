//! # Object storage
//!
//! S3-compatible storage (DigitalOcean Spaces by default): presigned PUT
//! URLs for direct browser uploads, and proxied uploads signed with SigV4
//! headers.

pub mod filename;
pub mod sigv4;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::config::StorageConfig;
use sigv4::{SignTarget, Signer, SigningError};

pub use filename::sanitize_filename;

/// ACL that makes an object publicly readable
pub const ACL_PUBLIC_READ: &str = "public-read";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage is not configured: missing {0}")]
    NotConfigured(&'static str),
    #[error("invalid storage endpoint: {0}")]
    InvalidEndpoint(String),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error("storage transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Everything a client needs to PUT an object directly.
#[derive(Debug, Clone, PartialEq)]
pub struct PresignedUpload {
    pub url: String,
    /// Headers the client must send with the PUT
    pub headers: BTreeMap<String, String>,
    /// Set only for `public-read` objects
    pub public_url: Option<String>,
    pub bucket: String,
    pub key: String,
}

/// Result of a proxied upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub url: String,
    pub size: usize,
}

#[derive(Debug)]
struct ObjectLocation {
    scheme: String,
    host: String,
    path: String,
}

impl ObjectLocation {
    fn url(&self) -> String {
        format!(
            "{}://{}{}",
            self.scheme,
            self.host,
            sigv4::uri_encode(&self.path, false)
        )
    }
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    config: StorageConfig,
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn bucket(&self) -> Result<&str, StorageError> {
        self.config
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or(StorageError::NotConfigured("bucket"))
    }

    fn signer(&self) -> Result<Signer<'_>, StorageError> {
        let access_key = self
            .config
            .access_key_id
            .as_deref()
            .ok_or(StorageError::NotConfigured("access key"))?;
        let secret_key = self
            .config
            .secret_access_key
            .as_deref()
            .ok_or(StorageError::NotConfigured("secret key"))?;
        Ok(Signer::new(access_key, secret_key, &self.config.region))
    }

    fn location(&self, bucket: &str, key: &str) -> Result<ObjectLocation, StorageError> {
        let endpoint = self.config.endpoint_url();
        let parsed =
            Url::parse(&endpoint).map_err(|e| StorageError::InvalidEndpoint(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| StorageError::InvalidEndpoint(endpoint.clone()))?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let location = if self.config.force_path_style {
            ObjectLocation {
                scheme: parsed.scheme().to_string(),
                host,
                path: format!("/{}/{}", bucket, key),
            }
        } else {
            ObjectLocation {
                scheme: parsed.scheme().to_string(),
                host: format!("{}.{}", bucket, host),
                path: format!("/{}", key),
            }
        };
        Ok(location)
    }

    /// Public URL for an object: CDN base when configured, else the bucket host.
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        match self.config.cdn_base_url.as_deref().filter(|b| !b.is_empty()) {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!(
                "https://{}.{}.digitaloceanspaces.com/{}",
                bucket, self.config.region, key
            ),
        }
    }

    /// Presigns a PUT of `key`. The URL is valid for the configured expiry.
    pub fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        acl: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PresignedUpload, StorageError> {
        let bucket = self.bucket()?;
        let signer = self.signer()?;
        let location = self.location(bucket, key)?;

        let extra_query: Vec<(&str, &str)> = acl.map(|acl| ("x-amz-acl", acl)).into_iter().collect();
        let query = signer.presigned_query(
            SignTarget {
                method: "PUT",
                host: &location.host,
                path: &location.path,
            },
            &extra_query,
            &[("content-type", content_type)],
            self.config.presign_expires_seconds,
            now,
        )?;

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());

        let public_url = (acl == Some(ACL_PUBLIC_READ)).then(|| self.public_url(bucket, key));

        tracing::info!(bucket, key, "Presigned upload URL issued");
        Ok(PresignedUpload {
            url: format!("{}?{}", location.url(), query),
            headers,
            public_url,
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Uploads `body` to `key` as a public-read object.
    pub async fn upload_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        let bucket = self.bucket()?;
        let signer = self.signer()?;
        let location = self.location(bucket, key)?;

        let now = Utc::now();
        let amz_date = sigv4::amz_date(now);
        let payload_hash = sigv4::hex_sha256(&body);
        let authorization = signer.authorization(
            SignTarget {
                method: "PUT",
                host: &location.host,
                path: &location.path,
            },
            &[],
            &[
                ("content-type", content_type),
                ("x-amz-acl", ACL_PUBLIC_READ),
                ("x-amz-content-sha256", &payload_hash),
                ("x-amz-date", &amz_date),
            ],
            &payload_hash,
            now,
        )?;

        let size = body.len();
        let response = self
            .http
            .put(location.url())
            .header("authorization", authorization)
            .header("content-type", content_type)
            .header("x-amz-acl", ACL_PUBLIC_READ)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        tracing::info!(bucket, key, size, "Object uploaded");
        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            url: self.public_url(bucket, key),
            size,
        })
    }
}

/// Object key for a proxied upload: `uploads/<unix millis>-<sanitised name>`.
pub fn upload_key(original_filename: &str, now: DateTime<Utc>) -> String {
    format!(
        "uploads/{}-{}",
        now.timestamp_millis(),
        sanitize_filename(original_filename)
    )
}

/// Rejects empty keys, absolute keys and keys with `..` segments.
pub fn is_valid_object_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 1024
        && !key.starts_with('/')
        && !key.split('/').any(|segment| segment == ".." || segment == ".")
}
