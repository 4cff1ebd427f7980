//! Process-wide cache of MailerLite group listings.
//!
//! The lock is held across the upstream fetch, so concurrent misses wait for
//! the first caller instead of issuing their own request.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;

use super::mailerlite::{Group, MailerLiteClient, MailerLiteError};

const NAME_CACHE_CAPACITY: usize = 256;

#[derive(Debug)]
struct CachedListing {
    groups: Arc<Vec<Group>>,
    fetched_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    listing: Option<CachedListing>,
    names: LruCache<String, String>,
}

/// Shared, TTL-bounded cache of the group listing and of group names by id.
#[derive(Debug, Clone)]
pub struct GroupsCache {
    ttl: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl GroupsCache {
    pub fn new(ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(NAME_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            state: Arc::new(Mutex::new(CacheState {
                listing: None,
                names: LruCache::new(capacity),
            })),
        }
    }

    /// Returns the cached listing, fetching it when absent or stale.
    pub async fn get_or_fetch(
        &self,
        client: &MailerLiteClient,
    ) -> Result<Arc<Vec<Group>>, MailerLiteError> {
        let mut state = self.state.lock().await;

        if let Some(listing) = &state.listing
            && listing.fetched_at.elapsed() < self.ttl
        {
            tracing::debug!(count = listing.groups.len(), "Serving cached MailerLite groups");
            return Ok(Arc::clone(&listing.groups));
        }

        let groups = Arc::new(client.list_groups().await?);
        state.names.clear();
        state.listing = Some(CachedListing {
            groups: Arc::clone(&groups),
            fetched_at: Instant::now(),
        });
        Ok(groups)
    }

    /// Evicts the listing and every cached name.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.listing = None;
        state.names.clear();
        tracing::info!("MailerLite groups cache cleared");
    }

    /// Evicts the cache and fetches a fresh listing.
    pub async fn refresh(
        &self,
        client: &MailerLiteClient,
    ) -> Result<Arc<Vec<Group>>, MailerLiteError> {
        self.invalidate().await;
        self.get_or_fetch(client).await
    }

    /// Resolves names for `group_ids`, falling back to `"Group ID: <id>"`
    /// when an id is unknown or the listing cannot be fetched.
    ///
    /// Fetches the listing at most once per call, so an unreachable upstream
    /// costs one timeout however many ids are asked for.
    pub async fn resolve_names<'a, I>(
        &self,
        client: &MailerLiteClient,
        group_ids: I,
    ) -> HashMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved = HashMap::new();
        let mut missing = Vec::new();
        {
            let mut state = self.state.lock().await;
            for id in group_ids {
                if resolved.contains_key(id) || missing.contains(&id) {
                    continue;
                }
                match state.names.get(id) {
                    Some(name) => {
                        resolved.insert(id.to_string(), name.clone());
                    }
                    None => missing.push(id),
                }
            }
        }
        if missing.is_empty() {
            return resolved;
        }

        let groups = match self.get_or_fetch(client).await {
            Ok(groups) => groups,
            Err(err) => {
                tracing::warn!(count = missing.len(), error = %err, "Could not resolve MailerLite group names");
                for id in missing {
                    resolved.insert(id.to_string(), fallback_name(id));
                }
                return resolved;
            }
        };

        let mut state = self.state.lock().await;
        for id in missing {
            let name = match groups.iter().find(|g| g.id == id) {
                Some(group) => {
                    state.names.put(id.to_string(), group.name.clone());
                    group.name.clone()
                }
                None => fallback_name(id),
            };
            resolved.insert(id.to_string(), name);
        }
        resolved
    }
}

fn fallback_name(group_id: &str) -> String {
    format!("Group ID: {}", group_id)
}
