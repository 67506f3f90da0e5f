//! Response Cache
//!
//! In-memory store backing `CacheDirective::ForceCache`. Only successful
//! responses without GraphQL errors are stored, and at most `capacity` of
//! them; the oldest entry is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use super::transport::RawResponse;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

#[derive(Default)]
struct Entries {
    responses: HashMap<CacheKey, RawResponse>,
    // insertion order, oldest first
    order: VecDeque<CacheKey>,
}

/// Cache of backend responses, keyed by endpoint, body and credential
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<Entries>>,
    capacity: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            capacity: capacity.max(1),
        }
    }

    /// Responses are per-credential: two users never share an entry.
    pub fn key(url: &str, body: &str, credential: Option<&str>) -> CacheKey {
        let mut hasher = Sha256::new();
        for part in [url, body, credential.unwrap_or("")] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        CacheKey(hasher.finalize().into())
    }

    pub async fn get(&self, key: &CacheKey) -> Option<RawResponse> {
        let entries = self.entries.read().await;
        entries.responses.get(key).cloned()
    }

    /// Store `response` if it is cacheable. Returns whether it was stored.
    pub async fn store(&self, key: CacheKey, response: &RawResponse) -> bool {
        if !Self::is_cacheable(response) {
            return false;
        }
        let mut entries = self.entries.write().await;
        if entries.responses.insert(key, response.clone()).is_none() {
            entries.order.push_back(key);
        }
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.responses.remove(&oldest);
                debug!("Response cache full, evicted oldest entry");
            }
        }
        true
    }

    fn is_cacheable(response: &RawResponse) -> bool {
        if !response.is_success() {
            return false;
        }
        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(body) => body.get("errors").is_none() && body.get("data").is_some(),
            Err(_) => false,
        }
    }
}
