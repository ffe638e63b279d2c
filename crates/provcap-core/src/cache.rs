//! Cache-aside store used for the provisioning application type id.
//!
//! Lookups return a tagged [`CacheLookup`] so a miss is a normal value and
//! only real backend failures surface as [`CacheError`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Key under which the provisioning application type id is cached.
pub const APP_TYPE_CACHE_KEY: &str = "provisioning-app-type-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(String),
    Miss,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache entry '{key}' is corrupt")]
    Corrupt { key: String },
}

pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + Send + 'a>>;

/// Key-value store shared by concurrent callers.
pub trait CacheStore: Send + Sync {
    fn lookup<'a>(&'a self, key: &'a str) -> CacheFuture<'a, CacheLookup>;

    fn store<'a>(&'a self, key: &'a str, value: String) -> CacheFuture<'a, ()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl CacheInner {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .get(key)
            .filter(|entry| Instant::now() <= entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    fn put(&mut self, key: String, value: String, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.map.insert(key, CacheEntry { value, expires_at });
    }
}

/// In-memory TTL cache. Eviction happens on expiry only.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl MemoryCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
            })),
        }
    }

    /// Zero TTL: every lookup misses and stores are dropped.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key)
    }

    /// Stores a value; `ttl_override` replaces the default TTL for this entry.
    pub async fn put(&self, key: impl Into<String>, value: impl Into<String>, ttl_override: Option<Duration>) {
        let mut inner = self.inner.write().await;
        if inner.default_ttl == Duration::ZERO {
            return;
        }
        let ttl = ttl_override.unwrap_or(inner.default_ttl);
        inner.put(key.into(), value.into(), ttl);
    }

    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.inner
            .write()
            .await
            .map
            .retain(|_, entry| entry.expires_at > now);
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of entries, expired ones included until `clear_expired` runs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        self.inner.read().await.default_ttl == Duration::ZERO
    }
}

impl CacheStore for MemoryCache {
    fn lookup<'a>(&'a self, key: &'a str) -> CacheFuture<'a, CacheLookup> {
        Box::pin(async move {
            Ok(match self.get(key).await {
                Some(value) => CacheLookup::Hit(value),
                None => CacheLookup::Miss,
            })
        })
    }

    fn store<'a>(&'a self, key: &'a str, value: String) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            self.put(key, value, None).await;
            Ok(())
        })
    }
}
