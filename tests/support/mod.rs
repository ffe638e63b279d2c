//! Shared stubs for behavior tests. Nothing here touches the network.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use provcap_core::{
    CacheError, CacheFuture, CacheLookup, CacheStore, HttpClient, HttpError, HttpFuture,
    HttpRequest, HttpResponse, MemoryCache, SourcesClient, SourcesConfig,
};

pub const SOURCES_URL: &str = "https://sources.test/api/sources/v3.1";

pub const APP_TYPES: &str = r#"{"data": [
    {"id": "1", "name": "/insights/platform/cost-management"},
    {"id": "5", "name": "/insights/platform/provisioning"}
]}"#;

/// Answers by URL suffix and records every request it sees.
#[derive(Default)]
pub struct StubHttpClient {
    routes: Vec<(String, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .push((path.to_owned(), Ok(HttpResponse::new(status, body))));
        self
    }

    pub fn fail(mut self, path: &str, message: &str) -> Self {
        self.routes
            .push((path.to_owned(), Err(HttpError::non_retryable(message))));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log lock").clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.url.ends_with(path))
            .count()
    }
}

impl HttpClient for StubHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let outcome = self
            .routes
            .iter()
            .find(|(path, _)| request.url.ends_with(path.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Ok(HttpResponse::new(404, "")));
        self.requests.lock().expect("request log lock").push(request);
        Box::pin(async move { outcome })
    }
}

/// Cache whose reads and writes can be made to fail independently.
pub struct FlakyCache {
    fail_lookup: bool,
    fail_store: bool,
    stores: AtomicUsize,
    inner: MemoryCache,
}

impl FlakyCache {
    fn new(fail_lookup: bool, fail_store: bool) -> Self {
        Self {
            fail_lookup,
            fail_store,
            stores: AtomicUsize::new(0),
            inner: MemoryCache::new(std::time::Duration::from_secs(3600)),
        }
    }

    pub fn failing_writes() -> Self {
        Self::new(false, true)
    }

    pub fn failing_reads() -> Self {
        Self::new(true, false)
    }

    pub fn store_attempts(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

impl CacheStore for FlakyCache {
    fn lookup<'a>(&'a self, key: &'a str) -> CacheFuture<'a, CacheLookup> {
        if self.fail_lookup {
            return Box::pin(async { Err(CacheError::Unavailable(String::from("timeout"))) });
        }
        self.inner.lookup(key)
    }

    fn store<'a>(&'a self, key: &'a str, value: String) -> CacheFuture<'a, ()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        if self.fail_store {
            return Box::pin(async { Err(CacheError::Unavailable(String::from("read only"))) });
        }
        self.inner.store(key, value)
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(std::time::Duration::from_secs(3600)))
}

pub fn sources_client(http: Arc<StubHttpClient>, cache: Arc<dyn CacheStore>) -> SourcesClient {
    let config = SourcesConfig {
        url: String::from(SOURCES_URL),
        ..SourcesConfig::default()
    };
    SourcesClient::new(&config, http, cache)
}
