//! # Provcap Core
//!
//! Resolution of provisioning capabilities from the Sources service.
//!
//! ## Overview
//!
//! - **Application type resolution** with a cache-aside store
//! - **Source listing** per cloud provider
//! - **Authentication resolution** for a single source
//! - **Two-tier error classification** and a user-facing error renderer
//! - **Instance-type aggregation** over a builtin catalog and live queries
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Cache-aside store contract and in-memory TTL cache |
//! | [`config`] | Environment-driven configuration |
//! | [`context`] | Per-request identity, edge id and cancellation |
//! | [`error`] | Status classification and the capability error taxonomy |
//! | [`hooks`] | Request editors (identity, edge id, query) |
//! | [`http_client`] | Transport contract and reqwest implementation |
//! | [`instance_types`] | Builtin catalog and region/zone aggregation |
//! | [`provider`] | Cloud provider identifiers |
//! | [`query`] | Query-string construction |
//! | [`render`] | JSON error payloads |
//! | [`retry`] | Transport retry policy |
//! | [`sources`] | Sources client |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use provcap_core::{Config, MemoryCache, ProviderType, ReqwestHttpClient, RequestContext, SourcesClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let cache = Arc::new(MemoryCache::new(config.cache.app_type_ttl));
//!     let client = SourcesClient::new(&config.sources, Arc::new(ReqwestHttpClient::new()), cache);
//!
//!     let ctx = RequestContext::new(std::env::var("IDENTITY")?);
//!     for source in client.list_by_provider(&ctx, ProviderType::Aws).await? {
//!         let auth = client.authentication(&ctx, &source.id).await?;
//!         println!("{} -> {}", source.name, auth.payload());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`CapabilityError`]. Match on its kind, or use the
//! coarse predicates when only the status class matters:
//!
//! ```rust
//! use provcap_core::{CapabilityError, ErrorKind};
//!
//! fn handle(error: &CapabilityError) {
//!     match error.kind() {
//!         ErrorKind::MissingProvisioningAuthentication => {
//!             // Ask the user to attach credentials
//!         }
//!         _ if error.is_unauthorized() => {
//!             // Identity header rejected upstream
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod http_client;
pub mod instance_types;
pub mod provider;
pub mod query;
pub mod render;
pub mod retry;
pub mod sources;

// Caching
pub use cache::{CacheError, CacheFuture, CacheLookup, CacheStore, MemoryCache, APP_TYPE_CACHE_KEY};

// Configuration
pub use config::{CacheConfig, Config, ConfigError, SourcesConfig};

// Request context
pub use context::RequestContext;

// Error types
pub use error::{
    classify, CapabilityError, ClientError, ErrorCause, ErrorKind, StatusClass, ValidationError,
};

// Request editors
pub use hooks::{EdgeRequestId, IdentityHeader, QueryParams, RequestEditor};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Instance types
pub use instance_types::{
    parse_supported_flag, BuiltinCatalog, CatalogError, InstanceType, InstanceTypeAggregator,
    InstanceTypeFuture, InstanceTypeQuery, ZoneQuery,
};

pub use provider::ProviderType;
pub use query::{build_query, QueryError};
pub use render::{summarize, ResponseError};
pub use retry::{Backoff, RetryConfig};
pub use sources::{Authentication, AuthenticationRecord, Source, SourcesClient};
