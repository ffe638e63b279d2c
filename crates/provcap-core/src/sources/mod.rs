//! Client for the Sources service.
//!
//! Every Sources query is scoped by the provisioning application type id,
//! which is resolved once and kept in the cache-aside store. On top of that
//! the client lists provisioning sources and resolves the provisioning
//! credentials of a single source.
//!
//! | Operation | Upstream call | Not-found becomes |
//! |-----------|---------------|-------------------|
//! | [`SourcesClient::provisioning_type_id`] | `GET /application_types` | `ApplicationTypeNotFound` |
//! | [`SourcesClient::list_by_provider`] | `GET /application_types/{id}/sources` | `SourceNotFound` |
//! | [`SourcesClient::list_all`] | `GET /application_types/{id}/sources` | `SourceNotFound` |
//! | [`SourcesClient::authentication`] | `GET /sources/{id}/authentications` | `AuthenticationForSourceNotFound` |

mod authentication;
mod models;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::Instrument;

pub use authentication::{Authentication, AWS_AUTH_TYPE, AZURE_AUTH_TYPE, GCP_AUTH_TYPE};
pub use models::{AuthenticationRecord, Source};

use crate::cache::{CacheLookup, CacheStore, APP_TYPE_CACHE_KEY};
use crate::config::SourcesConfig;
use crate::context::RequestContext;
use crate::error::{classify, CapabilityError, ErrorKind, ValidationError};
use crate::hooks::{apply_editors, QueryParams, RequestEditor};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::provider::ProviderType;
use models::{ApplicationTypePayload, DataList, SourcePayload};

const SOURCE_TYPE_FILTER: &str = "filter[source_type][name]";
const RESOURCE_TYPE_FILTER: &str = "filter[resource_type]";
const AUTH_TYPE_PREFIX_FILTER: &str = "filter[authtype][starts_with]";

/// Resolves provisioning sources and credentials from the Sources service.
#[derive(Clone)]
pub struct SourcesClient {
    base_url: String,
    app_name: String,
    timeout_ms: u64,
    http_client: Arc<dyn HttpClient>,
    cache: Arc<dyn CacheStore>,
}

impl SourcesClient {
    pub fn new(
        config: &SourcesConfig,
        http_client: Arc<dyn HttpClient>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_owned(),
            app_name: config.app_name.clone(),
            timeout_ms: config.timeout_ms,
            http_client,
            cache,
        }
    }

    /// Readiness probe: the application types listing must answer 2xx.
    pub async fn ready(&self, ctx: &RequestContext) -> Result<(), CapabilityError> {
        const OPERATION: &str = "ready call";

        let response = self
            .get(ctx, OPERATION, "/application_types", None)
            .await
            .inspect_err(|error| tracing::error!(%error, "readiness request failed for sources"))?;
        check_status(OPERATION, &response)
    }

    /// Cache-aside resolution of the provisioning application type id.
    ///
    /// A cache read failure is returned as is; the network is only consulted
    /// on a clean miss.
    pub async fn provisioning_type_id(&self, ctx: &RequestContext) -> Result<String, CapabilityError> {
        match self.lookup_app_type_id().await? {
            CacheLookup::Hit(app_type_id) => {
                tracing::trace!(%app_type_id, "application type id served from cache");
                Ok(app_type_id)
            }
            CacheLookup::Miss => self.refresh_app_type_id(ctx).await,
        }
    }

    pub async fn lookup_app_type_id(&self) -> Result<CacheLookup, CapabilityError> {
        self.cache
            .lookup(APP_TYPE_CACHE_KEY)
            .await
            .map_err(|error| CapabilityError::cache("unable to get app type id from cache", error))
    }

    /// Fetches the id upstream and writes it back. Safe to run from several
    /// callers at once: they all fetch and store the same value.
    pub async fn refresh_app_type_id(&self, ctx: &RequestContext) -> Result<String, CapabilityError> {
        let app_type_id = self.load_app_type_id(ctx).await?;

        if let Err(error) = self.cache.store(APP_TYPE_CACHE_KEY, app_type_id.clone()).await {
            tracing::warn!(%error, "unable to store app type id to cache");
        }
        Ok(app_type_id)
    }

    async fn load_app_type_id(&self, ctx: &RequestContext) -> Result<String, CapabilityError> {
        const OPERATION: &str = "load app ID call";
        tracing::trace!("fetching the provisioning application type id");

        let response = self
            .get(ctx, OPERATION, "/application_types", None)
            .await
            .inspect_err(|error| tracing::warn!(%error, "failed to fetch application types"))?;
        check_status(OPERATION, &response).map_err(|error| {
            refine_not_found(error, ErrorKind::ApplicationTypeNotFound, "application type not found")
        })?;

        let app_types: DataList<ApplicationTypePayload> = decode(OPERATION, &response)?;
        let app_type_id = app_types
            .data
            .into_iter()
            .find(|app_type| app_type.name == self.app_name)
            .map(|app_type| app_type.id)
            .ok_or_else(|| {
                CapabilityError::new(
                    ErrorKind::ApplicationTypeNotFound,
                    OPERATION,
                    "provisioning application type is not registered",
                )
            })?;

        tracing::trace!(%app_type_id, "application type id resolved");
        Ok(app_type_id)
    }

    /// Sources of one provider, filtered server side. Upstream order is kept.
    pub async fn list_by_provider(
        &self,
        ctx: &RequestContext,
        provider: ProviderType,
    ) -> Result<Vec<Source>, CapabilityError> {
        let span = tracing::debug_span!(
            "sources.list_by_provider",
            %provider,
            edge_request_id = ctx.edge_request_id()
        );
        let query = QueryParams::new([SOURCE_TYPE_FILTER, provider.sources_provider_name()]);
        self.list_sources(ctx, Some(&query)).instrument(span).await
    }

    /// Every provisioning source regardless of provider.
    pub async fn list_all(&self, ctx: &RequestContext) -> Result<Vec<Source>, CapabilityError> {
        let span = tracing::debug_span!("sources.list_all", edge_request_id = ctx.edge_request_id());
        self.list_sources(ctx, None).instrument(span).await
    }

    async fn list_sources(
        &self,
        ctx: &RequestContext,
        query: Option<&QueryParams>,
    ) -> Result<Vec<Source>, CapabilityError> {
        const OPERATION: &str = "list provisioning sources call";

        let app_type_id = self.provisioning_type_id(ctx).await.map_err(|error| {
            tracing::warn!(%error, "failed to get provisioning type id");
            error.context("failed to get provisioning app type")
        })?;

        let path = format!("/application_types/{}/sources", urlencoding::encode(&app_type_id));
        let response = self.get(ctx, OPERATION, &path, query).await?;
        check_status(OPERATION, &response)
            .map_err(|error| refine_not_found(error, ErrorKind::SourceNotFound, "source not found"))?;

        let sources: DataList<SourcePayload> = decode(OPERATION, &response)?;
        Ok(sources.data.into_iter().map(Source::from).collect())
    }

    /// Provisioning credentials of a source.
    ///
    /// When several records match, the first one in response order wins.
    /// Zero records fail with `MissingProvisioningAuthentication`.
    pub async fn authentication(
        &self,
        ctx: &RequestContext,
        source_id: &str,
    ) -> Result<Authentication, CapabilityError> {
        const OPERATION: &str = "get source authentication call";

        if source_id.trim().is_empty() {
            return Err(CapabilityError::invalid_request(
                OPERATION,
                ValidationError::EmptySourceId,
            ));
        }

        let span = tracing::debug_span!(
            "sources.authentication",
            source_id,
            edge_request_id = ctx.edge_request_id()
        );
        async move {
            let path = format!("/sources/{}/authentications", urlencoding::encode(source_id));
            let query = QueryParams::new([
                RESOURCE_TYPE_FILTER,
                "Application",
                AUTH_TYPE_PREFIX_FILTER,
                "provisioning",
            ]);
            let response = self.get(ctx, OPERATION, &path, Some(&query)).await?;
            check_status(OPERATION, &response).map_err(|error| {
                refine_not_found(
                    error,
                    ErrorKind::AuthenticationForSourceNotFound,
                    "authentication for source not found",
                )
            })?;

            let records: DataList<AuthenticationRecord> = decode(OPERATION, &response)?;
            match records.data.into_iter().next() {
                Some(record) => {
                    tracing::debug!(authtype = %record.authtype, "selected first provisioning authentication");
                    Authentication::from_record(record).map_err(|error| error.context(OPERATION))
                }
                None => {
                    tracing::trace!("source does not have provisioning authentications of type application");
                    Err(CapabilityError::new(
                        ErrorKind::MissingProvisioningAuthentication,
                        OPERATION,
                        "source has no provisioning authentication",
                    ))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn get(
        &self,
        ctx: &RequestContext,
        operation: &str,
        path: &str,
        query: Option<&QueryParams>,
    ) -> Result<HttpResponse, CapabilityError> {
        let mut request =
            HttpRequest::get(format!("{}{path}", self.base_url)).with_timeout_ms(self.timeout_ms);

        let mut editors: Vec<&dyn RequestEditor> = Vec::with_capacity(3);
        if let Some(identity) = ctx.identity() {
            editors.push(identity);
        }
        editors.push(ctx.edge_request_id_editor());
        if let Some(query) = query {
            editors.push(query);
        }
        apply_editors(&mut request, &editors)
            .map_err(|error| CapabilityError::query(operation, error))?;

        let http_client = Arc::clone(&self.http_client);
        ctx.run(operation, async move {
            http_client
                .execute(request)
                .await
                .map_err(|error| CapabilityError::transport(operation, error))
        })
        .await
    }
}

fn check_status(operation: &str, response: &HttpResponse) -> Result<(), CapabilityError> {
    classify(response.status, Some(&response.body))
        .map_err(|error| CapabilityError::from_status(operation, error))
}

fn refine_not_found(error: CapabilityError, kind: ErrorKind, message: &str) -> CapabilityError {
    if error.kind() == ErrorKind::NotFound {
        error.refine(kind, message)
    } else {
        error
    }
}

fn decode<T: DeserializeOwned>(operation: &str, response: &HttpResponse) -> Result<T, CapabilityError> {
    serde_json::from_str(&response.body).map_err(|error| CapabilityError::decode(operation, error))
}
