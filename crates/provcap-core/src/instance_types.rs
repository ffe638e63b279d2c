//! Instance-type aggregation for a region and optional zone.
//!
//! Results combine two provenances: a read-only builtin catalog loaded once at
//! startup, and an optional provider-specific live query. The aggregator owns
//! neither, it only filters and merges them.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::RequestContext;
use crate::error::{CapabilityError, ValidationError};
use crate::provider::ProviderType;

/// A compute shape offered in a region or zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceType {
    pub name: String,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub memory_mib: u64,
    #[serde(default)]
    pub architecture: String,
    pub region: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub supported: bool,
}

impl InstanceType {
    fn matches(&self, query: &ZoneQuery) -> bool {
        if !self.region.eq_ignore_ascii_case(&query.region) {
            return false;
        }
        if !query.zone.is_empty() && !self.zone.eq_ignore_ascii_case(&query.zone) {
            return false;
        }
        query
            .supported
            .map_or(true, |supported| self.supported == supported)
    }

    fn identity(&self) -> (String, String, String) {
        (
            self.name.clone(),
            self.region.to_ascii_lowercase(),
            self.zone.to_ascii_lowercase(),
        )
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read instance type catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed instance type catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("instance type catalog has an unknown provider key: {0}")]
    UnknownProvider(#[from] ValidationError),
}

/// Static per-provider instance types, keyed by provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinCatalog {
    entries: BTreeMap<ProviderType, Vec<InstanceType>>,
}

impl BuiltinCatalog {
    pub fn new(entries: BTreeMap<ProviderType, Vec<InstanceType>>) -> Self {
        Self { entries }
    }

    /// Parses `{"aws": [...], "gcp": [...]}`. Provider keys accept the same
    /// spellings as [`ProviderType::from_str`](std::str::FromStr).
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let by_key: BTreeMap<String, Vec<InstanceType>> = serde_json::from_str(raw)?;
        let mut entries: BTreeMap<ProviderType, Vec<InstanceType>> = BTreeMap::new();
        for (key, types) in by_key {
            let provider: ProviderType = key.parse()?;
            entries.entry(provider).or_default().extend(types);
        }
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn for_provider(&self, provider: ProviderType) -> &[InstanceType] {
        self.entries
            .get(&provider)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Validated filter for [`InstanceTypeAggregator::list_for_zone`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneQuery {
    region: String,
    zone: String,
    supported: Option<bool>,
}

impl ZoneQuery {
    pub fn new(
        region: impl Into<String>,
        zone: impl Into<String>,
        supported: Option<bool>,
    ) -> Result<Self, CapabilityError> {
        let region = region.into().trim().to_ascii_lowercase();
        if region.is_empty() {
            return Err(CapabilityError::invalid_request(
                "list instance types",
                ValidationError::MissingRegion,
            ));
        }

        Ok(Self {
            region,
            zone: zone.into().trim().to_ascii_lowercase(),
            supported,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Empty when the query spans every zone of the region.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub const fn supported(&self) -> Option<bool> {
        self.supported
    }
}

/// Parses the optional `supported` filter. Blank input means no filter.
pub fn parse_supported_flag(raw: &str) -> Result<Option<bool>, ValidationError> {
    match raw.trim() {
        "" => Ok(None),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Some(true)),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Some(false)),
        other => Err(ValidationError::InvalidSupportedFlag {
            value: other.to_owned(),
        }),
    }
}

pub type InstanceTypeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<InstanceType>, CapabilityError>> + Send + 'a>>;

/// Provider-specific live lookup of instance types. Cloud provider
/// implementations live with their provider clients, outside this crate.
pub trait InstanceTypeQuery: Send + Sync {
    fn list<'a>(&'a self, ctx: &'a RequestContext, query: &'a ZoneQuery) -> InstanceTypeFuture<'a>;
}

pub struct InstanceTypeAggregator {
    provider: ProviderType,
    catalog: Arc<BuiltinCatalog>,
    live: Option<Arc<dyn InstanceTypeQuery>>,
}

impl InstanceTypeAggregator {
    pub fn new(provider: ProviderType, catalog: Arc<BuiltinCatalog>) -> Self {
        Self {
            provider,
            catalog,
            live: None,
        }
    }

    pub fn with_live_query(mut self, live: Arc<dyn InstanceTypeQuery>) -> Self {
        self.live = Some(live);
        self
    }

    pub const fn provider(&self) -> ProviderType {
        self.provider
    }

    /// Filtered union of catalog and live entries. Catalog entries come first
    /// and duplicates on `(name, region, zone)` keep the first occurrence.
    /// An unmatched filter is an empty success.
    pub async fn list_for_zone(
        &self,
        ctx: &RequestContext,
        query: &ZoneQuery,
    ) -> Result<Vec<InstanceType>, CapabilityError> {
        let mut merged: Vec<InstanceType> = self
            .catalog
            .for_provider(self.provider)
            .iter()
            .filter(|instance_type| instance_type.matches(query))
            .cloned()
            .collect();
        let static_count = merged.len();

        if let Some(live) = &self.live {
            let fetched = ctx
                .run("list instance types", live.list(ctx, query))
                .await
                .inspect_err(|error| {
                    tracing::warn!(provider = %self.provider, %error, "live instance type query failed");
                })?;
            merged.extend(fetched.into_iter().filter(|instance_type| instance_type.matches(query)));
        }

        let mut seen = HashSet::with_capacity(merged.len());
        merged.retain(|instance_type| seen.insert(instance_type.identity()));

        tracing::debug!(
            provider = %self.provider,
            region = query.region(),
            zone = query.zone(),
            static_count,
            total = merged.len(),
            "instance types aggregated"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ErrorKind;

    const CATALOG: &str = r#"{
        "aws": [
            {"name": "a1.2xlarge", "vcpus": 8, "memory_mib": 16384, "architecture": "arm64",
             "region": "us-east-1", "zone": "a", "supported": true},
            {"name": "c5.xlarge", "vcpus": 4, "memory_mib": 8192, "architecture": "x86_64",
             "region": "us-east-1", "zone": "b", "supported": true},
            {"name": "m5.large", "vcpus": 2, "memory_mib": 8192, "architecture": "x86_64",
             "region": "us-west-2", "zone": "a", "supported": false}
        ],
        "google": [
            {"name": "e2-medium", "region": "us-central1", "zone": "us-central1-a"}
        ]
    }"#;

    struct FixedQuery {
        types: Vec<InstanceType>,
        calls: AtomicUsize,
    }

    impl InstanceTypeQuery for FixedQuery {
        fn list<'a>(&'a self, _ctx: &'a RequestContext, _query: &'a ZoneQuery) -> InstanceTypeFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let types = self.types.clone();
            Box::pin(async move { Ok(types) })
        }
    }

    fn instance(name: &str, region: &str, zone: &str, supported: bool) -> InstanceType {
        InstanceType {
            name: name.to_owned(),
            vcpus: 2,
            memory_mib: 4096,
            architecture: String::from("x86_64"),
            region: region.to_owned(),
            zone: zone.to_owned(),
            supported,
        }
    }

    fn names(types: &[InstanceType]) -> Vec<&str> {
        types.iter().map(|instance_type| instance_type.name.as_str()).collect()
    }

    fn aws_aggregator() -> InstanceTypeAggregator {
        let catalog = BuiltinCatalog::from_json_str(CATALOG).expect("valid catalog");
        InstanceTypeAggregator::new(ProviderType::Aws, Arc::new(catalog))
    }

    #[test]
    fn catalog_keys_accept_sources_provider_names() {
        let catalog = BuiltinCatalog::from_json_str(CATALOG).expect("valid catalog");
        assert_eq!(catalog.for_provider(ProviderType::Aws).len(), 3);
        assert_eq!(names(catalog.for_provider(ProviderType::Gcp)), vec!["e2-medium"]);
        assert!(catalog.for_provider(ProviderType::Azure).is_empty());
    }

    #[test]
    fn unknown_catalog_provider_is_rejected() {
        let error = BuiltinCatalog::from_json_str(r#"{"ibm": []}"#).expect_err("unknown key");
        assert!(matches!(error, CatalogError::UnknownProvider(_)));
    }

    #[test]
    fn catalog_loads_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("instance_types.json");
        std::fs::write(&path, CATALOG).expect("write catalog");

        let catalog = BuiltinCatalog::from_path(&path).expect("readable catalog");
        assert_eq!(catalog.for_provider(ProviderType::Aws).len(), 3);

        let missing = BuiltinCatalog::from_path(dir.path().join("absent.json"));
        assert!(matches!(missing, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn blank_region_is_invalid_request() {
        let error = ZoneQuery::new("  ", "a", None).expect_err("region required");
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn supported_flag_parses_like_boolean_literals() {
        assert_eq!(parse_supported_flag(""), Ok(None));
        assert_eq!(parse_supported_flag("TRUE"), Ok(Some(true)));
        assert_eq!(parse_supported_flag("0"), Ok(Some(false)));
        assert_eq!(
            parse_supported_flag("yes"),
            Err(ValidationError::InvalidSupportedFlag {
                value: String::from("yes")
            })
        );
    }

    #[tokio::test]
    async fn region_filter_is_case_insensitive() {
        let query = ZoneQuery::new("US-EAST-1", "", None).expect("valid");
        let types = aws_aggregator()
            .list_for_zone(&RequestContext::default(), &query)
            .await
            .expect("static only");

        assert_eq!(names(&types), vec!["a1.2xlarge", "c5.xlarge"]);
    }

    #[tokio::test]
    async fn zone_and_support_filters_narrow_results() {
        let ctx = RequestContext::default();
        let aggregator = aws_aggregator();

        let zone_b = ZoneQuery::new("us-east-1", "B", None).expect("valid");
        assert_eq!(
            names(&aggregator.list_for_zone(&ctx, &zone_b).await.expect("ok")),
            vec!["c5.xlarge"]
        );

        let unsupported = ZoneQuery::new("us-east-1", "", Some(false)).expect("valid");
        assert!(aggregator.list_for_zone(&ctx, &unsupported).await.expect("ok").is_empty());
    }

    #[tokio::test]
    async fn unknown_region_is_empty_success() {
        let query = ZoneQuery::new("eu-north-9", "", None).expect("valid");
        let types = aws_aggregator()
            .list_for_zone(&RequestContext::default(), &query)
            .await
            .expect("empty is fine");
        assert!(types.is_empty());
    }

    #[tokio::test]
    async fn live_results_are_filtered_and_deduplicated_after_static() {
        let live = Arc::new(FixedQuery {
            types: vec![
                instance("c5.xlarge", "us-east-1", "B", true),
                instance("t3.micro", "us-east-1", "a", true),
                instance("t3.micro", "us-west-2", "a", true),
            ],
            calls: AtomicUsize::new(0),
        });
        let aggregator = aws_aggregator().with_live_query(live.clone());

        let query = ZoneQuery::new("us-east-1", "", None).expect("valid");
        let types = aggregator
            .list_for_zone(&RequestContext::default(), &query)
            .await
            .expect("merged");

        assert_eq!(names(&types), vec!["a1.2xlarge", "c5.xlarge", "t3.micro"]);
        assert_eq!(types[1].architecture, "x86_64");
        assert_eq!(types[1].vcpus, 4, "static entry wins over the live duplicate");
        assert_eq!(live.calls.load(Ordering::SeqCst), 1);
    }
}
