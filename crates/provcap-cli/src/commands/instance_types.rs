use std::sync::Arc;

use provcap_core::{
    parse_supported_flag, BuiltinCatalog, CapabilityError, InstanceType, InstanceTypeAggregator,
    RequestContext, ZoneQuery,
};
use serde::Serialize;
use serde_json::Value;

use crate::cli::InstanceTypesArgs;
use crate::error::CliError;

use super::{parse_provider, rejected};

#[derive(Debug, Serialize)]
struct InstanceTypesResponseData {
    instance_types: Vec<InstanceType>,
}

pub async fn run(args: &InstanceTypesArgs, ctx: &RequestContext) -> Result<Value, CliError> {
    let provider = parse_provider(&args.provider, ctx)?;
    let supported = parse_supported_flag(&args.supported).map_err(|error| {
        rejected(CapabilityError::invalid_request("parse supported flag", error), ctx)
    })?;
    let query = ZoneQuery::new(args.region.as_str(), args.zone.as_str(), supported)
        .map_err(|error| rejected(error, ctx))?;

    let catalog = match &args.catalog {
        Some(path) => BuiltinCatalog::from_path(path)?,
        None => BuiltinCatalog::default(),
    };
    let aggregator = InstanceTypeAggregator::new(provider, Arc::new(catalog));
    let instance_types = aggregator
        .list_for_zone(ctx, &query)
        .await
        .map_err(|error| rejected(error, ctx))?;

    Ok(serde_json::to_value(InstanceTypesResponseData { instance_types })?)
}
