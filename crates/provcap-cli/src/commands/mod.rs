mod instance_types;
mod ready;
mod sources;

use std::sync::Arc;

use provcap_core::{
    CapabilityError, Config, MemoryCache, ProviderType, RequestContext, ReqwestHttpClient,
    ResponseError, SourcesClient,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli, ctx: &RequestContext) -> Result<Value, CliError> {
    match &cli.command {
        Command::Ready => ready::run(&sources_client(&load_config(cli)?)?, ctx).await,
        Command::Sources(command) => {
            sources::run(command, &sources_client(&load_config(cli)?)?, ctx).await
        }
        Command::InstanceTypes(args) => instance_types::run(args, ctx).await,
    }
}

/// Environment configuration with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.sources_url {
        config.sources.url = url.trim_end_matches('/').to_owned();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.sources.timeout_ms = timeout_ms;
    }
    Ok(config)
}

fn sources_client(config: &Config) -> Result<SourcesClient, CliError> {
    let http_client = match &config.sources.proxy_url {
        Some(proxy_url) => ReqwestHttpClient::with_proxy(proxy_url)?,
        None => ReqwestHttpClient::new(),
    };
    let cache = Arc::new(MemoryCache::new(config.cache.app_type_ttl));
    Ok(SourcesClient::new(&config.sources, Arc::new(http_client), cache))
}

fn rejected(error: CapabilityError, ctx: &RequestContext) -> CliError {
    ResponseError::from_error(&error, ctx.edge_request_id()).into()
}

fn parse_provider(raw: &str, ctx: &RequestContext) -> Result<ProviderType, CliError> {
    raw.parse::<ProviderType>()
        .map_err(|error| rejected(CapabilityError::invalid_request("parse provider", error), ctx))
}
