use provcap_core::{RequestContext, Source, SourcesClient};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{AuthArgs, ListSourcesArgs, SourcesCommand};
use crate::error::CliError;

use super::{parse_provider, rejected};

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<Source>,
}

pub async fn run(
    command: &SourcesCommand,
    client: &SourcesClient,
    ctx: &RequestContext,
) -> Result<Value, CliError> {
    match command {
        SourcesCommand::List(args) => list(args, client, ctx).await,
        SourcesCommand::Auth(args) => auth(args, client, ctx).await,
    }
}

async fn list(
    args: &ListSourcesArgs,
    client: &SourcesClient,
    ctx: &RequestContext,
) -> Result<Value, CliError> {
    let sources = match args.provider.as_deref() {
        Some(raw) => {
            let provider = parse_provider(raw, ctx)?;
            client.list_by_provider(ctx, provider).await
        }
        None => client.list_all(ctx).await,
    }
    .map_err(|error| rejected(error, ctx))?;

    Ok(serde_json::to_value(SourcesResponseData { sources })?)
}

async fn auth(args: &AuthArgs, client: &SourcesClient, ctx: &RequestContext) -> Result<Value, CliError> {
    let authentication = client
        .authentication(ctx, &args.source_id)
        .await
        .map_err(|error| rejected(error, ctx))?;

    if let Some(raw) = args.provider.as_deref() {
        let provider = parse_provider(raw, ctx)?;
        authentication
            .must_be(provider)
            .map_err(|error| rejected(error, ctx))?;
    }

    Ok(serde_json::to_value(authentication)?)
}
