use provcap_core::{RequestContext, SourcesClient};
use serde_json::{json, Value};

use crate::error::CliError;

use super::rejected;

pub async fn run(client: &SourcesClient, ctx: &RequestContext) -> Result<Value, CliError> {
    client
        .ready(ctx)
        .await
        .map_err(|error| rejected(error, ctx))?;
    Ok(json!({ "status": "ready", "edge_id": ctx.edge_request_id() }))
}
