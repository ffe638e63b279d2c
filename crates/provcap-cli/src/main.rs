mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use provcap_core::RequestContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provcap=info,provcap_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            output::render_error(&error, cli.pretty);
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let ctx = request_context(cli);

    let cancellation = ctx.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling request");
            cancellation.cancel();
        }
    });

    let data = commands::run(cli, &ctx).await?;
    output::render(&data, cli.format, cli.pretty)
}

fn request_context(cli: &Cli) -> RequestContext {
    let ctx = match &cli.identity {
        Some(identity) => RequestContext::new(identity.clone()),
        None => RequestContext::default(),
    };
    match &cli.edge_request_id {
        Some(edge_request_id) => ctx.with_edge_request_id(edge_request_id.clone()),
        None => ctx,
    }
}
