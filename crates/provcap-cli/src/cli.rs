//! CLI argument definitions for provcap.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ready` | Probe the Sources service |
//! | `sources list` | List provisioning sources, optionally per provider |
//! | `sources auth` | Resolve provisioning credentials of a source |
//! | `instance-types` | List instance types for a region and zone |
//!
//! Connection settings come from `PROVCAP_*` environment variables; the
//! global flags below override them.
//!
//! # Examples
//!
//! ```bash
//! provcap sources list --provider aws --pretty
//! provcap sources auth 42
//! provcap instance-types --provider aws --region us-east-1 --supported true
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "provcap",
    author,
    version,
    about = "Resolve provisioning sources, credentials and instance types"
)]
pub struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Base64 identity document forwarded as `x-rh-identity`.
    #[arg(long, global = true, env = "PROVCAP_IDENTITY", hide_env_values = true)]
    pub identity: Option<String>,

    /// Edge request id to propagate. Generated when absent.
    #[arg(long, global = true)]
    pub edge_request_id: Option<String>,

    /// Overrides `PROVCAP_SOURCES_URL`.
    #[arg(long, global = true)]
    pub sources_url: Option<String>,

    /// Overrides `PROVCAP_SOURCES_TIMEOUT_MS`.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the Sources service answers.
    Ready,
    /// Source listing and credential resolution.
    #[command(subcommand)]
    Sources(SourcesCommand),
    /// Instance types known for a region.
    InstanceTypes(InstanceTypesArgs),
}

#[derive(Debug, Subcommand)]
pub enum SourcesCommand {
    List(ListSourcesArgs),
    Auth(AuthArgs),
}

#[derive(Debug, Args)]
pub struct ListSourcesArgs {
    /// aws, azure or gcp. Lists every provider when omitted.
    #[arg(long)]
    pub provider: Option<String>,
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    pub source_id: String,

    /// Fail unless the credentials were issued for this provider.
    #[arg(long)]
    pub provider: Option<String>,
}

#[derive(Debug, Args)]
pub struct InstanceTypesArgs {
    #[arg(long)]
    pub provider: String,

    /// Required. Kept optional here so a missing value is reported as an
    /// invalid request rather than a usage error.
    #[arg(long, default_value = "")]
    pub region: String,

    #[arg(long, default_value = "")]
    pub zone: String,

    /// Boolean literal (true, false, 1, 0, t, f). Blank disables the filter.
    #[arg(long, default_value = "")]
    pub supported: String,

    /// JSON catalog of builtin instance types keyed by provider.
    #[arg(long, env = "PROVCAP_INSTANCE_TYPES_CATALOG")]
    pub catalog: Option<PathBuf>,
}
