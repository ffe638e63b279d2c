use provcap_core::ResponseError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] provcap_core::ConfigError),

    #[error(transparent)]
    Catalog(#[from] provcap_core::CatalogError),

    #[error("cannot build http client: {0}")]
    Transport(#[from] provcap_core::HttpError),

    /// Classified failure, rendered as a JSON payload.
    #[error("{}", .0.message)]
    Request(Box<ResponseError>),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Catalog(_) | Self::Transport(_) => 2,
            Self::Request(response) if response.status < 500 => 3,
            Self::Request(_) => 5,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

impl From<ResponseError> for CliError {
    fn from(response: ResponseError) -> Self {
        Self::Request(Box::new(response))
    }
}
