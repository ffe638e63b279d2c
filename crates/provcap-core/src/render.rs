//! User-facing error payloads for failures crossing the subsystem boundary.

use serde::Serialize;

use crate::error::{CapabilityError, ErrorKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON error body handed to callers. `status` travels out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseError {
    #[serde(skip)]
    pub status: u16,
    #[serde(rename = "msg", skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub edge_id: String,
    /// Summary of the cause chain. The full chain is only logged.
    pub error: String,
    pub version: String,
}

impl ResponseError {
    /// Builds a payload and logs the full cause chain, at `warn` below 500 and
    /// `error` above. The body only carries the part of the chain before its
    /// first colon, so upstream URLs and identifiers stay in the logs.
    ///
    /// A blank `user_message` is replaced by the same summary.
    pub fn new(
        status: u16,
        user_message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        edge_id: &str,
    ) -> Self {
        let chain = error.map(error_chain).unwrap_or_default();
        let summary = summarize(&chain).to_owned();
        let message = if user_message.is_empty() {
            summary.clone()
        } else {
            user_message.to_owned()
        };

        if status < 500 {
            tracing::warn!(status, edge_id, error = %chain, "{message}");
        } else {
            tracing::error!(status, edge_id, error = %chain, "{message}");
        }

        Self {
            status,
            message,
            edge_id: edge_id.to_owned(),
            error: summary,
            version: String::from(VERSION),
        }
    }

    /// Maps a classified error to its HTTP status and short message.
    pub fn from_error(error: &CapabilityError, edge_id: &str) -> Self {
        let (status, message) = match error.kind() {
            ErrorKind::ApplicationTypeNotFound => (404, String::from("unexpected source type")),
            ErrorKind::SourceNotFound => (404, String::from("source not found")),
            ErrorKind::AuthenticationForSourceNotFound => {
                (404, String::from("authentication for source not found"))
            }
            ErrorKind::MissingProvisioningAuthentication => {
                (404, String::from("source has no provisioning authentication"))
            }
            ErrorKind::UnknownAuthenticationType => (500, String::from("unknown authentication type")),
            ErrorKind::NotFound => (404, String::from("service returned not found or no data")),
            ErrorKind::Unauthorized => (401, String::from("service returned unauthorized")),
            ErrorKind::Forbidden => (403, String::from("service returned forbidden")),
            ErrorKind::Non2xxResponse => (500, String::from("service did not return 2xx")),
            ErrorKind::InvalidRequest => (400, format!("invalid request: {}", error.message())),
            ErrorKind::Internal => (500, String::from("HTTP service returned unknown client error")),
        };
        Self::new(status, &message, Some(error), edge_id)
    }

    pub fn missing_parameter(message: &str, edge_id: &str) -> Self {
        Self::new(400, message, None, edge_id)
    }
}

/// Keeps the text before the first colon, which never carries identifiers.
pub fn summarize(text: &str) -> &str {
    text.split(':').next().unwrap_or_default().trim_end()
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
