//! Per-request dependencies passed explicitly into every resolver call.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::CapabilityError;
use crate::hooks::{EdgeRequestId, IdentityHeader};

/// Identity, request id and cancellation for one caller request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Option<IdentityHeader>,
    edge_request_id: EdgeRequestId,
    cancellation: CancellationToken,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            identity: None,
            edge_request_id: EdgeRequestId(uuid::Uuid::new_v4().to_string()),
            cancellation: CancellationToken::new(),
        }
    }
}

impl RequestContext {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(IdentityHeader(identity.into())),
            ..Self::default()
        }
    }

    pub fn with_edge_request_id(mut self, edge_request_id: impl Into<String>) -> Self {
        self.edge_request_id = EdgeRequestId(edge_request_id.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn identity(&self) -> Option<&IdentityHeader> {
        self.identity.as_ref()
    }

    pub fn edge_request_id(&self) -> &str {
        &self.edge_request_id.0
    }

    pub(crate) fn edge_request_id_editor(&self) -> &EdgeRequestId {
        &self.edge_request_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Runs `future` unless the request is cancelled first.
    pub async fn run<F, T>(&self, operation: &str, future: F) -> Result<T, CapabilityError>
    where
        F: Future<Output = Result<T, CapabilityError>>,
    {
        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => {
                tracing::debug!(operation, edge_request_id = self.edge_request_id(), "request cancelled");
                Err(CapabilityError::cancelled(operation))
            }
            result = future => result,
        }
    }
}
