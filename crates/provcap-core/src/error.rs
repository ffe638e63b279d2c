//! Error classification for upstream calls.
//!
//! Failures are classified in two tiers. [`classify`] turns an HTTP status
//! into a [`ClientError`] carrying a generic [`StatusClass`]. Call sites then
//! wrap it into a [`CapabilityError`] whose [`ErrorKind`] names the situation
//! precisely (a `NotFound` seen while listing sources becomes
//! `SourceNotFound`), keeping the lower-tier error as the cause.
//!
//! ```rust
//! use provcap_core::error::{classify, CapabilityError, ErrorKind, StatusClass};
//!
//! let client_error = classify(404, None).expect_err("404 is not a success");
//! assert_eq!(client_error.class(), StatusClass::NotFound);
//!
//! let error = CapabilityError::from_status("list sources", client_error)
//!     .refine(ErrorKind::SourceNotFound, "source not found");
//! assert_eq!(error.kind(), ErrorKind::SourceNotFound);
//! assert!(error.is_not_found());
//! assert_eq!(error.status_class(), Some(StatusClass::NotFound));
//! ```

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::cache::CacheError;
use crate::http_client::HttpError;
use crate::query::QueryError;

const MAX_DETAIL_CHARS: usize = 256;

/// Generic classification of a non-2xx HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    NotFound,
    Unauthorized,
    Forbidden,
    Non2xx,
}

impl StatusClass {
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::Non2xx,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Non2xx => "non-2xx response",
        }
    }
}

impl Display for StatusClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-tier error produced by [`classify`] for a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("service returned {class} (status {status})")]
pub struct ClientError {
    class: StatusClass,
    status: u16,
    detail: Option<String>,
}

impl ClientError {
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self {
            class: StatusClass::from_status(status),
            status,
            detail,
        }
    }

    pub const fn class(&self) -> StatusClass {
        self.class
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Truncated response body, if the upstream sent one.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.class == StatusClass::NotFound
    }

    pub fn is_unauthorized(&self) -> bool {
        self.class == StatusClass::Unauthorized
    }

    pub fn is_forbidden(&self) -> bool {
        self.class == StatusClass::Forbidden
    }

    pub fn is_generic_non2xx(&self) -> bool {
        self.class == StatusClass::Non2xx
    }
}

/// Classifies an HTTP status. 2xx is `Ok`, everything else a [`ClientError`].
pub fn classify(status: u16, body: Option<&str>) -> Result<(), ClientError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let detail = body
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.chars().take(MAX_DETAIL_CHARS).collect::<String>());

    Err(ClientError::new(status, detail))
}

/// Caller-input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid provider '{value}', expected one of aws, azure, gcp")]
    InvalidProvider { value: String },
    #[error("region parameter is missing")]
    MissingRegion,
    #[error("parameter 'supported' could not be parsed: '{value}'")]
    InvalidSupportedFlag { value: String },
    #[error("source id cannot be empty")]
    EmptySourceId,
}

/// Domain error kinds crossing the subsystem boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ApplicationTypeNotFound,
    SourceNotFound,
    AuthenticationForSourceNotFound,
    MissingProvisioningAuthentication,
    UnknownAuthenticationType,
    NotFound,
    Unauthorized,
    Forbidden,
    Non2xxResponse,
    InvalidRequest,
    /// Wrapped transport, decode, cache and cancellation failures.
    Internal,
}

impl ErrorKind {
    pub const fn from_status_class(class: StatusClass) -> Self {
        match class {
            StatusClass::NotFound => Self::NotFound,
            StatusClass::Unauthorized => Self::Unauthorized,
            StatusClass::Forbidden => Self::Forbidden,
            StatusClass::Non2xx => Self::Non2xxResponse,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::ApplicationTypeNotFound => "sources.application_type_not_found",
            Self::SourceNotFound => "sources.source_not_found",
            Self::AuthenticationForSourceNotFound => "sources.authentication_not_found",
            Self::MissingProvisioningAuthentication => "sources.missing_provisioning_authentication",
            Self::UnknownAuthenticationType => "sources.unknown_authentication_type",
            Self::NotFound => "client.not_found",
            Self::Unauthorized => "client.unauthorized",
            Self::Forbidden => "client.forbidden",
            Self::Non2xxResponse => "client.non_2xx_response",
            Self::InvalidRequest => "client.invalid_request",
            Self::Internal => "client.internal",
        }
    }

    /// True for every not-found flavour except a source lacking credentials.
    pub const fn is_not_found(self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::SourceNotFound
                | Self::ApplicationTypeNotFound
                | Self::AuthenticationForSourceNotFound
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Underlying failure carried by a [`CapabilityError`].
#[derive(Debug, Error)]
pub enum ErrorCause {
    #[error(transparent)]
    Status(#[from] ClientError),
    #[error("transport error")]
    Transport(#[from] HttpError),
    #[error("malformed upstream payload")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request cancelled")]
    Cancelled,
}

/// Structured error returned by every resolver and the aggregator.
#[derive(Debug)]
pub struct CapabilityError {
    kind: ErrorKind,
    operation: String,
    message: String,
    cause: Option<ErrorCause>,
}

impl CapabilityError {
    pub fn new(kind: ErrorKind, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation: operation.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<ErrorCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// First-tier wrap of a classified status.
    pub fn from_status(operation: impl Into<String>, error: ClientError) -> Self {
        let kind = ErrorKind::from_status_class(error.class());
        let message = format!("service returned {}", error.class());
        Self::new(kind, operation, message).with_cause(error)
    }

    pub fn transport(operation: impl Into<String>, error: HttpError) -> Self {
        Self::new(ErrorKind::Internal, operation, "upstream request failed").with_cause(error)
    }

    pub fn decode(operation: impl Into<String>, error: serde_json::Error) -> Self {
        Self::new(ErrorKind::Internal, operation, "could not decode upstream response")
            .with_cause(error)
    }

    pub fn cache(operation: impl Into<String>, error: CacheError) -> Self {
        Self::new(ErrorKind::Internal, operation, "cache access failed").with_cause(error)
    }

    pub fn query(operation: impl Into<String>, error: QueryError) -> Self {
        Self::new(ErrorKind::InvalidRequest, operation, "could not build query").with_cause(error)
    }

    pub fn invalid_request(operation: impl Into<String>, error: ValidationError) -> Self {
        Self::new(ErrorKind::InvalidRequest, operation, error.to_string()).with_cause(error)
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, operation, "request cancelled").with_cause(ErrorCause::Cancelled)
    }

    /// Re-wraps into a call-site specific kind, keeping the cause.
    pub fn refine(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.kind = kind;
        self.message = message.into();
        self
    }

    /// Prefixes the operation with an outer call name.
    pub fn context(mut self, outer: &str) -> Self {
        self.operation = format!("{outer}: {}", self.operation);
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Lower-tier classification when the failure came from an HTTP status.
    pub fn status_class(&self) -> Option<StatusClass> {
        match &self.cause {
            Some(ErrorCause::Status(error)) => Some(error.class()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind.is_not_found()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
            || self.status_class() == Some(StatusClass::Unauthorized)
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == ErrorKind::Forbidden || self.status_class() == Some(StatusClass::Forbidden)
    }

    pub fn is_generic_non2xx(&self) -> bool {
        self.kind == ErrorKind::Non2xxResponse
            || self.status_class() == Some(StatusClass::Non2xx)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, Some(ErrorCause::Cancelled))
    }
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.operation, self.message, self.code())
    }
}

impl std::error::Error for CapabilityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_fixed_classes() {
        assert_eq!(classify(200, None), Ok(()));
        assert_eq!(classify(204, Some("")), Ok(()));

        let cases = [
            (401, StatusClass::Unauthorized),
            (403, StatusClass::Forbidden),
            (404, StatusClass::NotFound),
            (400, StatusClass::Non2xx),
            (500, StatusClass::Non2xx),
            (302, StatusClass::Non2xx),
        ];
        for (status, expected) in cases {
            let error = classify(status, None).expect_err("non-2xx must fail");
            assert_eq!(error.class(), expected, "status {status}");
            assert_eq!(error.status(), status);
        }
    }

    #[test]
    fn predicates_match_only_their_class() {
        let not_found = classify(404, None).expect_err("404");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_unauthorized());
        assert!(!not_found.is_forbidden());
        assert!(!not_found.is_generic_non2xx());

        let unavailable = classify(503, None).expect_err("503");
        assert!(unavailable.is_generic_non2xx());
        assert!(!unavailable.is_not_found());
    }

    #[test]
    fn body_detail_is_trimmed_and_truncated() {
        let long_body = "x".repeat(1_000);
        let error = classify(500, Some(&long_body)).expect_err("500");
        assert_eq!(error.detail().map(str::len), Some(MAX_DETAIL_CHARS));

        let blank = classify(500, Some("   ")).expect_err("500");
        assert_eq!(blank.detail(), None);
    }

    #[test]
    fn refine_keeps_lower_tier_cause() {
        let error = CapabilityError::from_status("get source authentication call", ClientError::new(404, None))
            .refine(ErrorKind::AuthenticationForSourceNotFound, "authentication for source not found");

        assert_eq!(error.kind(), ErrorKind::AuthenticationForSourceNotFound);
        assert_eq!(error.status_class(), Some(StatusClass::NotFound));
        assert!(error.is_not_found());
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn missing_provisioning_authentication_is_not_a_generic_not_found() {
        let error = CapabilityError::new(
            ErrorKind::MissingProvisioningAuthentication,
            "get source authentication",
            "source has no provisioning authentication",
        );

        assert!(!error.is_not_found());
        assert_ne!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn context_prefixes_operation_without_touching_kind() {
        let error = CapabilityError::from_status("load app ID call", ClientError::new(401, None))
            .context("list provisioning sources");

        assert_eq!(error.operation(), "list provisioning sources: load app ID call");
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
        assert!(error.is_unauthorized());
        assert!(error
            .to_string()
            .starts_with("list provisioning sources: load app ID call:"));
    }

    #[test]
    fn cancelled_is_internal_with_cancelled_cause() {
        let error = CapabilityError::cancelled("list sources");
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert!(error.is_cancelled());
        assert_eq!(error.status_class(), None);
    }
}
