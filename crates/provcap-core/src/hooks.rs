//! Request editors applied before a request reaches the transport.

use crate::http_client::HttpRequest;
use crate::query::{build_query, QueryError};

pub const IDENTITY_HEADER: &str = "x-rh-identity";
pub const EDGE_REQUEST_ID_HEADER: &str = "x-rh-edge-request-id";

/// Mutates an outgoing request. A failing editor aborts the call before any
/// network traffic.
pub trait RequestEditor: Send + Sync {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), QueryError>;
}

/// Forwards the caller's base64 identity document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHeader(pub String);

impl RequestEditor for IdentityHeader {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), QueryError> {
        request.set_header(IDENTITY_HEADER, self.0.as_str());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRequestId(pub String);

impl RequestEditor for EdgeRequestId {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), QueryError> {
        request.set_header(EDGE_REQUEST_ID_HEADER, self.0.as_str());
        Ok(())
    }
}

/// Replaces the query string with an alternating key/value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams(Vec<String>);

impl QueryParams {
    pub fn new<I, S>(keys_and_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys_and_values.into_iter().map(Into::into).collect())
    }
}

impl RequestEditor for QueryParams {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), QueryError> {
        request.query = Some(build_query(&self.0)?);
        Ok(())
    }
}

/// Applies editors in order, stopping at the first failure.
pub fn apply_editors(
    request: &mut HttpRequest,
    editors: &[&dyn RequestEditor],
) -> Result<(), QueryError> {
    editors.iter().try_for_each(|editor| editor.edit(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editors_set_identity_and_edge_headers() {
        let mut request = HttpRequest::get("https://sources.test/api/sources");
        let identity = IdentityHeader(String::from("eyJpZGVudGl0eSI6e319"));
        let edge = EdgeRequestId(String::from("edge-1"));

        apply_editors(&mut request, &[&identity, &edge]).expect("editors succeed");

        assert_eq!(
            request.headers.get(IDENTITY_HEADER).map(String::as_str),
            Some("eyJpZGVudGl0eSI6e319")
        );
        assert_eq!(
            request.headers.get(EDGE_REQUEST_ID_HEADER).map(String::as_str),
            Some("edge-1")
        );
    }

    #[test]
    fn query_editor_replaces_raw_query() {
        let mut request = HttpRequest::get("https://sources.test/api/sources");
        request.query = Some(String::from("stale=1"));

        apply_editors(&mut request, &[&QueryParams::new(["a", "1", "b", "2"])])
            .expect("even list");

        assert_eq!(request.query.as_deref(), Some("a=1&b=2"));
    }

    #[test]
    fn odd_query_stops_later_editors() {
        let mut request = HttpRequest::get("https://sources.test/api/sources");
        let odd = QueryParams::new(["only-key"]);
        let edge = EdgeRequestId(String::from("edge-2"));

        let error = apply_editors(&mut request, &[&odd, &edge]).expect_err("odd list");

        assert_eq!(error, QueryError::NotEven { len: 1 });
        assert!(request.headers.is_empty());
    }
}
