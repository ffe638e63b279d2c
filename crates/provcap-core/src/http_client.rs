use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::RetryConfig;

const USER_AGENT: &str = concat!("provcap/", env!("CARGO_PKG_VERSION"));

/// Sources is read-only for provisioning, so only `GET` is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

/// Outgoing request. Request editors may change headers and the query string
/// before the transport sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Raw, already escaped query string without the leading `?`.
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: None,
            headers: BTreeMap::new(),
            timeout_ms: 5_000,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// URL including the query string, as sent on the wire.
    pub fn full_url(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{}?{query}", self.url),
            _ => self.url.clone(),
        }
    }
}

/// Status and body returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure (no HTTP status was obtained).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Transport contract. Retries, if any, happen behind this boundary.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
    retry: RetryConfig,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(USER_AGENT)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
            retry: RetryConfig::default(),
        }
    }

    /// Routes every request through the given HTTP(S) proxy.
    pub fn with_proxy(proxy_url: &str) -> Result<Self, HttpError> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| HttpError::non_retryable(format!("invalid proxy url: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .proxy(proxy)
            .build()
            .map_err(|e| HttpError::non_retryable(format!("cannot build http client: {e}")))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = request.full_url();
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = builder.timeout(Duration::from_millis(request.timeout_ms));

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::new(format!("request timeout: {e}"))
            } else if e.is_connect() {
                HttpError::new(format!("connection failed: {e}"))
            } else {
                HttpError::non_retryable(format!("request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                let outcome = self.send_once(&request).await;
                let retry = match &outcome {
                    Ok(response) => self.retry.should_retry_status(response.status),
                    Err(error) => self.retry.should_retry_error(error),
                };
                if !retry || attempt >= self.retry.max_retries() {
                    return outcome;
                }

                let delay = self.retry.delay_for_attempt(attempt);
                tracing::debug!(
                    url = %request.url,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying upstream request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_lowercased() {
        let request = HttpRequest::get("https://sources.test/api")
            .with_header("X-RH-Identity", "abc");

        assert_eq!(
            request.headers.get("x-rh-identity").map(String::as_str),
            Some("abc")
        );
    }

    #[test]
    fn full_url_appends_query_only_when_present() {
        let mut request = HttpRequest::get("https://sources.test/api/sources");
        assert_eq!(request.full_url(), "https://sources.test/api/sources");

        request.query = Some(String::new());
        assert_eq!(request.full_url(), "https://sources.test/api/sources");

        request.query = Some(String::from("a=1&b=2"));
        assert_eq!(request.full_url(), "https://sources.test/api/sources?a=1&b=2");
    }

    #[test]
    fn success_range_is_2xx_only() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }
}
