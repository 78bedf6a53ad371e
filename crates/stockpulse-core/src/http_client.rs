use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const API_KEY_PARAM: &str = "apikey";
const REDACTED: &str = "REDACTED";

/// GET request against the upstream query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Full URL, percent-encoded, with the `apikey` value masked. For logs.
    pub fn redacted_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                let value = if name.eq_ignore_ascii_case(API_KEY_PARAM) {
                    Cow::Borrowed(REDACTED)
                } else {
                    urlencoding::encode(value)
                };
                format!("{}={value}", urlencoding::encode(name))
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.url)
    }
}

/// Status and raw body of a completed exchange.
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

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// How the transport failed before a response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// The attempt ran past its timeout or the connection was aborted.
    Timeout,
    /// No response at all: DNS failure, refused or reset connection.
    Connect,
    Other,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Other, message)
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport used by the endpoint client. One call is one attempt; retries
/// live above this layer.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production HTTP client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("stockpulse/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&request.url)
                .query(&request.query)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(map_reqwest_error)?;

            Ok(HttpResponse { status, body })
        })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> HttpError {
    // Drop the URL: it carries the API key.
    let error = error.without_url();
    if error.is_timeout() {
        HttpError::timeout(format!("request timed out: {error}"))
    } else if error.is_connect() {
        HttpError::connect(format!("connection failed: {error}"))
    } else {
        HttpError::other(format!("request failed: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_url_encodes_query_values() {
        let request = HttpRequest::get("https://example.test/query")
            .with_query("function", "SYMBOL_SEARCH")
            .with_query("keywords", "tesla & co");

        assert_eq!(
            request.redacted_url(),
            "https://example.test/query?function=SYMBOL_SEARCH&keywords=tesla%20%26%20co"
        );
    }

    #[test]
    fn redacted_url_appends_to_existing_query_string() {
        let request = HttpRequest::get("https://example.test/query?datatype=json")
            .with_query("function", "MARKET_STATUS");

        assert_eq!(
            request.redacted_url(),
            "https://example.test/query?datatype=json&function=MARKET_STATUS"
        );
    }

    #[test]
    fn redacted_url_masks_only_the_api_key() {
        let request = HttpRequest::get("https://example.test/query")
            .with_query("function", "GLOBAL_QUOTE")
            .with_query("symbol", "600104.SHH")
            .with_query("apikey", "SECRET123");

        let url = request.redacted_url();
        assert_eq!(
            url,
            "https://example.test/query?function=GLOBAL_QUOTE&symbol=600104.SHH&apikey=REDACTED"
        );
        assert!(!url.contains("SECRET123"));
    }

    #[test]
    fn query_value_finds_named_parameter() {
        let request = HttpRequest::get("https://example.test/query")
            .with_query("function", "OVERVIEW")
            .with_query("symbol", "AAPL");

        assert_eq!(request.query_value("symbol"), Some("AAPL"));
        assert_eq!(request.query_value("interval"), None);
    }

    #[test]
    fn only_2xx_is_success() {
        assert!(HttpResponse::ok_json("{}").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
        assert!(!HttpResponse::new(503, "").is_success());
    }
}
