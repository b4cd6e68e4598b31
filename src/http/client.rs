//! Low-level HTTP client — `MyFundHttp`.
//!
//! One call per refresh, no retries. The server labels its JSON with a wrong
//! content type, so the body is always read as text and parsed here.

use crate::config::Credentials;
use crate::domain::portfolio::wire::ResponseEnvelope;
use crate::error::ApiError;
use crate::network::{DEFAULT_API_URL, REQUEST_TIMEOUT, RESPONSE_FORMAT};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing;

/// Longest body prefix written to debug logs.
const LOG_BODY_CHARS: usize = 200;

/// Anything that can fetch one portfolio response.
///
/// `MyFundHttp` is the real implementation; the coordinator only sees this
/// trait.
#[async_trait]
pub trait PortfolioSource: Send + Sync + 'static {
    async fn fetch_portfolio(&self, credentials: &Credentials) -> Result<Value, ApiError>;
}

/// HTTP client for the MyFund `getPortfel` endpoint.
pub struct MyFundHttp {
    base_url: String,
    client: Client,
}

impl MyFundHttp {
    pub fn builder() -> MyFundHttpBuilder {
        MyFundHttpBuilder::default()
    }

    /// Client for the public endpoint with the default 10 s timeout.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request URL with percent-encoded credentials.
    pub fn portfolio_url(&self, credentials: &Credentials) -> String {
        format!(
            "{}?portfel={}&apiKey={}&format={}",
            self.base_url,
            urlencoding::encode(&credentials.wallet_name),
            urlencoding::encode(&credentials.api_key),
            RESPONSE_FORMAT
        )
    }

    /// Fetch and parse the portfolio for one wallet.
    pub async fn get_portfolio(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        let url = self.portfolio_url(credentials);
        tracing::debug!(
            wallet = %credentials.wallet_name,
            "Requesting portfolio from {}",
            self.base_url
        );

        let resp = self.client.get(&url).send().await.map_err(classify)?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = resp.text().await.map_err(classify)?;

        tracing::debug!(
            status = status.as_u16(),
            content_type = %content_type,
            "Received response: {}",
            truncate(&text, LOG_BODY_CHARS)
        );

        let body = parse_portfolio_body(&text)?;
        tracing::debug!(wallet = %credentials.wallet_name, "Parsed portfolio response");
        Ok(body)
    }
}

#[async_trait]
impl PortfolioSource for MyFundHttp {
    async fn fetch_portfolio(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        self.get_portfolio(credentials).await
    }
}

impl Clone for MyFundHttp {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
        }
    }
}

/// Parse a response body and check the embedded status.
///
/// Returns the parsed JSON verbatim when the server did not reject the call.
pub fn parse_portfolio_body(text: &str) -> Result<Value, ApiError> {
    let body: Value = serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to parse JSON response: {}", e);
        ApiError::MalformedResponse(e)
    })?;

    let envelope = ResponseEnvelope::deserialize(&body).map_err(|e| {
        tracing::error!("Unexpected response shape: {}", e);
        ApiError::MalformedResponse(e)
    })?;

    if let Some(status) = envelope.status.filter(|s| s.is_rejected()) {
        let text = status.text.unwrap_or_default();
        tracing::error!("API returned error: {}", text);
        return Err(ApiError::Rejected { text });
    }

    Ok(body)
}

fn classify(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct MyFundHttpBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for MyFundHttpBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl MyFundHttpBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Bound on connect plus full body read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<MyFundHttp, ApiError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()?;

        Ok(MyFundHttp {
            base_url: self.base_url.trim_end_matches(['/', '?']).to_string(),
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_portfolio_url_encodes_credentials() {
        let http = MyFundHttp::new().unwrap();
        let url = http.portfolio_url(&Credentials::new("Mój portfel", "a&b=c"));
        assert_eq!(
            url,
            "https://myfund.pl/API/v1/getPortfel.php?portfel=M%C3%B3j%20portfel&apiKey=a%26b%3Dc&format=json"
        );
    }

    #[test]
    fn test_builder_trims_base_url() {
        let http = MyFundHttp::builder()
            .base_url("http://127.0.0.1:8080/api/")
            .build()
            .unwrap();
        assert_eq!(http.base_url(), "http://127.0.0.1:8080/api");
    }

    #[test]
    fn test_parse_body_ok_verbatim() {
        let text = r#"{"status":{"code":"0","text":"OK"},"portfel":{"wartosc":100,"zmianaW":"+1.0"}}"#;
        let body = parse_portfolio_body(text).unwrap();
        assert_eq!(
            body,
            json!({"status":{"code":"0","text":"OK"},"portfel":{"wartosc":100,"zmianaW":"+1.0"}})
        );
    }

    #[test]
    fn test_parse_body_rejected() {
        let err = parse_portfolio_body(r#"{"status":{"code":"1","text":"bad key"}}"#).unwrap_err();
        match err {
            ApiError::Rejected { text } => assert_eq!(text, "bad key"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_body_boolean_status_code_is_success() {
        let body = parse_portfolio_body(r#"{"status":{"code":true},"portfel":{"wartosc":5}}"#).unwrap();
        assert_eq!(body["portfel"]["wartosc"], 5);
    }

    #[test]
    fn test_parse_body_malformed() {
        assert!(matches!(
            parse_portfolio_body(r#"{"status":{"code":"0"},"portf"#),
            Err(ApiError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_portfolio_body("<html>Service Unavailable</html>"),
            Err(ApiError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_portfolio_body("[1, 2, 3]"),
            Err(ApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("zażółć", 3), "zaż");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
