//! REST transport seam
//!
//! `FilterManager` talks to the Go Botany API only through the [`Transport`]
//! trait. [`HttpTransport`] is the reqwest-backed implementation; tests plug
//! in their own.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::config::ClientConfig;
use crate::error::ClientError;

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// QUERY PARAMS
// ============================================================================

/// Ordered query parameters. Array values are sent as repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn push_all<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        for value in values {
            self.0.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// JSON-over-HTTP GET access to the Go Botany resources
///
/// `path` is relative to the transport's base URL and already includes the
/// configured resource roots (see [`crate::config::Endpoints`]).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, ClientError>;
}

// ============================================================================
// HTTP TRANSPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("gobotany-rs/{}", CURRENT_VERSION))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!(base_url = %base_url, "HTTP transport initialized");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.url(path);
        tracing::trace!(url = %url, params = ?params, "GET");

        let resp = self
            .client
            .get(&url)
            .query(params.as_slice())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: resp.status(),
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::decode(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_preserve_order() {
        let mut params = QueryParams::new();
        params.push("pile", "woody-plants").push("height", "10-20");
        assert_eq!(
            params.as_slice(),
            &[
                ("pile".to_string(), "woody-plants".to_string()),
                ("height".to_string(), "10-20".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_repeated_keys() {
        let mut params = QueryParams::new();
        params.push_all("species_id", [3u64, 1, 2]);
        assert_eq!(params.get_all("species_id"), vec!["3", "1", "2"]);
        assert_eq!(params.get("species_id"), Some("3"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_query_params_push_all_empty() {
        let mut params = QueryParams::new();
        params.push_all("exclude", Vec::<String>::new());
        assert!(params.is_empty());
        assert_eq!(params.get("exclude"), None);
    }

    #[test]
    fn test_http_transport_url_join() {
        let config = ClientConfig::new("http://localhost:8000/").unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000");
        assert_eq!(transport.url("/taxon/"), "http://localhost:8000/taxon/");
    }
}
