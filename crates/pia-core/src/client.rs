//! Thin JSON-over-HTTP client shared by every component.
//!
//! One `request` entry point; every failure is normalized into [`ConsoleError`].
//! No retries.

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub use reqwest::Method;

#[derive(Debug, Clone)]
pub struct ResourceClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ResourceClient {
    pub fn new(base_url: &str) -> ConsoleResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ConsoleResult<Self> {
        let trimmed = base_url.trim();
        // Url::join drops the last path segment unless it ends with '/'.
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ConsoleError::Config(format!("invalid base URL '{}': {}", trimmed, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConsoleError::Config(format!(
                "invalid base URL '{}': scheme must be http or https",
                trimmed
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::Config(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `path`, relative to the base URL. Absolute inputs pass through.
    pub fn resolve(&self, path: &str) -> ConsoleResult<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| ConsoleError::input(e.to_string()));
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ConsoleError::input(format!("invalid path '{}': {}", path, e)))
    }

    /// Issue one request and return the decoded JSON body (`Null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ConsoleResult<Value> {
        let url = self.resolve(path)?;
        let mut builder = self.http.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ConsoleError::Network(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConsoleError::Network(e.to_string()))?;
        tracing::debug!(%method, path, status = status.as_u16(), bytes = bytes.len(), "request completed");

        if !status.is_success() {
            return Err(http_error(status.as_u16(), &bytes));
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ConsoleError::Decode(e.to_string()))
    }

    pub async fn get(&self, path: &str) -> ConsoleResult<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> ConsoleResult<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> ConsoleResult<Value> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ConsoleResult<Value> {
        self.request(Method::DELETE, path, None).await
    }
}

/// Decode a response body into a typed shape; mismatches are [`ConsoleError::Decode`].
pub fn decode<T: DeserializeOwned>(value: Value) -> ConsoleResult<T> {
    serde_json::from_value(value).map_err(|e| ConsoleError::Decode(e.to_string()))
}

/// Error for a non-2xx response: the body's `error` string, else a generic status message.
pub fn http_error(status: u16, body: &[u8]) -> ConsoleError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP status {}", status));
    ConsoleError::Http { status, message }
}

/// The two backends the console talks to.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Prompts, curricula and simulation runs.
    pub pes: ResourceClient,
    /// Cognitive module services.
    pub cml: ResourceClient,
}

impl Backends {
    pub fn from_config(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let timeout = config.request_timeout();
        Ok(Self {
            pes: ResourceClient::with_timeout(&config.api_base_url, timeout)?,
            cml: ResourceClient::with_timeout(&config.cml_base_url, timeout)?,
        })
    }
}
