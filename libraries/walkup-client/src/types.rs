//! Request, response and configuration types for the provider client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use walkup_core::{Result, WalkupError};

/// Default provider Web API root.
pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1/";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the rate-limited provider client.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Web API root; relative request paths are joined onto it
    pub base_url: String,
    /// Dispatch budget, retries included
    pub max_requests_per_second: u32,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added to each backoff
    pub max_jitter_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_requests_per_second: 5,
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            max_jitter_ms: 250,
            request_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at `base_url` with default limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Minimum spacing between two dispatches, rounded up so `N` dispatches
    /// never fit in less than `(N - 1) / rate` seconds.
    pub fn min_interval(&self) -> Duration {
        let rate = u64::from(self.max_requests_per_second.max(1));
        Duration::from_nanos(1_000_000_000_u64.div_ceil(rate))
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check the config before any client is built.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(WalkupError::validation("base_url cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(WalkupError::validation(
                "base_url must start with http:// or https://",
            ));
        }
        if self.max_requests_per_second == 0 || self.max_requests_per_second > 1000 {
            return Err(WalkupError::validation(format!(
                "max_requests_per_second must be within 1..=1000, got {}",
                self.max_requests_per_second
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(WalkupError::validation(format!(
                "base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(WalkupError::validation("request_timeout_ms must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// Requests
// =============================================================================

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A provider API request, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Filled in by the client right before each dispatch
    pub bearer_token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer_token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

// =============================================================================
// Responses
// =============================================================================

/// A raw provider response, any status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            WalkupError::parse(format!("Failed to parse response ({}): {}", self.status, e))
        })
    }
}
