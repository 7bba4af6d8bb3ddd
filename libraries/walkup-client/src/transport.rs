//! HTTP transport underneath the rate-limited client.

use crate::error::from_reqwest;
use crate::types::{ApiRequest, ApiResponse, ClientConfig, Method};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;
use walkup_core::{Result, WalkupError};

/// Sends one request and returns whatever the provider answered.
///
/// Any HTTP status is `Ok`; `Err` means no response arrived at all.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        (**self).send(request).await
    }
}

/// `HttpTransport` backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        // Url::join drops the last segment unless the base ends in '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| WalkupError::validation(format!("Invalid base_url: {}", e)))?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Walkup/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| from_reqwest(&e))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| WalkupError::validation(format!("Invalid request path {}: {}", path, e)))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path)?;
        debug!(method = request.method.as_str(), url = %url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(body) => builder.json(body),
            // The Web API wants an explicit empty body on bodiless PUT/POST
            None if matches!(request.method, Method::Put | Method::Post) => {
                builder.header(reqwest::header::CONTENT_LENGTH, "0")
            }
            None => builder,
        };

        let response = builder.send().await.map_err(|e| from_reqwest(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| from_reqwest(&e))?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
