//! services/storefront/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, which is the concrete implementation
//! of the `HttpTransport` port from the `core` crate. It handles all traffic
//! to the storefront REST API using `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use storefront_core::ports::{ApiRequest, ApiResponse, HttpTransport, Method, PortError, PortResult};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `HttpTransport` port with a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport` rooted at `base_url` (e.g. `http://host/api`).
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url_for(&self, request: &ApiRequest) -> PortResult<Url> {
        let raw = format!("{}{}", self.base_url, request.path);
        let url = if request.query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, &request.query)
        };
        url.map_err(|e| PortError::Unexpected(format!("Invalid URL '{}': {}", raw, e)))
    }
}

//=========================================================================================
// `HttpTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        let url = self.url_for(&request)?;
        debug!(method = request.method.as_str(), %url, "Sending API request");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        debug!(status, bytes = body.len(), "Received API response");
        Ok(ApiResponse::new(status, body))
    }
}
