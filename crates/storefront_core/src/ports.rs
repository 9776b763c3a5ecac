//! crates/storefront_core/src/ports.rs
//!
//! Defines the service contracts (traits) the storefront client is built on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! cart, session and checkout logic independent of the HTTP stack, the token
//! storage medium, the navigation surface and the hosted payment widget.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::Credentials;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Server rejected the request with status {status}")]
    Rejected { status: u16, body: String },
    #[error("Could not decode the response: {0}")]
    Decode(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// HTTP Request / Response
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A request relative to the API base URL (`path` starts with `/`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> PortResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A raw response: status code plus the unparsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> PortResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| PortError::Decode(e.to_string()))
    }

    /// Maps non-2xx statuses onto [`PortError`].
    pub fn into_result(self) -> PortResult<Self> {
        match self.status {
            status if (200..300).contains(&status) => Ok(self),
            401 => Err(PortError::Unauthorized),
            404 => Err(PortError::NotFound(self.text())),
            status => Err(PortError::Rejected {
                status,
                body: self.text(),
            }),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request exactly as given. Never retries.
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored credentials, or empty ones when nothing is stored.
    async fn load(&self) -> PortResult<Credentials>;

    async fn save(&self, credentials: &Credentials) -> PortResult<()>;

    async fn clear(&self) -> PortResult<()>;
}

/// Screens the client can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Orders,
    Products,
    Cart,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Orders => "/orders",
            Route::Products => "/products",
            Route::Cart => "/cart",
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Everything the hosted card widget needs to open.
#[derive(Debug, Clone, PartialEq)]
pub struct CardCheckout {
    pub public_key: String,
    pub title: String,
    pub currency: String,
    /// Amount in minor currency units.
    pub amount_minor: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetOutcome {
    /// An opaque single-use card token.
    Token(String),
    Declined { user_message: Option<String> },
}

#[async_trait]
pub trait PaymentWidget: Send + Sync {
    /// Opens the widget and waits for the shopper to finish with it.
    async fn collect_token(&self, checkout: &CardCheckout) -> PortResult<WidgetOutcome>;
}
