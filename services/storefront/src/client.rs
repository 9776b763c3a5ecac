//! services/storefront/src/client.rs
//!
//! The authenticated API client. It attaches the stored bearer token to every
//! request and transparently renews it once when the server answers 401.

use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use storefront_core::domain::TokenGrant;
use storefront_core::ports::{
    ApiRequest, ApiResponse, HttpTransport, Navigator, PortError, PortResult, Route, TokenStore,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const REFRESH_PATH: &str = "/auth/refresh/";

/// What a refresh attempt produced.
enum Renewal {
    Fresh(String),
    /// A concurrent request already cleared the session.
    SessionGone,
}

pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    /// Serializes token renewal so concurrent 401s share one refresh call.
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            tokens,
            navigator,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Sends without a bearer token and without the refresh path.
    pub async fn send_anonymous(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        self.transport.send(request.with_bearer(None)).await
    }

    /// Sends with the stored bearer token. A 401 triggers at most one refresh
    /// and one retry of the identical request.
    pub async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        let credentials = self.tokens.load().await?;
        let used_access = credentials.access.clone();

        let response = self
            .transport
            .send(request.clone().with_bearer(used_access.clone()))
            .await?;
        if response.status != 401 {
            return Ok(response);
        }
        if credentials.refresh.is_none() {
            debug!(path = %request.path, "Unauthorized and no refresh token stored");
            return Ok(response);
        }

        let access = match self.renew_access(used_access.as_deref()).await {
            Ok(Renewal::Fresh(access)) => access,
            Ok(Renewal::SessionGone) => return Err(PortError::Unauthorized),
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.expire_session().await;
                return Err(PortError::Unauthorized);
            }
        };

        let path = request.path.clone();
        let retried = self.transport.send(request.with_bearer(Some(access))).await?;
        if retried.status == 401 {
            warn!(%path, "Still unauthorized after a token refresh");
            self.expire_session().await;
            return Err(PortError::Unauthorized);
        }
        Ok(retried)
    }

    /// [`Self::send`], with non-2xx statuses mapped to errors.
    pub async fn execute(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        self.send(request).await?.into_result()
    }

    /// [`Self::execute`], decoding the JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> PortResult<T> {
        self.execute(request).await?.json()
    }

    async fn renew_access(&self, stale: Option<&str>) -> PortResult<Renewal> {
        let _gate = self.refresh_gate.lock().await;

        let mut credentials = self.tokens.load().await?;
        match (&credentials.access, &credentials.refresh) {
            (Some(current), _) if Some(current.as_str()) != stale => {
                debug!("Reusing a token renewed by a concurrent request");
                return Ok(Renewal::Fresh(current.clone()));
            }
            (None, None) => return Ok(Renewal::SessionGone),
            _ => {}
        }
        let refresh = credentials.refresh.clone().ok_or(PortError::Unauthorized)?;

        let request = ApiRequest::post(REFRESH_PATH).with_json(&json!({ "refresh": refresh }))?;
        let grant: TokenGrant = self.send_anonymous(request).await?.into_result()?.json()?;

        credentials.apply_grant(&grant);
        self.tokens.save(&credentials).await?;
        info!("Access token refreshed");
        Ok(Renewal::Fresh(grant.access))
    }

    async fn expire_session(&self) {
        if let Err(e) = self.tokens.clear().await {
            error!("Failed to clear stored credentials: {}", e);
        }
        self.navigator.navigate(Route::Login);
    }
}
