//! services/storefront/src/api/auth.rs
//!
//! Authentication endpoints. Login and registration go out without a bearer
//! token and bypass the refresh path.

use serde::Deserialize;
use serde_json::json;
use storefront_core::domain::{ClientRegistration, LoginGrant, User};
use storefront_core::ports::{ApiRequest, PortResult};

use super::StorefrontApi;

/// `/auth/me/` answers with either `{ "user": {...} }` or the bare profile.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl StorefrontApi {
    pub async fn login(&self, username: &str, password: &str) -> PortResult<LoginGrant> {
        let request = ApiRequest::post("/auth/login/")
            .with_json(&json!({ "username": username, "password": password }))?;
        self.client()
            .send_anonymous(request)
            .await?
            .into_result()?
            .json()
    }

    /// Blacklists the refresh token server-side.
    pub async fn logout(&self, refresh: &str) -> PortResult<()> {
        let request = ApiRequest::post("/auth/logout/").with_json(&json!({ "refresh": refresh }))?;
        self.client().execute(request).await?;
        Ok(())
    }

    pub async fn me(&self) -> PortResult<User> {
        let response: MeResponse = self.get("/auth/me/").await?;
        Ok(match response {
            MeResponse::Wrapped { user } => user,
            MeResponse::Bare(user) => user,
        })
    }

    pub async fn register(&self, registration: &ClientRegistration) -> PortResult<()> {
        let request = ApiRequest::post("/auth/register/").with_json(registration)?;
        self.client()
            .send_anonymous(request)
            .await?
            .into_result()?;
        Ok(())
    }
}
