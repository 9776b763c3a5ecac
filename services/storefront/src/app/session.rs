//! services/storefront/src/app/session.rs
//!
//! The session/identity holder. The token store is the single source of
//! truth: the user profile is read back from the stored credentials, so a
//! session the client expired after a failed refresh reads as signed out.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use storefront_core::domain::{ClientRegistration, Credentials, FieldErrors, Role, User};
use storefront_core::ports::{PortError, Route};
use tracing::{error, info, warn};

use super::feedback;
use crate::api::StorefrontApi;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
const REGISTRATION_FAILED: &str = "Could not create the account";
const MIN_PASSWORD_LENGTH: usize = 8;

/// Login failed. The message is deliberately flat.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoginRejected {
    pub message: String,
}

impl Default for LoginRejected {
    fn default() -> Self {
        Self {
            message: INVALID_CREDENTIALS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("The registration form has errors")]
    Invalid(FieldErrors),
    #[error("{message}")]
    Rejected { message: String },
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static pattern compiles"))
}

/// Checks the registration form before anything is sent.
pub fn validate_registration(form: &ClientRegistration) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if form.username.trim().is_empty() {
        errors.insert("username".into(), "Username is required".into());
    }
    if form.email.trim().is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !email_pattern().is_match(form.email.trim()) {
        errors.insert("email".into(), "Invalid email".into());
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert(
            "password".into(),
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }
    if !form.passwords_match() {
        errors.insert("password2".into(), "Passwords do not match".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub struct SessionHolder {
    api: Arc<StorefrontApi>,
}

impl SessionHolder {
    pub fn new(api: Arc<StorefrontApi>) -> Self {
        Self { api }
    }

    /// Fills in the stored profile when only tokens were persisted.
    /// Failures leave the session as it was.
    pub async fn restore(&self) {
        let tokens = self.api.client().tokens();
        let mut credentials = match tokens.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Could not read stored credentials: {}", e);
                return;
            }
        };
        if credentials.user.is_none() && credentials.access.is_some() {
            match self.api.me().await {
                Ok(user) => {
                    credentials.user = Some(user);
                    if let Err(e) = tokens.save(&credentials).await {
                        warn!("Could not cache the user profile: {}", e);
                    }
                }
                Err(e) => warn!("Could not fetch the current user: {}", e),
            }
        }
        if let (Some(user), Some(_)) = (&credentials.user, &credentials.access) {
            info!(username = %user.username, role = user.role.as_str(), "Session restored");
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), LoginRejected> {
        let grant = match self.api.login(username, password).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(%username, "Login rejected: {}", e);
                return Err(LoginRejected::default());
            }
        };

        let mut credentials = Credentials {
            access: Some(grant.access),
            refresh: Some(grant.refresh),
            user: grant.user,
        };
        let tokens = self.api.client().tokens();
        if let Err(e) = tokens.save(&credentials).await {
            error!("Could not store the new tokens: {}", e);
            return Err(LoginRejected::default());
        }
        if credentials.user.is_none() {
            match self.api.me().await {
                Ok(user) => {
                    credentials.user = Some(user);
                    if let Err(e) = tokens.save(&credentials).await {
                        warn!("Could not cache the user profile: {}", e);
                    }
                }
                Err(e) => warn!("Signed in but could not fetch the profile: {}", e),
            }
        }

        info!(%username, "Signed in");
        Ok(())
    }

    pub async fn register(&self, form: &ClientRegistration) -> Result<(), RegistrationError> {
        validate_registration(form).map_err(RegistrationError::Invalid)?;
        self.api.register(form).await.map_err(|e| {
            warn!(username = %form.username, "Registration rejected: {}", e);
            let message = match &e {
                PortError::Rejected { .. } => feedback::first_error(&e),
                _ => None,
            };
            RegistrationError::Rejected {
                message: message.unwrap_or_else(|| REGISTRATION_FAILED.to_string()),
            }
        })?;
        info!(username = %form.username, "Account created");
        Ok(())
    }

    /// Best-effort server logout, then local teardown and a redirect to login.
    pub async fn logout(&self) {
        let client = self.api.client();
        match client.tokens().load().await {
            Ok(Credentials {
                refresh: Some(refresh),
                ..
            }) => {
                if let Err(e) = self.api.logout(&refresh).await {
                    warn!("Server-side logout failed: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read stored credentials: {}", e),
        }
        if let Err(e) = client.tokens().clear().await {
            error!("Could not clear stored credentials: {}", e);
        }
        info!("Signed out");
        client.navigator().navigate(Route::Login);
    }

    /// The signed-in user, read from the token store. A profile left behind
    /// without an access token does not count.
    pub async fn current_user(&self) -> Option<User> {
        match self.api.client().tokens().load().await {
            Ok(Credentials {
                access: Some(_),
                user,
                ..
            }) => user,
            Ok(_) => None,
            Err(e) => {
                warn!("Could not read stored credentials: {}", e);
                None
            }
        }
    }

    pub async fn role(&self) -> Option<Role> {
        self.current_user().await.map(|user| user.role)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_user().await.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.role().await.is_some_and(Role::is_admin)
    }

    pub async fn is_staff(&self) -> bool {
        self.role().await.is_some_and(Role::is_staff)
    }

    pub async fn is_client(&self) -> bool {
        self.role().await.is_some_and(Role::is_client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{user, user_json, Harness};
    use serde_json::json;
    use storefront_core::ports::{Method, TokenStore};

    fn registration() -> ClientRegistration {
        ClientRegistration {
            username: "labbuyer".into(),
            email: "buyer@lab.example".into(),
            password: "centrifuge42".into(),
            password2: "centrifuge42".into(),
            first_name: "Ana".into(),
            last_name: "Quispe".into(),
            phone: "999888777".into(),
        }
    }

    #[tokio::test]
    async fn login_stores_tokens_and_profile() {
        let h = Harness::anonymous();
        h.transport.on(
            Method::Post,
            "/auth/login/",
            200,
            json!({ "access": "a-1", "refresh": "r-1", "user": user_json(Role::Staff) }),
        );
        let session = SessionHolder::new(h.api.clone());

        session.login("staffer", "secret").await.unwrap();

        let stored = h.tokens.load().await.unwrap();
        assert_eq!(stored.access.as_deref(), Some("a-1"));
        assert_eq!(stored.refresh.as_deref(), Some("r-1"));
        assert!(session.is_staff().await);
        assert!(!session.is_admin().await);
    }

    #[tokio::test]
    async fn login_failure_is_a_flat_message() {
        let h = Harness::anonymous();
        h.transport.on(
            Method::Post,
            "/auth/login/",
            400,
            json!({ "non_field_errors": ["Account disabled for audit reasons"] }),
        );
        let session = SessionHolder::new(h.api.clone());

        let rejected = session.login("buyer", "nope").await.unwrap_err();

        assert_eq!(rejected.message, INVALID_CREDENTIALS);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn client_role_never_gets_staff_predicates() {
        let h = Harness::signed_in();
        let session = SessionHolder::new(h.api.clone());
        session.restore().await;

        assert!(session.is_client().await);
        assert!(!session.is_staff().await);
        assert!(!session.is_admin().await);
        assert_eq!(h.transport.requests().len(), 0);
    }

    #[tokio::test]
    async fn admin_role_satisfies_admin_and_staff() {
        let h = Harness::new(Credentials {
            access: Some("a".into()),
            refresh: Some("r".into()),
            user: Some(user(Role::Admin)),
        });
        let session = SessionHolder::new(h.api.clone());
        session.restore().await;

        assert!(session.is_admin().await);
        assert!(session.is_staff().await);
    }

    #[tokio::test]
    async fn restore_fetches_a_missing_profile() {
        let h = Harness::new(Credentials {
            access: Some("a".into()),
            refresh: Some("r".into()),
            user: None,
        });
        h.transport.on(Method::Get, "/auth/me/", 200, json!({ "user": user_json(Role::Client) }));
        let session = SessionHolder::new(h.api.clone());

        session.restore().await;

        assert!(session.is_client().await);
        assert!(h.tokens.load().await.unwrap().user.is_some());
    }

    #[tokio::test]
    async fn logout_clears_state_even_when_the_server_fails() {
        let h = Harness::signed_in();
        h.transport.fail(Method::Post, "/auth/logout/", "connection refused");
        let session = SessionHolder::new(h.api.clone());
        session.restore().await;

        session.logout().await;

        assert_eq!(h.transport.count(Method::Post, "/auth/logout/"), 1);
        assert!(!h.tokens.load().await.unwrap().is_authenticated());
        assert!(session.current_user().await.is_none());
        assert_eq!(h.navigator.current(), Some(Route::Login));
    }

    #[tokio::test]
    async fn failed_refresh_signs_the_session_out() {
        let h = Harness::new(Credentials {
            access: Some("a".into()),
            refresh: Some("r".into()),
            user: Some(user(Role::Admin)),
        });
        h.transport.on(Method::Get, "/orders/", 401, json!({ "detail": "Token expired" }));
        h.transport.on(Method::Post, "/auth/refresh/", 401, json!({ "detail": "Token is blacklisted" }));
        let session = SessionHolder::new(h.api.clone());
        session.restore().await;
        assert!(session.is_admin().await);

        let result = h.api.orders().await;

        assert!(result.is_err());
        assert_eq!(h.navigator.current(), Some(Route::Login));
        assert!(!session.is_authenticated().await);
        assert!(!session.is_admin().await);
        assert!(!session.is_staff().await);
        assert_eq!(session.role().await, None);
    }

    #[tokio::test]
    async fn a_profile_without_an_access_token_is_anonymous() {
        let h = Harness::new(Credentials {
            access: None,
            refresh: Some("r".into()),
            user: Some(user(Role::Staff)),
        });
        let session = SessionHolder::new(h.api.clone());

        assert!(session.current_user().await.is_none());
        assert!(!session.is_staff().await);
    }

    #[tokio::test]
    async fn registration_is_validated_locally_first() {
        let h = Harness::anonymous();
        let session = SessionHolder::new(h.api.clone());
        let form = ClientRegistration {
            email: "not-an-email".into(),
            password2: "different".into(),
            ..registration()
        };

        let Err(RegistrationError::Invalid(errors)) = session.register(&form).await else {
            panic!("expected local validation errors");
        };
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password2"));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn registration_surfaces_the_first_server_error() {
        let h = Harness::anonymous();
        h.transport.on(
            Method::Post,
            "/auth/register/",
            400,
            json!({ "username": ["A user with that username already exists."] }),
        );
        let session = SessionHolder::new(h.api.clone());

        let result = session.register(&registration()).await;

        assert_eq!(
            result,
            Err(RegistrationError::Rejected {
                message: "A user with that username already exists.".into()
            })
        );
    }
}
