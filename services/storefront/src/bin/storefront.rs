//! services/storefront/src/bin/storefront.rs
//!
//! Headless smoke run of the storefront client: restores (or opens) a session
//! against the configured API, loads the first screen's data and logs it.

use std::sync::Arc;
use std::time::Duration;
use storefront_lib::{
    adapters::{FileTokenStore, RecordingNavigator, ReqwestTransport},
    app::AppState,
    config::Config,
    error::StorefrontError,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), StorefrontError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(api_url = %config.api_url, "Configuration loaded. Starting storefront client...");

    // --- 2. Initialize Adapters ---
    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let transport = Arc::new(ReqwestTransport::new(http, config.api_url.clone()));
    let tokens = Arc::new(FileTokenStore::new(config.token_store_path.clone()));
    let navigator = Arc::new(RecordingNavigator::new());
    let state = AppState::connect(config.clone(), transport, tokens, navigator.clone());

    // --- 3. Session & First Screen ---
    let mut warm = state.warm_up().await;
    if warm.user.is_none() {
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            match state.sign_in(username, password).await {
                Ok(cart) => {
                    info!(%username, "Signed in from configured credentials");
                    warm.cart = cart;
                    warm.user = state.session.current_user().await;
                }
                Err(rejected) => warn!(%username, "{}", rejected),
            }
        }
    }
    match &warm.user {
        Some(user) => info!(username = %user.username, role = user.role.as_str(), "Active session"),
        None => info!("Browsing anonymously"),
    }
    info!(
        items = warm.cart.total_items(),
        total = %warm.cart.total(),
        "Cart loaded"
    );
    match &warm.categories.error {
        None => info!(categories = warm.categories.value.len(), "Categories loaded"),
        Some(message) => warn!("{}", message),
    }
    if state.session.is_staff().await {
        match state.admin.dashboard().await {
            Ok(summary) => info!(
                orders = summary.orders.total,
                products = summary.products.total,
                "Dashboard loaded"
            ),
            Err(e) => warn!("{}", e),
        }
    }
    if let Some(route) = navigator.current() {
        info!(path = route.path(), "Client ended on");
    }

    Ok(())
}
