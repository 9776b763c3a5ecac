//! services/storefront/src/app/state.rs
//!
//! The single service object that owns the session, cart and back-office
//! holders for one signed-in lifetime. It is built once at startup and passed
//! explicitly to whatever drives it.

use std::sync::Arc;
use storefront_core::domain::{Category, User};
use storefront_core::ports::{HttpTransport, Navigator, PaymentWidget, TokenStore};
use tracing::{error, info};

use super::admin::AdminConsole;
use super::cart::{CartHolder, CartSnapshot};
use super::category_tree::CategoryTree;
use super::checkout::PaymentSelector;
use super::feedback::{self, Recovered};
use super::orders::OrderFlow;
use super::search::SearchBox;
use super::session::{LoginRejected, SessionHolder};
use crate::api::StorefrontApi;
use crate::client::ApiClient;
use crate::config::Config;

/// What the first screen needs, loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmUp {
    pub user: Option<User>,
    pub cart: CartSnapshot,
    pub categories: Recovered<Vec<Category>>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<StorefrontApi>,
    pub session: Arc<SessionHolder>,
    pub cart: Arc<CartHolder>,
    pub orders: Arc<OrderFlow>,
    pub search: Arc<SearchBox>,
    pub admin: Arc<AdminConsole>,
    pub categories: Arc<CategoryTree>,
}

impl AppState {
    /// Wires the holders over an already-built API.
    pub fn new(config: Arc<Config>, api: Arc<StorefrontApi>) -> Self {
        let session = Arc::new(SessionHolder::new(api.clone()));
        let cart = Arc::new(CartHolder::new(api.clone()));
        let orders = Arc::new(OrderFlow::new(api.clone(), cart.clone()));
        let search = Arc::new(SearchBox::new(api.clone(), config.search_debounce));
        let admin = Arc::new(AdminConsole::new(api.clone(), session.clone()));
        let categories = Arc::new(CategoryTree::new(admin.clone()));
        Self {
            config,
            api,
            session,
            cart,
            orders,
            search,
            admin,
            categories,
        }
    }

    /// Builds the API client over the given adapters, then the holders.
    pub fn connect(
        config: Arc<Config>,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let client = Arc::new(ApiClient::new(transport, tokens, navigator));
        Self::new(config, Arc::new(StorefrontApi::new(client)))
    }

    /// Restores the session, then loads the cart and the public category
    /// list concurrently. Nothing here fails; problems degrade to empty views.
    pub async fn warm_up(&self) -> WarmUp {
        self.session.restore().await;
        let (cart, categories) = futures::join!(self.cart.load(), self.api.categories());
        let categories = match categories {
            Ok(listing) => Recovered::ok(listing.into_items()),
            Err(e) => {
                error!("Could not load categories: {}", e);
                Recovered::failed(
                    Vec::new(),
                    feedback::describe(&e, "Could not load categories."),
                )
            }
        };
        WarmUp {
            user: self.session.current_user().await,
            cart,
            categories,
        }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<CartSnapshot, LoginRejected> {
        self.session.login(username, password).await?;
        Ok(self.cart.load().await)
    }

    /// Ends the session and drops every per-user cache.
    pub async fn sign_out(&self) {
        self.search.dismiss().await;
        self.cart.reset().await;
        self.session.logout().await;
        info!("Session torn down");
    }

    pub fn payment_selector(&self, widget: Arc<dyn PaymentWidget>) -> PaymentSelector {
        PaymentSelector::new(
            self.api.clone(),
            self.cart.clone(),
            widget,
            self.config.payment.clone(),
        )
    }
}
