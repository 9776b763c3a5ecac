//! services/storefront/src/app/orders.rs
//!
//! Order submission from the current cart, and the client's order history.

use std::sync::Arc;
use storefront_core::domain::Order;
use storefront_core::ports::Route;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use super::cart::CartHolder;
use super::feedback::{self, Recovered};
use crate::api::StorefrontApi;

const ORDER_FAILED: &str = "Could not create the order. Please try again.";
const HISTORY_FAILED: &str = "Could not load your orders.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("An order is already being submitted")]
    AlreadySubmitting,
    #[error("{message}")]
    Rejected { message: String },
}

pub struct OrderFlow {
    api: Arc<StorefrontApi>,
    cart: Arc<CartHolder>,
    in_flight: Mutex<()>,
}

impl OrderFlow {
    pub fn new(api: Arc<StorefrontApi>, cart: Arc<CartHolder>) -> Self {
        Self {
            api,
            cart,
            in_flight: Mutex::new(()),
        }
    }

    /// Converts the server-side cart into an order, reloads the (now empty)
    /// cart and moves to the order list. On failure the cart is untouched.
    pub async fn submit(&self) -> Result<Order, OrderError> {
        let _submitting = self
            .in_flight
            .try_lock()
            .map_err(|_| OrderError::AlreadySubmitting)?;

        let idempotency_key = Uuid::new_v4();
        let order = self
            .api
            .create_order(idempotency_key)
            .await
            .map_err(|e| {
                error!(%idempotency_key, "Order creation failed: {}", e);
                OrderError::Rejected {
                    message: feedback::describe(&e, ORDER_FAILED),
                }
            })?;

        info!(order_id = %order.id, total = %order.total, "Order created");
        self.cart.load().await;
        self.api.client().navigator().navigate(Route::Orders);
        Ok(order)
    }

    pub async fn history(&self) -> Recovered<Vec<Order>> {
        match self.api.orders().await {
            Ok(listing) => Recovered::ok(listing.into_items()),
            Err(e) => {
                error!("Could not load orders: {}", e);
                Recovered::failed(Vec::new(), feedback::describe(&e, HISTORY_FAILED))
            }
        }
    }

    pub async fn details(&self, id: Uuid) -> Result<Order, OrderError> {
        self.api.order(id).await.map_err(|e| OrderError::Rejected {
            message: feedback::describe(&e, "Order not found."),
        })
    }
}
