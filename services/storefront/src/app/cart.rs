//! services/storefront/src/app/cart.rs
//!
//! The cart aggregate holder. The server owns the cart; this keeps the last
//! loaded copy and reloads it in full after every mutation.

use rust_decimal::Decimal;
use std::sync::Arc;
use storefront_core::domain::{CartItem, Product};
use storefront_core::ports::PortResult;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::StorefrontApi;

/// A point-in-time copy of the cart. Totals are folded on demand so they
/// always agree with `items`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, item_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BelowMinimum,
    ExceedsStock { stock: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated,
    /// Refused locally; no request was sent.
    Ignored(IgnoreReason),
}

/// Result of deleting every line item one by one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearOutcome {
    pub removed: Vec<i64>,
    pub failed: Vec<i64>,
}

impl ClearOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Default)]
struct CartState {
    items: Vec<CartItem>,
    initialized: bool,
}

pub struct CartHolder {
    api: Arc<StorefrontApi>,
    state: RwLock<CartState>,
}

impl CartHolder {
    pub fn new(api: Arc<StorefrontApi>) -> Self {
        Self {
            api,
            state: RwLock::new(CartState::default()),
        }
    }

    /// Fetches the cart. Any failure leaves an empty cart rather than an error.
    pub async fn load(&self) -> CartSnapshot {
        let items = match self.api.cart().await {
            Ok(cart) => cart.items,
            Err(e) => {
                warn!("Could not load the cart, showing it empty: {}", e);
                Vec::new()
            }
        };
        let mut state = self.state.write().await;
        state.items = items;
        if !state.initialized {
            state.initialized = true;
            debug!(items = state.items.len(), "Cart initialized");
        }
        CartSnapshot {
            items: state.items.clone(),
        }
    }

    pub async fn add_item(&self, product: &Product, quantity: u32) -> PortResult<CartSnapshot> {
        self.api.add_to_cart(product.id, quantity).await?;
        info!(product = %product.name, quantity, "Added to cart");
        Ok(self.load().await)
    }

    /// Quantities below one, or above the last known stock, are refused
    /// without contacting the server.
    pub async fn update_quantity(&self, item_id: i64, quantity: i64) -> PortResult<QuantityChange> {
        if quantity < 1 {
            return Ok(QuantityChange::Ignored(IgnoreReason::BelowMinimum));
        }
        let known_stock = self
            .snapshot()
            .await
            .item(item_id)
            .and_then(|item| item.product.stock);
        if let Some(stock) = known_stock {
            if quantity > stock {
                return Ok(QuantityChange::Ignored(IgnoreReason::ExceedsStock { stock }));
            }
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.api.update_cart_item(item_id, quantity).await?;
        self.load().await;
        Ok(QuantityChange::Updated)
    }

    pub async fn remove_item(&self, item_id: i64) -> PortResult<CartSnapshot> {
        self.api.remove_cart_item(item_id).await?;
        Ok(self.load().await)
    }

    /// Deletes every line item. When any delete fails the cart is reloaded so
    /// the local copy shows what actually remains.
    pub async fn clear(&self) -> ClearOutcome {
        let ids: Vec<i64> = self.snapshot().await.items.iter().map(|item| item.id).collect();
        let mut outcome = ClearOutcome::default();
        for id in ids {
            match self.api.remove_cart_item(id).await {
                Ok(()) => outcome.removed.push(id),
                Err(e) => {
                    warn!(item_id = id, "Could not remove cart item: {}", e);
                    outcome.failed.push(id);
                }
            }
        }

        if outcome.is_complete() {
            self.state.write().await.items.clear();
        } else {
            self.load().await;
        }
        info!(removed = outcome.removed.len(), failed = outcome.failed.len(), "Cart cleared");
        outcome
    }

    /// Drops the local copy without touching the server.
    pub async fn reset(&self) {
        self.state.write().await.items.clear();
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.state.read().await.items.clone(),
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }
}
