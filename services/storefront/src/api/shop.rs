//! services/storefront/src/api/shop.rs
//!
//! Cart, order and payment endpoints for the signed-in client.

use serde::Deserialize;
use serde_json::json;
use storefront_core::domain::{Cart, Listing, Order, Page};
use storefront_core::ports::{ApiRequest, PortResult};
use uuid::Uuid;

use super::StorefrontApi;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// `/cart/` is served by a list view on some deployments and a detail view on
/// others.
#[derive(Deserialize)]
#[serde(untagged)]
enum CartPayload {
    Many(Vec<Cart>),
    Paged(Page<Cart>),
    One(Cart),
}

impl CartPayload {
    fn into_cart(self) -> Cart {
        match self {
            CartPayload::Many(carts) => carts.into_iter().next().unwrap_or_default(),
            CartPayload::Paged(page) => page.results.into_iter().next().unwrap_or_default(),
            CartPayload::One(cart) => cart,
        }
    }
}

impl StorefrontApi {
    pub async fn cart(&self) -> PortResult<Cart> {
        let payload: CartPayload = self.get("/cart/").await?;
        Ok(payload.into_cart())
    }

    pub async fn add_to_cart(&self, product_id: Uuid, quantity: u32) -> PortResult<()> {
        let request = ApiRequest::post("/cart/")
            .with_json(&json!({ "product_id": product_id, "quantity": quantity }))?;
        self.client().execute(request).await?;
        Ok(())
    }

    pub async fn update_cart_item(&self, item_id: i64, quantity: u32) -> PortResult<()> {
        let request = ApiRequest::patch(format!("/cart-items/{}/", item_id))
            .with_json(&json!({ "quantity": quantity }))?;
        self.client().execute(request).await?;
        Ok(())
    }

    pub async fn remove_cart_item(&self, item_id: i64) -> PortResult<()> {
        self.delete(&format!("/cart-items/{}/", item_id)).await
    }

    /// Turns the server-side cart into an order. The server reads the cart
    /// itself; the key lets it drop duplicates of the same attempt.
    pub async fn create_order(&self, idempotency_key: Uuid) -> PortResult<Order> {
        let request = ApiRequest::post("/orders/")
            .with_header(IDEMPOTENCY_HEADER, idempotency_key.to_string());
        self.client().fetch(request).await
    }

    pub async fn orders(&self) -> PortResult<Listing<Order>> {
        self.get("/orders/").await
    }

    pub async fn order(&self, id: Uuid) -> PortResult<Order> {
        self.get(&format!("/orders/{}/", id)).await
    }

    /// Charges the current cart with a single-use card token.
    pub async fn charge_card(&self, token: &str) -> PortResult<()> {
        let request =
            ApiRequest::post("/payments/culqi/charge/").with_json(&json!({ "token": token }))?;
        self.client().execute(request).await?;
        Ok(())
    }
}
