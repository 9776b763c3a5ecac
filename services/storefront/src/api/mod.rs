//! services/storefront/src/api/mod.rs
//!
//! Typed wrappers over the storefront REST endpoints. Every call goes through
//! the shared [`ApiClient`], so bearer tokens and the one-shot refresh apply
//! uniformly.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod shop;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use storefront_core::ports::{ApiRequest, PortResult};

use crate::client::ApiClient;

#[derive(Clone)]
pub struct StorefrontApi {
    client: Arc<ApiClient>,
}

impl StorefrontApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        self.client.fetch(ApiRequest::get(path)).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> PortResult<T> {
        self.client
            .fetch(ApiRequest::get(path).with_query(query))
            .await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> PortResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client
            .fetch(ApiRequest::post(path).with_json(body)?)
            .await
    }

    async fn patch<B, T>(&self, path: &str, body: &B) -> PortResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client
            .fetch(ApiRequest::patch(path).with_json(body)?)
            .await
    }

    /// Deletes never carry a meaningful body, so the response is discarded.
    async fn delete(&self, path: &str) -> PortResult<()> {
        self.client.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }
}
