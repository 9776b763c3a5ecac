//! services/storefront/src/api/catalog.rs
//!
//! Public catalog endpoints.

use storefront_core::domain::{Category, Listing, Product, ProductQuery, Vendor};
use storefront_core::ports::PortResult;

use super::StorefrontApi;

/// Page size used by the search-as-you-type dropdown.
pub const AUTOCOMPLETE_PAGE_SIZE: u32 = 5;

impl StorefrontApi {
    pub async fn list_products(&self, query: &ProductQuery) -> PortResult<Listing<Product>> {
        self.get_with_query("/products/", query.to_pairs()).await
    }

    pub async fn search_products(&self, term: &str) -> PortResult<Vec<Product>> {
        let query = ProductQuery {
            page_size: Some(AUTOCOMPLETE_PAGE_SIZE),
            ..ProductQuery::search(term)
        };
        Ok(self.list_products(&query).await?.into_items())
    }

    pub async fn product(&self, slug: &str) -> PortResult<Product> {
        self.get(&format!("/products/{}/", slug)).await
    }

    pub async fn categories(&self) -> PortResult<Listing<Category>> {
        self.get("/categories/").await
    }

    pub async fn vendors(&self) -> PortResult<Listing<Vendor>> {
        self.get("/vendors/").await
    }
}
