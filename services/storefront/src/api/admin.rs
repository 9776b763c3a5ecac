//! services/storefront/src/api/admin.rs
//!
//! Back-office endpoints under `/admin/`. The server enforces roles; callers
//! are expected to gate on the cached role first.

use storefront_core::domain::{
    Category, CategoryDraft, CategoryNode, DashboardSummary, Listing, Order, OrderUpdate,
    Product, ProductDraft, ProductQuery, StaffDraft, StaffUpdate, User, Vendor, VendorDraft,
};
use storefront_core::ports::{ApiRequest, PortResult};
use uuid::Uuid;

use super::StorefrontApi;

impl StorefrontApi {
    //-------------------------------------------------------------------------------------
    // Products
    //-------------------------------------------------------------------------------------

    pub async fn admin_products(&self, query: &ProductQuery) -> PortResult<Listing<Product>> {
        self.get_with_query("/admin/products/", query.to_pairs())
            .await
    }

    pub async fn admin_product(&self, id: Uuid) -> PortResult<Product> {
        self.get(&format!("/admin/products/{}/", id)).await
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> PortResult<Product> {
        self.post("/admin/products/", draft).await
    }

    pub async fn update_product(&self, id: Uuid, draft: &ProductDraft) -> PortResult<Product> {
        self.patch(&format!("/admin/products/{}/", id), draft).await
    }

    pub async fn delete_product(&self, id: Uuid) -> PortResult<()> {
        self.delete(&format!("/admin/products/{}/", id)).await
    }

    //-------------------------------------------------------------------------------------
    // Categories
    //-------------------------------------------------------------------------------------

    pub async fn admin_categories(&self) -> PortResult<Listing<Category>> {
        self.get("/admin/categories/").await
    }

    pub async fn category_tree(&self) -> PortResult<Vec<CategoryNode>> {
        self.get("/admin/categories/tree/").await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> PortResult<Category> {
        self.post("/admin/categories/", draft).await
    }

    pub async fn update_category(&self, id: Uuid, draft: &CategoryDraft) -> PortResult<Category> {
        self.patch(&format!("/admin/categories/{}/", id), draft).await
    }

    /// Children are removed with their parent server-side.
    pub async fn delete_category(&self, id: Uuid) -> PortResult<()> {
        self.delete(&format!("/admin/categories/{}/", id)).await
    }

    //-------------------------------------------------------------------------------------
    // Vendors
    //-------------------------------------------------------------------------------------

    pub async fn admin_vendors(&self) -> PortResult<Listing<Vendor>> {
        self.get("/admin/vendors/").await
    }

    pub async fn create_vendor(&self, draft: &VendorDraft) -> PortResult<Vendor> {
        self.post("/admin/vendors/", draft).await
    }

    pub async fn update_vendor(&self, id: i64, draft: &VendorDraft) -> PortResult<Vendor> {
        self.patch(&format!("/admin/vendors/{}/", id), draft).await
    }

    pub async fn delete_vendor(&self, id: i64) -> PortResult<()> {
        self.delete(&format!("/admin/vendors/{}/", id)).await
    }

    //-------------------------------------------------------------------------------------
    // Orders
    //-------------------------------------------------------------------------------------

    pub async fn admin_orders(&self) -> PortResult<Listing<Order>> {
        self.get("/admin/orders/").await
    }

    pub async fn admin_order(&self, id: Uuid) -> PortResult<Order> {
        self.get(&format!("/admin/orders/{}/", id)).await
    }

    pub async fn update_order(&self, id: Uuid, update: &OrderUpdate) -> PortResult<Order> {
        self.patch(&format!("/admin/orders/{}/", id), update).await
    }

    //-------------------------------------------------------------------------------------
    // Staff
    //-------------------------------------------------------------------------------------

    pub async fn staff(&self) -> PortResult<Listing<User>> {
        self.get("/admin/staff/").await
    }

    /// The creation response omits the role, so nothing is decoded.
    pub async fn create_staff(&self, draft: &StaffDraft) -> PortResult<()> {
        let request = ApiRequest::post("/admin/staff/").with_json(draft)?;
        self.client().execute(request).await?;
        Ok(())
    }

    pub async fn update_staff(&self, id: Uuid, update: &StaffUpdate) -> PortResult<User> {
        self.patch(&format!("/admin/staff/{}/", id), update).await
    }

    pub async fn delete_staff(&self, id: Uuid) -> PortResult<()> {
        self.delete(&format!("/admin/staff/{}/", id)).await
    }

    //-------------------------------------------------------------------------------------
    // Dashboard
    //-------------------------------------------------------------------------------------

    pub async fn dashboard(&self) -> PortResult<DashboardSummary> {
        self.get("/admin/dashboard/").await
    }
}
