//! services/storefront/src/app/admin.rs
//!
//! The back-office console. Every operation checks the cached role first and
//! answers `Forbidden` locally when it does not qualify; the server still
//! has the final say.

use std::sync::Arc;
use storefront_core::domain::{
    Category, CategoryDraft, CategoryNode, DashboardSummary, FieldErrors, Listing, Order,
    OrderUpdate, Product, ProductDraft, ProductQuery, Role, StaffDraft, StaffUpdate, User,
    Vendor, VendorDraft,
};
use storefront_core::ports::PortError;
use tracing::{info, warn};
use uuid::Uuid;

use super::feedback;
use super::session::SessionHolder;
use crate::api::StorefrontApi;

const STAFF_REQUIRED: &str = "Staff access required";
const ADMIN_REQUIRED: &str = "Administrator access required";
const SAVE_FAILED: &str = "Could not save the changes.";
const LOAD_FAILED: &str = "Could not load the data. Please retry.";
const DELETE_FAILED: &str = "Could not delete the record.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdminError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("The form has errors")]
    Invalid(FieldErrors),
    #[error("{message}")]
    Rejected { message: String },
}

impl AdminError {
    fn from_port(error: PortError, fallback: &str) -> Self {
        warn!("Admin request failed: {}", error);
        AdminError::Rejected {
            message: feedback::describe(&error, fallback),
        }
    }
}

type AdminResult<T> = Result<T, AdminError>;

fn require_name(name: &str) -> AdminResult<()> {
    if name.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.insert("name".into(), "Name is required".into());
        return Err(AdminError::Invalid(errors));
    }
    Ok(())
}

fn validate_staff(draft: &StaffDraft) -> AdminResult<()> {
    let mut errors = FieldErrors::new();
    if draft.username.trim().is_empty() {
        errors.insert("username".into(), "Username is required".into());
    }
    if !draft.email.contains('@') {
        errors.insert("email".into(), "Invalid email".into());
    }
    if draft.password.chars().count() < 8 {
        errors.insert(
            "password".into(),
            "Password must be at least 8 characters".into(),
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AdminError::Invalid(errors))
    }
}

pub struct AdminConsole {
    api: Arc<StorefrontApi>,
    session: Arc<SessionHolder>,
}

impl AdminConsole {
    pub fn new(api: Arc<StorefrontApi>, session: Arc<SessionHolder>) -> Self {
        Self { api, session }
    }

    async fn require_staff(&self) -> AdminResult<()> {
        match self.session.role().await {
            Some(role) if role.is_staff() => Ok(()),
            _ => Err(AdminError::Forbidden(STAFF_REQUIRED)),
        }
    }

    async fn require_admin(&self) -> AdminResult<()> {
        match self.session.role().await {
            Some(Role::Admin) => Ok(()),
            _ => Err(AdminError::Forbidden(ADMIN_REQUIRED)),
        }
    }

    //-------------------------------------------------------------------------------------
    // Products
    //-------------------------------------------------------------------------------------

    pub async fn products(&self, query: &ProductQuery) -> AdminResult<Listing<Product>> {
        self.require_staff().await?;
        self.api
            .admin_products(query)
            .await
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn products_in_category(&self, category: Uuid) -> AdminResult<Vec<Product>> {
        let listing = self.products(&ProductQuery::in_category(category)).await?;
        Ok(listing.into_items())
    }

    pub async fn product(&self, id: Uuid) -> AdminResult<Product> {
        self.require_staff().await?;
        self.api
            .admin_product(id)
            .await
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> AdminResult<Product> {
        self.require_staff().await?;
        draft.validate().map_err(AdminError::Invalid)?;
        let product = self
            .api
            .create_product(draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))?;
        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, draft: &ProductDraft) -> AdminResult<Product> {
        self.require_staff().await?;
        draft.validate().map_err(AdminError::Invalid)?;
        let product = self
            .api
            .update_product(id, draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))?;
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> AdminResult<()> {
        self.require_staff().await?;
        self.api
            .delete_product(id)
            .await
            .map_err(|e| AdminError::from_port(e, DELETE_FAILED))?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Categories
    //-------------------------------------------------------------------------------------

    pub async fn categories(&self) -> AdminResult<Vec<Category>> {
        self.require_staff().await?;
        self.api
            .admin_categories()
            .await
            .map(Listing::into_items)
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn category_tree(&self) -> AdminResult<Vec<CategoryNode>> {
        self.require_staff().await?;
        self.api
            .category_tree()
            .await
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> AdminResult<Category> {
        self.require_staff().await?;
        require_name(&draft.name)?;
        let category = self
            .api
            .create_category(draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))?;
        info!(category_id = %category.id, parent = ?draft.parent, "Category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: Uuid, draft: &CategoryDraft) -> AdminResult<Category> {
        self.require_staff().await?;
        require_name(&draft.name)?;
        self.api
            .update_category(id, draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))
    }

    pub async fn delete_category(&self, id: Uuid) -> AdminResult<()> {
        self.require_staff().await?;
        self.api
            .delete_category(id)
            .await
            .map_err(|e| AdminError::from_port(e, DELETE_FAILED))?;
        info!(category_id = %id, "Category deleted with its children");
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Vendors
    //-------------------------------------------------------------------------------------

    pub async fn vendors(&self) -> AdminResult<Vec<Vendor>> {
        self.require_staff().await?;
        self.api
            .admin_vendors()
            .await
            .map(Listing::into_items)
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn create_vendor(&self, draft: &VendorDraft) -> AdminResult<Vendor> {
        self.require_staff().await?;
        require_name(&draft.name)?;
        self.api
            .create_vendor(draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))
    }

    pub async fn update_vendor(&self, id: i64, draft: &VendorDraft) -> AdminResult<Vendor> {
        self.require_staff().await?;
        require_name(&draft.name)?;
        self.api
            .update_vendor(id, draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))
    }

    pub async fn delete_vendor(&self, id: i64) -> AdminResult<()> {
        self.require_staff().await?;
        self.api
            .delete_vendor(id)
            .await
            .map_err(|e| AdminError::from_port(e, DELETE_FAILED))
    }

    //-------------------------------------------------------------------------------------
    // Orders
    //-------------------------------------------------------------------------------------

    pub async fn orders(&self) -> AdminResult<Vec<Order>> {
        self.require_staff().await?;
        self.api
            .admin_orders()
            .await
            .map(Listing::into_items)
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn order(&self, id: Uuid) -> AdminResult<Order> {
        self.require_staff().await?;
        self.api
            .admin_order(id)
            .await
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn update_order(&self, id: Uuid, update: &OrderUpdate) -> AdminResult<Order> {
        self.require_staff().await?;
        let order = self
            .api
            .update_order(id, update)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))?;
        info!(order_id = %id, status = order.status.as_str(), "Order updated");
        Ok(order)
    }

    //-------------------------------------------------------------------------------------
    // Staff (administrators only)
    //-------------------------------------------------------------------------------------

    pub async fn staff(&self) -> AdminResult<Vec<User>> {
        self.require_admin().await?;
        self.api
            .staff()
            .await
            .map(Listing::into_items)
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }

    pub async fn create_staff(&self, draft: &StaffDraft) -> AdminResult<()> {
        self.require_admin().await?;
        validate_staff(draft)?;
        self.api
            .create_staff(draft)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))?;
        info!(username = %draft.username, "Staff account created");
        Ok(())
    }

    pub async fn update_staff(&self, id: Uuid, update: &StaffUpdate) -> AdminResult<User> {
        self.require_admin().await?;
        self.api
            .update_staff(id, update)
            .await
            .map_err(|e| AdminError::from_port(e, SAVE_FAILED))
    }

    pub async fn delete_staff(&self, id: Uuid) -> AdminResult<()> {
        self.require_admin().await?;
        self.api
            .delete_staff(id)
            .await
            .map_err(|e| AdminError::from_port(e, DELETE_FAILED))
    }

    //-------------------------------------------------------------------------------------
    // Dashboard
    //-------------------------------------------------------------------------------------

    pub async fn dashboard(&self) -> AdminResult<DashboardSummary> {
        self.require_staff().await?;
        self.api
            .dashboard()
            .await
            .map_err(|e| AdminError::from_port(e, LOAD_FAILED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{order_json, user, Harness};
    use rust_decimal::Decimal;
    use serde_json::json;
    use storefront_core::domain::{Credentials, OrderStatus};
    use storefront_core::ports::Method;

    async fn console_for(role: Role) -> (Harness, AdminConsole) {
        let h = Harness::new(Credentials {
            access: Some("a".into()),
            refresh: Some("r".into()),
            user: Some(user(role)),
        });
        let session = Arc::new(SessionHolder::new(h.api.clone()));
        session.restore().await;
        let console = AdminConsole::new(h.api.clone(), session);
        (h, console)
    }

    #[tokio::test]
    async fn clients_are_refused_locally() {
        let (h, console) = console_for(Role::Client).await;

        assert_eq!(
            console.dashboard().await,
            Err(AdminError::Forbidden(STAFF_REQUIRED))
        );
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn expired_session_loses_console_access() {
        let (h, console) = console_for(Role::Admin).await;
        h.transport.on(Method::Get, "/orders/", 401, json!({ "detail": "Token expired" }));
        h.transport.on(Method::Post, "/auth/refresh/", 401, json!({ "detail": "Token is blacklisted" }));

        assert!(h.api.orders().await.is_err());

        assert_eq!(
            console.dashboard().await,
            Err(AdminError::Forbidden(STAFF_REQUIRED))
        );
        assert_eq!(h.transport.count(Method::Get, "/admin/dashboard/"), 0);
    }

    #[tokio::test]
    async fn staff_cannot_manage_staff() {
        let (h, console) = console_for(Role::Staff).await;
        h.transport.on(Method::Get, "/admin/vendors/", 200, json!([]));

        assert!(console.vendors().await.unwrap().is_empty());
        assert_eq!(console.staff().await, Err(AdminError::Forbidden(ADMIN_REQUIRED)));
        assert_eq!(h.transport.count(Method::Get, "/admin/staff/"), 0);
    }

    #[tokio::test]
    async fn invalid_product_drafts_are_not_sent() {
        let (h, console) = console_for(Role::Admin).await;
        let draft = ProductDraft {
            name: "Spectrophotometer".into(),
            price: Decimal::ZERO,
            ..Default::default()
        };

        let Err(AdminError::Invalid(errors)) = console.create_product(&draft).await else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn order_status_update_is_patched() {
        let (h, console) = console_for(Role::Staff).await;
        let id = Uuid::new_v4();
        let mut shipped = order_json("99.00");
        shipped["status"] = json!("SHIPPED");
        h.transport
            .on(Method::Patch, &format!("/admin/orders/{}/", id), 200, shipped);

        let update = OrderUpdate {
            status: Some(OrderStatus::Shipped),
            internal_notes: None,
        };
        let order = console.update_order(id, &update).await.unwrap();

        assert_eq!(order.status, OrderStatus::Shipped);
        let request = &h.transport.requests()[0];
        assert_eq!(request.body, Some(json!({ "status": "SHIPPED" })));
    }

    #[tokio::test]
    async fn server_field_errors_become_a_message() {
        let (h, console) = console_for(Role::Admin).await;
        h.transport.on(
            Method::Post,
            "/admin/staff/",
            400,
            json!({ "username": ["A user with that username already exists."] }),
        );
        let draft = StaffDraft {
            username: "warehouse".into(),
            email: "warehouse@lab.example".into(),
            password: "longenough".into(),
            ..Default::default()
        };

        let error = console.create_staff(&draft).await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "username: A user with that username already exists."
        );
    }
}
