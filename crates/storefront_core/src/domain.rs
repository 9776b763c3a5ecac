//! crates/storefront_core/src/domain.rs
//!
//! Defines the core data structures exchanged with the storefront REST API.
//! Every record here is server-owned; the client only ever holds read-through
//! copies of them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

fn active_by_default() -> bool {
    true
}

/// The role attached to a user account. The server is authoritative for real
/// authorization; these predicates only gate what the client offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins are staff too.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }

    pub fn is_client(self) -> bool {
        matches!(self, Role::Client)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::Client => "CLIENT",
        }
    }
}

/// A user profile as returned by the authentication endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// The locally persisted token pair plus the cached profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<User>,
}

impl Credentials {
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    /// Applies a token grant. Absent tokens never overwrite stored ones.
    pub fn apply_grant(&mut self, grant: &TokenGrant) {
        self.access = Some(grant.access.clone());
        if let Some(refresh) = &grant.refresh {
            self.refresh = Some(refresh.clone());
        }
    }
}

/// Body of `POST /auth/refresh/`. Rotation may or may not hand out a new refresh token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body of `POST /auth/login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginGrant {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Self-service sign-up payload. The server forces the `CLIENT` role.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl ClientRegistration {
    pub fn passwords_match(&self) -> bool {
        self.password == self.password2
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    pub image: Option<String>,
    #[serde(default)]
    pub is_main: bool,
}

/// A product as served by both the public and the admin endpoints. Admin-only
/// fields are optional so one type covers both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub promo_price: Option<Decimal>,
    /// Absent on listings that do not report inventory.
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub technical_specs: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub vendor: Option<i64>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl Product {
    /// The price a buyer pays today: the promo price when one is set.
    pub fn effective_price(&self) -> Decimal {
        self.promo_price.unwrap_or(self.price)
    }

    pub fn in_stock(&self) -> bool {
        self.stock.is_some_and(|stock| stock > 0)
    }
}

/// Field-level validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Create/update payload for `/admin/products/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_specs: Option<BTreeMap<String, Value>>,
    pub category: Option<Uuid>,
    pub vendor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl ProductDraft {
    /// Checks the fields the form requires before anything is sent.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name".into(), "Name is required".into());
        }
        if self.description.trim().is_empty() {
            errors.insert("description".into(), "Description is required".into());
        }
        if self.price <= Decimal::ZERO {
            errors.insert("price".into(), "Price must be greater than 0".into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Filters for the product listing endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<Uuid>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProductQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn in_category(category: Uuid) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    /// Query-string pairs; unset filters are omitted entirely.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(category) = self.category {
            pairs.push(("category".to_string(), category.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        pairs
    }
}

/// A flat category record (`/categories/`, `/admin/categories/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: Option<Uuid>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

/// One node of `/admin/categories/tree/`. Children are nested by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub products_count: u32,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first lookup of `id` within this subtree (including `self`).
    pub fn find(&self, id: Uuid) -> Option<&CategoryNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Create/update payload for `/admin/categories/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub parent: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

/// Create/update payload for `/admin/vendors/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VendorDraft {
    pub name: String,
    pub contact_email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

//=========================================================================================
// Cart
//=========================================================================================

/// One product/quantity/price-snapshot tuple within a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub product: Product,
    pub quantity: u32,
    pub price_snapshot: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        self.price_snapshot * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

//=========================================================================================
// Orders
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Created,
        OrderStatus::Paid,
        OrderStatus::Preparing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Paid => "Paid",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product: Product,
    pub quantity: u32,
    pub price: Decimal,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Client endpoints return the owner's id; admin endpoints embed the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderCustomer {
    Id(Uuid),
    Account(User),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    pub status: OrderStatus,
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub internal_notes: Option<String>,
}

impl Order {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// PATCH payload for `/admin/orders/{id}/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
}

//=========================================================================================
// Staff
//=========================================================================================

/// Creation payload for `/admin/staff/`. The server forces the `STAFF` role.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StaffDraft {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StaffUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

//=========================================================================================
// Listings and dashboard
//=========================================================================================

/// A paginated list envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// List endpoints answer either with a bare array or with a [`Page`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Paged(page) => &page.results,
            Listing::Plain(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paged(page) => page.results,
            Listing::Plain(items) => items,
        }
    }

    /// Server-side total when paginated, otherwise the local length.
    pub fn total(&self) -> u64 {
        match self {
            Listing::Paged(page) => page.count,
            Listing::Plain(items) => items.len() as u64,
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, Listing::Paged(page) if page.next.is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total: u64,
    pub clients: u64,
    pub staff: u64,
    pub admins: u64,
    pub new_today: u64,
    pub new_month: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductStats {
    pub total: u64,
    pub active: u64,
    pub out_of_stock: u64,
    pub featured: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderStats {
    pub total: u64,
    pub today: u64,
    pub by_status: BTreeMap<String, u64>,
    pub total_sales: Decimal,
    pub month_sales: Decimal,
    pub by_day: Vec<DailySales>,
}

impl OrderStats {
    pub fn count_for(&self, status: OrderStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogStats {
    pub categories: u64,
    pub vendors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CartStats {
    pub active_carts: u64,
}

/// `GET /admin/dashboard/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardSummary {
    pub users: UserStats,
    pub products: ProductStats,
    pub orders: OrderStats,
    pub catalog: CatalogStats,
    pub cart: CartStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_satisfies_admin_and_staff() {
        assert!(Role::Admin.is_admin());
        assert!(Role::Admin.is_staff());
        assert!(!Role::Admin.is_client());
    }

    #[test]
    fn client_is_not_staff() {
        assert!(!Role::Client.is_admin());
        assert!(!Role::Client.is_staff());
        assert!(Role::Client.is_client());
        assert!(Role::Staff.is_staff());
        assert!(!Role::Staff.is_admin());
    }

    #[test]
    fn prices_decode_from_strings_and_numbers() {
        let product: Product = serde_json::from_value(json!({
            "id": "5f2b8c1e-3a4d-4e5f-8a9b-0c1d2e3f4a5b",
            "name": "Centrifuge",
            "price": "120.50",
            "promo_price": 99.9,
            "stock": 4
        }))
        .unwrap();

        assert_eq!(product.price, Decimal::new(12050, 2));
        assert_eq!(product.effective_price(), Decimal::new(999, 1));
        assert_eq!(product.stock, Some(4));
        assert!(product.is_active);
    }

    #[test]
    fn stock_is_unknown_when_not_reported() {
        let product: Product = serde_json::from_value(json!({
            "id": "5f2b8c1e-3a4d-4e5f-8a9b-0c1d2e3f4a5b",
            "name": "Pipette",
            "price": "12.00"
        }))
        .unwrap();

        assert_eq!(product.stock, None);
        assert!(!product.in_stock());
    }

    #[test]
    fn listing_accepts_both_shapes() {
        let plain: Listing<Vendor> =
            serde_json::from_value(json!([{ "id": 1, "name": "Merck" }])).unwrap();
        assert_eq!(plain.total(), 1);
        assert!(!plain.has_next());

        let paged: Listing<Vendor> = serde_json::from_value(json!({
            "count": 12,
            "next": "http://api/vendors/?page=2",
            "previous": null,
            "results": [{ "id": 1, "name": "Merck" }, { "id": 2, "name": "Sartorius" }]
        }))
        .unwrap();
        assert_eq!(paged.total(), 12);
        assert!(paged.has_next());
        assert_eq!(paged.into_items().len(), 2);
    }

    #[test]
    fn order_customer_is_id_or_profile() {
        let by_id: OrderCustomer =
            serde_json::from_value(json!("7d9f0a52-1b2c-4d3e-9f80-112233445566")).unwrap();
        assert!(matches!(by_id, OrderCustomer::Id(_)));

        let by_profile: OrderCustomer = serde_json::from_value(json!({
            "id": "7d9f0a52-1b2c-4d3e-9f80-112233445566",
            "username": "lab-buyer",
            "role": "CLIENT"
        }))
        .unwrap();
        assert!(matches!(by_profile, OrderCustomer::Account(user) if user.role == Role::Client));
    }

    #[test]
    fn tree_lookup_walks_children() {
        let leaf = Uuid::new_v4();
        let tree: CategoryNode = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Lab",
            "children": [{
                "id": Uuid::new_v4(),
                "name": "Glassware",
                "children": [{ "id": leaf, "name": "Beakers", "products_count": 3 }]
            }]
        }))
        .unwrap();

        assert_eq!(tree.find(leaf).map(|n| n.products_count), Some(3));
        assert_eq!(tree.descendant_count(), 2);
    }

    #[test]
    fn product_draft_requires_name_description_and_price() {
        let errors = ProductDraft::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);

        let draft = ProductDraft {
            name: "pH meter".into(),
            description: "Benchtop".into(),
            price: Decimal::new(45000, 2),
            ..Default::default()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn query_pairs_skip_unset_filters() {
        let query = ProductQuery {
            page: Some(2),
            ..ProductQuery::search("pipette")
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("search".to_string(), "pipette".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn dashboard_counts_by_status() {
        let summary: DashboardSummary = serde_json::from_value(json!({
            "orders": {
                "total": 3,
                "by_status": { "CREATED": 2, "DELIVERED": 1 },
                "total_sales": 150.5,
                "by_day": [{ "date": "2026-10-14", "total": 150.5 }]
            }
        }))
        .unwrap();

        assert_eq!(summary.orders.count_for(OrderStatus::Created), 2);
        assert_eq!(summary.orders.count_for(OrderStatus::Paid), 0);
        assert_eq!(summary.orders.by_day.len(), 1);
    }
}
