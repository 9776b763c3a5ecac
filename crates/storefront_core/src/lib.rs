pub mod domain;
pub mod ports;

pub use domain::{
    Cart, CartItem, Category, CategoryDraft, CategoryNode, ClientRegistration, Credentials,
    DashboardSummary, Listing, LoginGrant, Order, OrderCustomer, OrderItem, OrderStatus,
    OrderUpdate, Page, Product, ProductDraft, ProductQuery, Role, StaffDraft, StaffUpdate,
    TokenGrant, User, Vendor, VendorDraft,
};
pub use ports::{
    ApiRequest, ApiResponse, CardCheckout, HttpTransport, Method, Navigator, PaymentWidget,
    PortError, PortResult, Route, TokenStore, WidgetOutcome,
};
