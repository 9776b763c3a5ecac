pub mod admin;
pub mod cart;
pub mod category_tree;
pub mod checkout;
pub mod feedback;
pub mod orders;
pub mod search;
pub mod session;
pub mod state;

pub use state::AppState;
