pub mod http;
pub mod navigator;
pub mod token_store;

pub use http::ReqwestTransport;
pub use navigator::RecordingNavigator;
pub use token_store::{FileTokenStore, MemoryTokenStore};
