pub mod adapters;
pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod error;

#[cfg(test)]
mod testing;
