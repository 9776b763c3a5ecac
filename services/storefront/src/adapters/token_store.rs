//! services/storefront/src/adapters/token_store.rs
//!
//! Implementations of the `TokenStore` port: a JSON file for real sessions and
//! an in-memory store for ephemeral ones.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use storefront_core::domain::Credentials;
use storefront_core::ports::{PortError, PortResult, TokenStore};
use tokio::sync::Mutex;

//=========================================================================================
// File-backed Store
//=========================================================================================

/// Persists credentials as a single JSON document.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> PortResult<Credentials> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| PortError::Decode(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Credentials::default()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn save(&self, credentials: &Credentials) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let raw = serde_json::to_vec_pretty(credentials)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn clear(&self) -> PortResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

//=========================================================================================
// In-memory Store
//=========================================================================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credentials: Mutex<Credentials>,
}

impl MemoryTokenStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> PortResult<Credentials> {
        Ok(self.credentials.lock().await.clone())
    }

    async fn save(&self, credentials: &Credentials) -> PortResult<()> {
        *self.credentials.lock().await = credentials.clone();
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.credentials.lock().await = Credentials::default();
        Ok(())
    }
}
