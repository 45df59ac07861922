//! Key-value store adapters.
//!
//! [`KeyValueStore`] is a 1:1 mapping onto the store primitives the service
//! needs (`PING`, `GET`, `SET`, `SADD`). There are no retries, no pooling and
//! no batching here; every failure surfaces as a [`StoreError`].

use std::sync::Arc;

use async_trait::async_trait;
use shelf_kernel::settings::{StoreBackend, StoreSettings};
use thiserror::Error;

pub mod memory;
pub mod module;
pub mod redis_store;

pub use memory::MemoryStore;
pub use module::StoreModule;
pub use redis_store::RedisStore;

/// Token a healthy store answers `PING` with.
pub const PONG: &str = "PONG";

/// Any failure talking to the store. Kinds are not classified.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Operations the HTTP handlers run against the store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Liveness token.
    async fn ping(&self) -> Result<String, StoreError>;

    /// `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Create or overwrite `key`. Returns the store acknowledgement.
    async fn set(&self, key: &str, value: &str) -> Result<String, StoreError>;

    /// Add `member` to the set at `set_key`. Returns how many members were
    /// newly added (0 when it was already present).
    async fn sadd(&self, set_key: &str, member: &str) -> Result<i64, StoreError>;

    /// Release the connection. Safe to call repeatedly.
    async fn disconnect(&self) -> Result<(), StoreError>;
}

/// Build the store selected by `settings.backend`.
pub fn open(settings: &StoreSettings) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match settings.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisStore::connect(settings)?)),
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
