use std::sync::Arc;

use async_trait::async_trait;
use shelf_kernel::{InitCtx, Module};

use crate::{KeyValueStore, PONG};

/// Core module owning the store connection lifecycle: pinged at init,
/// disconnected at stop.
pub struct StoreModule {
    store: Arc<dyn KeyValueStore>,
}

impl StoreModule {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for StoreModule {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        // Unreachable stores are not fatal; requests fail individually.
        match self.store.ping().await {
            Ok(token) if token == PONG => tracing::info!(
                module = self.name(),
                address = %ctx.settings.store.address(),
                "store reachable"
            ),
            Ok(token) => tracing::warn!(
                module = self.name(),
                token = %token,
                "store answered ping with an unexpected token"
            ),
            Err(err) => tracing::warn!(
                module = self.name(),
                address = %ctx.settings.store.address(),
                error = %err,
                "store unreachable at startup"
            ),
        }
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.store.disconnect().await?;
        tracing::info!(module = self.name(), "store disconnected");
        Ok(())
    }
}
