use async_trait::async_trait;
use eyre::Result;
use tokio::sync::mpsc;

use crate::config::models::HydratorConfig;

/// Trait for schema providers that can load and watch for schema changes.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Load the current schema configuration.
    async fn load_config(&self) -> Result<HydratorConfig>;

    /// Return a channel that signals when the schema has changed.
    /// The receiver should trigger a reload by calling `load_config`.
    fn watch(&self) -> mpsc::Receiver<()>;
}
