use anyhow::Result;
use async_trait::async_trait;

use crate::component::SavedComponent;

/// Durable home of the saved collection.
///
/// The collection is always read and written whole; there is no incremental
/// write API.
#[async_trait]
pub trait ComponentRepository: Send + Sync {
    /// Read the full collection, newest first. Missing or unreadable data
    /// yields an empty collection.
    async fn load(&self) -> Vec<SavedComponent>;
    /// Replace the stored collection with `all`.
    async fn save(&self, all: &[SavedComponent]) -> Result<()>;
}
