//! Persistence port.
//!
//! The cloud backend is an external collaborator; the framework only
//! depends on these operation contracts. [`InMemoryStore`] is the
//! reference backend used by tests and offline demos.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::model::{Entity, HierarchicalEntity};

pub mod memory;

pub use memory::InMemoryStore;

/// Backend contract for one entity type.
///
/// Identity and timestamps are owned by the store: `insert` assigns them
/// when absent, `update` refreshes `updated_at` on every mutation. Both
/// return the canonical stored form.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync + 'static {
    async fn fetch_all(&self) -> RepositoryResult<Vec<T>>;

    async fn insert(&self, record: T) -> RepositoryResult<T>;

    async fn update(&self, record: T) -> RepositoryResult<T>;

    /// Removes one record; `false` when nothing matched.
    async fn remove(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Liveness probe. Never mutates state.
    async fn ping(&self) -> bool;
}

/// Backend contract for entity types with a required parent.
#[async_trait]
pub trait HierarchicalStore<T: HierarchicalEntity>: EntityStore<T> {
    async fn fetch_by_parent(&self, parent_id: Uuid) -> RepositoryResult<Vec<T>>;

    /// Child count including inactive records. Drives the cascade-delete
    /// confirmation; deletion itself rides the storage layer's cascade.
    async fn count_by_parent(&self, parent_id: Uuid) -> RepositoryResult<u64>;
}
