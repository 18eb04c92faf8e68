//! In-memory reference backend.
//!
//! Stands in for the cloud store behind the same port: assigns identity
//! and timestamps on insert, supports parent-scoped queries, and honours
//! an on-delete cascade hook the way a foreign-key cascade would. Fault
//! injection (`set_offline`) makes transient-failure paths testable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{Entity, HierarchicalEntity};

use super::{EntityStore, HierarchicalStore};

/// Storage-layer cascade: invoked after a record is removed so dependent
/// records (children in another store) are removed too.
#[async_trait]
pub trait CascadeHook: Send + Sync {
    async fn on_parent_removed(&self, parent_id: Uuid);
}

/// HashMap-backed store for one entity type.
pub struct InMemoryStore<T> {
    records: RwLock<HashMap<Uuid, T>>,
    offline: AtomicBool,
    cascade: RwLock<Option<Arc<dyn CascadeHook>>>,
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            cascade: RwLock::new(None),
        })
    }

    /// Wire the on-delete cascade, typically [`CascadeTo`] a child store.
    pub async fn set_cascade(&self, hook: Arc<dyn CascadeHook>) {
        *self.cascade.write().await = Some(hook);
    }

    /// Fault injection: while offline every operation fails transiently.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seeds records directly, bypassing identity assignment.
    pub async fn seed<I: IntoIterator<Item = T>>(&self, records: I) {
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id(), record);
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_online(&self) -> RepositoryResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl<T: HierarchicalEntity> InMemoryStore<T> {
    /// Removes every child of `parent_id`. Used by cascade hooks; does not
    /// consult the offline flag since it models a storage-internal cascade.
    pub async fn remove_by_parent(&self, parent_id: Uuid) -> usize {
        let mut guard = self.records.write().await;
        let before = guard.len();
        guard.retain(|_, record| record.parent_id() != parent_id);
        before - guard.len()
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    async fn fetch_all(&self) -> RepositoryResult<Vec<T>> {
        self.check_online()?;
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn insert(&self, mut record: T) -> RepositoryResult<T> {
        self.check_online()?;
        if record.id().is_nil() {
            record.assign_identity(Uuid::new_v4(), Utc::now());
        }
        let mut guard = self.records.write().await;
        if guard.contains_key(&record.id()) {
            return Err(RepositoryError::Storage(format!(
                "duplicate id {}",
                record.id()
            )));
        }
        guard.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update(&self, mut record: T) -> RepositoryResult<T> {
        self.check_online()?;
        let mut guard = self.records.write().await;
        if !guard.contains_key(&record.id()) {
            return Err(RepositoryError::NotFound(record.id()));
        }
        record.touch(Utc::now());
        guard.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn remove(&self, id: Uuid) -> RepositoryResult<bool> {
        self.check_online()?;
        let removed = self.records.write().await.remove(&id).is_some();
        if removed {
            let hook = self.cascade.read().await.clone();
            if let Some(hook) = hook {
                hook.on_parent_removed(id).await;
            }
        }
        Ok(removed)
    }

    async fn ping(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: HierarchicalEntity> HierarchicalStore<T> for InMemoryStore<T> {
    async fn fetch_by_parent(&self, parent_id: Uuid) -> RepositoryResult<Vec<T>> {
        self.check_online()?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.parent_id() == parent_id)
            .cloned()
            .collect())
    }

    async fn count_by_parent(&self, parent_id: Uuid) -> RepositoryResult<u64> {
        self.check_online()?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.parent_id() == parent_id)
            .count() as u64)
    }
}

/// Cascade hook that purges children from another in-memory store.
pub struct CascadeTo<C: HierarchicalEntity> {
    children: Arc<InMemoryStore<C>>,
}

impl<C: HierarchicalEntity> CascadeTo<C> {
    pub fn new(children: Arc<InMemoryStore<C>>) -> Arc<Self> {
        Arc::new(Self { children })
    }
}

#[async_trait]
impl<C: HierarchicalEntity> CascadeHook for CascadeTo<C> {
    async fn on_parent_removed(&self, parent_id: Uuid) {
        let removed = self.children.remove_by_parent(parent_id).await;
        if removed > 0 {
            tracing::debug!(%parent_id, removed, "cascade removed child records");
        }
    }
}
