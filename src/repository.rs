//! Caching repository layer.
//!
//! One [`CachedRepository`] per entity type, shared as an `Arc` across
//! every live session of that type. It owns the authoritative in-memory
//! cache for its lifetime: sessions never mutate entities directly, all
//! writes flow through here so invalidation from one session is visible
//! to the next read from any other.
//!
//! Cache rules:
//! - read-through with a stale flag; `invalidate_cache` marks stale
//!   without fetching, `refresh_cache` discards and re-fetches.
//! - a failed write never mutates the cache.
//! - transient fetch failures fall back to previously loaded entries so
//!   browsing continues against the cache while offline.
//! - stats are recomputed on every cache mutation or refresh.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::model::{Entity, EntityStats, HierarchicalEntity};
use crate::store::{EntityStore, HierarchicalStore};

/// Active/inactive partition applied by filtered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    ActiveOnly,
    InactiveOnly,
}

impl StatusFilter {
    fn matches<T: Entity>(self, record: &T) -> bool {
        match self {
            Self::All => true,
            Self::ActiveOnly => record.is_active(),
            Self::InactiveOnly => !record.is_active(),
        }
    }
}

#[derive(Debug)]
struct Cache<T> {
    entries: Vec<T>,
    loaded: bool,
    stale: bool,
    stats: EntityStats,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            loaded: false,
            stale: false,
            stats: EntityStats::default(),
        }
    }
}

/// Caching repository for one entity type, generic over the backend port.
pub struct CachedRepository<T, S> {
    store: Arc<S>,
    owner_id: Option<Uuid>,
    cache: RwLock<Cache<T>>,
}

impl<T, S> CachedRepository<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    /// `owner_id` is the signed-in principal; new records are stamped
    /// with it. `None` builds a repository over shared system records.
    pub fn new(store: Arc<S>, owner_id: Option<Uuid>) -> Arc<Self> {
        Arc::new(Self {
            store,
            owner_id,
            cache: RwLock::new(Cache::default()),
        })
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    /// Loads the cache when missing or stale. On a transient fetch failure
    /// with previously loaded entries the stale data is kept and served.
    async fn ensure_loaded(&self) -> RepositoryResult<()> {
        {
            let cache = self.cache.read().await;
            if cache.loaded && !cache.stale {
                return Ok(());
            }
        }
        let mut cache = self.cache.write().await;
        // Another session may have refreshed while we waited for the lock.
        if cache.loaded && !cache.stale {
            return Ok(());
        }
        match self.store.fetch_all().await {
            Ok(entries) => {
                cache.stats = EntityStats::collect(&entries);
                cache.entries = entries;
                cache.loaded = true;
                cache.stale = false;
                debug!(kind = T::KIND, total = cache.stats.total, "cache refreshed");
                Ok(())
            }
            Err(err) if err.is_transient() && cache.loaded => {
                warn!(kind = T::KIND, %err, "fetch failed, serving stale cache");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_all(&self, include_inactive: bool) -> RepositoryResult<Vec<T>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache
            .entries
            .iter()
            .filter(|record| include_inactive || record.is_active())
            .cloned()
            .collect())
    }

    /// Case-insensitive substring match over name and description, with an
    /// optional active/inactive partition. Order is unspecified; callers
    /// re-sort.
    pub async fn get_filtered(
        &self,
        search_text: Option<&str>,
        status: StatusFilter,
    ) -> RepositoryResult<Vec<T>> {
        self.ensure_loaded().await?;
        let needle = search_text
            .map(|text| text.trim().to_lowercase())
            .filter(|text| !text.is_empty());
        let cache = self.cache.read().await;
        Ok(cache
            .entries
            .iter()
            .filter(|record| status.matches(*record))
            .filter(|record| match &needle {
                None => true,
                Some(needle) => {
                    record.name().to_lowercase().contains(needle)
                        || record
                            .description()
                            .map(|d| d.to_lowercase().contains(needle))
                            .unwrap_or(false)
                }
            })
            .cloned()
            .collect())
    }

    /// Point lookup; `None` signals not-found rather than an error.
    pub async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<T>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache.entries.iter().find(|record| record.id() == id).cloned())
    }

    /// Persists a new record and inserts the canonical stored form into
    /// the cache. The store assigns identity and timestamps when absent.
    pub async fn create(&self, record: T) -> RepositoryResult<T> {
        let stored = self.store.insert(record).await?;
        let mut cache = self.cache.write().await;
        if cache.loaded {
            cache.entries.push(stored.clone());
            cache.stats = EntityStats::collect(&cache.entries);
        }
        debug!(kind = T::KIND, id = %stored.id(), "created");
        Ok(stored)
    }

    /// Persists by id, refreshes `updated_at`, and updates the cache entry.
    pub async fn update(&self, record: T) -> RepositoryResult<T> {
        let stored = self.store.update(record).await?;
        let mut cache = self.cache.write().await;
        if cache.loaded {
            if let Some(entry) = cache
                .entries
                .iter_mut()
                .find(|entry| entry.id() == stored.id())
            {
                *entry = stored.clone();
            }
            cache.stats = EntityStats::collect(&cache.entries);
        }
        debug!(kind = T::KIND, id = %stored.id(), "updated");
        Ok(stored)
    }

    /// Removes one record; returns whether anything was removed.
    pub async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        let removed = self.store.remove(id).await?;
        if removed {
            let mut cache = self.cache.write().await;
            if cache.loaded {
                cache.entries.retain(|entry| entry.id() != id);
                cache.stats = EntityStats::collect(&cache.entries);
            }
            debug!(kind = T::KIND, %id, "deleted");
        }
        Ok(removed)
    }

    /// Best-effort batch delete: per-item failures are logged and skipped,
    /// not rolled back. Returns the count actually removed.
    pub async fn delete_multiple(&self, ids: &[Uuid]) -> usize {
        let mut removed_ids = Vec::new();
        for &id in ids {
            match self.store.remove(id).await {
                Ok(true) => removed_ids.push(id),
                Ok(false) => {}
                Err(err) => warn!(kind = T::KIND, %id, %err, "batch delete item failed"),
            }
        }
        if !removed_ids.is_empty() {
            let mut cache = self.cache.write().await;
            if cache.loaded {
                cache.entries.retain(|entry| !removed_ids.contains(&entry.id()));
                cache.stats = EntityStats::collect(&cache.entries);
            }
        }
        removed_ids.len()
    }

    /// Case-insensitive name lookup within the parent scope, served from
    /// the cached entity list to avoid a round trip when possible. The
    /// scope spans every cached record, shared system defaults included,
    /// so a user record cannot shadow a default's name.
    pub async fn name_exists(
        &self,
        name: &str,
        exclude: Option<Uuid>,
        parent_scope: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        self.ensure_loaded().await?;
        let needle = name.trim().to_lowercase();
        let cache = self.cache.read().await;
        Ok(cache.entries.iter().any(|record| {
            record.parent_scope() == parent_scope
                && Some(record.id()) != exclude
                && record.name().trim().to_lowercase() == needle
        }))
    }

    /// Forces a full re-fetch. On success the cached entries are replaced
    /// wholesale; on a transient failure the stale entries survive so
    /// browsing can continue offline.
    pub async fn refresh_cache(&self) -> RepositoryResult<()> {
        self.invalidate_cache().await;
        self.ensure_loaded().await
    }

    /// Marks the cache stale without re-fetching; the next read hits the
    /// backing store. Used when another subsystem mutated the backend.
    pub async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.stale = true;
        debug!(kind = T::KIND, "cache invalidated");
    }

    /// Liveness probe; never mutates state.
    pub async fn test_connection(&self) -> bool {
        self.store.ping().await
    }

    /// Snapshot of the counts computed at the last cache refresh.
    pub async fn stats(&self) -> EntityStats {
        self.cache.read().await.stats
    }
}

impl<T, S> CachedRepository<T, S>
where
    T: HierarchicalEntity,
    S: HierarchicalStore<T>,
{
    pub async fn get_by_parent_id(
        &self,
        parent_id: Uuid,
        include_inactive: bool,
    ) -> RepositoryResult<Vec<T>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache
            .entries
            .iter()
            .filter(|record| record.parent_id() == parent_id)
            .filter(|record| include_inactive || record.is_active())
            .cloned()
            .collect())
    }

    /// Child count for cascade-delete consent; inactive children count.
    /// Served from a fresh cache, otherwise asks the store directly.
    pub async fn get_count_by_parent_id(&self, parent_id: Uuid) -> RepositoryResult<u64> {
        {
            let cache = self.cache.read().await;
            if cache.loaded && !cache.stale {
                return Ok(cache
                    .entries
                    .iter()
                    .filter(|record| record.parent_id() == parent_id)
                    .count() as u64);
            }
        }
        self.store.count_by_parent(parent_id).await
    }
}
