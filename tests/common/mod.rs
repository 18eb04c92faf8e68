//! Shared test doubles: a scripted interaction port, a recording
//! navigator, and a call-counting store wrapper.

// Each integration test binary compiles its own copy; not every helper
// is used by every binary.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use herbarium_core::error::RepositoryResult;
use herbarium_core::interaction::{InteractionPort, NavigatorPort};
use herbarium_core::model::{Entity, HierarchicalEntity};
use herbarium_core::store::{EntityStore, HierarchicalStore, InMemoryStore};

/// Interaction port with a scripted confirm answer and recorded calls.
#[derive(Default)]
pub struct ScriptedUi {
    accept: AtomicBool,
    pub confirms: Mutex<Vec<(String, String)>>,
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl ScriptedUi {
    pub fn accepting() -> Arc<Self> {
        let ui = Self::default();
        ui.accept.store(true, Ordering::SeqCst);
        Arc::new(ui)
    }

    pub fn declining() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn last_confirm_message(&self) -> Option<String> {
        self.confirms
            .lock()
            .expect("lock")
            .last()
            .map(|(_, message)| message.clone())
    }

    pub fn confirm_count(&self) -> usize {
        self.confirms.lock().expect("lock").len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().expect("lock").len()
    }
}

#[async_trait]
impl InteractionPort for ScriptedUi {
    async fn confirm(&self, title: &str, message: &str, _accept: &str, _cancel: &str) -> bool {
        self.confirms
            .lock()
            .expect("lock")
            .push((title.to_string(), message.to_string()));
        self.accept.load(Ordering::SeqCst)
    }

    async fn notify_success(&self, message: &str) {
        self.successes.lock().expect("lock").push(message.to_string());
    }

    async fn notify_error(&self, message: &str) {
        self.errors.lock().expect("lock").push(message.to_string());
    }
}

/// Navigator that records routes and back navigations.
#[derive(Default)]
pub struct RecordingNav {
    pub routes: Mutex<Vec<(String, Option<Value>)>>,
    pub backs: AtomicUsize,
}

impl RecordingNav {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn back_count(&self) -> usize {
        self.backs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NavigatorPort for RecordingNav {
    async fn go_to(&self, route: &str, params: Option<Value>) {
        self.routes
            .lock()
            .expect("lock")
            .push((route.to_string(), params));
    }

    async fn go_back(&self) {
        self.backs.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store wrapper counting every backend call, to prove protected paths
/// never reach the store.
pub struct CountingStore<T> {
    inner: Arc<InMemoryStore<T>>,
    pub fetches: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub removes: AtomicUsize,
}

impl<T: Entity> CountingStore<T> {
    pub fn new(inner: Arc<InMemoryStore<T>>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fetches: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        })
    }

    pub fn write_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for CountingStore<T> {
    async fn fetch_all(&self) -> RepositoryResult<Vec<T>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_all().await
    }

    async fn insert(&self, record: T) -> RepositoryResult<T> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(record).await
    }

    async fn update(&self, record: T) -> RepositoryResult<T> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(record).await
    }

    async fn remove(&self, id: Uuid) -> RepositoryResult<bool> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(id).await
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }
}

#[async_trait]
impl<T: HierarchicalEntity> HierarchicalStore<T> for CountingStore<T> {
    async fn fetch_by_parent(&self, parent_id: Uuid) -> RepositoryResult<Vec<T>> {
        self.inner.fetch_by_parent(parent_id).await
    }

    async fn count_by_parent(&self, parent_id: Uuid) -> RepositoryResult<u64> {
        self.inner.count_by_parent(parent_id).await
    }
}
