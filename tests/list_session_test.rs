//! List session scenarios: filtered loading, the multi-select machine,
//! cascade-aware deletion, favorite toggling, and connectivity handling.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use uuid::Uuid;

use common::{CountingStore, RecordingNav, ScriptedUi};
use herbarium_core::cascade::ChildCounter;
use herbarium_core::model::taxa::{Family, Genus};
use herbarium_core::model::{Entity, EntityFields};
use herbarium_core::repository::{CachedRepository, StatusFilter};
use herbarium_core::session::{ListSession, SelectionMode};
use herbarium_core::sort::SortOrder;
use herbarium_core::store::memory::CascadeTo;
use herbarium_core::store::{EntityStore, InMemoryStore};

struct Fixture {
    families_inner: Arc<InMemoryStore<Family>>,
    families_store: Arc<CountingStore<Family>>,
    families: Arc<CachedRepository<Family, CountingStore<Family>>>,
    genera_inner: Arc<InMemoryStore<Genus>>,
    genera: Arc<CachedRepository<Genus, InMemoryStore<Genus>>>,
    ui: Arc<ScriptedUi>,
    nav: Arc<RecordingNav>,
    owner: Uuid,
}

impl Fixture {
    async fn new() -> Self {
        let families_inner = InMemoryStore::new();
        let genera_inner: Arc<InMemoryStore<Genus>> = InMemoryStore::new();
        families_inner
            .set_cascade(CascadeTo::new(genera_inner.clone()))
            .await;
        let families_store = CountingStore::new(families_inner.clone());
        let owner = Uuid::new_v4();
        Self {
            families: CachedRepository::new(families_store.clone(), Some(owner)),
            genera: CachedRepository::new(genera_inner.clone(), Some(owner)),
            families_inner,
            families_store,
            genera_inner,
            ui: ScriptedUi::accepting(),
            nav: RecordingNav::new(),
            owner,
        }
    }

    async fn seed_family(&self, name: &str, active: bool, owner: Option<Uuid>) -> Family {
        self.families_inner
            .insert(Family::new_record(
                owner,
                &EntityFields {
                    name: name.into(),
                    is_active: active,
                    ..Default::default()
                },
            ))
            .await
            .expect("seed family")
    }

    async fn seed_genus(&self, name: &str, family_id: Uuid) {
        self.genera_inner
            .insert(Genus::new_record(
                Some(self.owner),
                &EntityFields {
                    name: name.into(),
                    parent_id: Some(family_id),
                    ..Default::default()
                },
            ))
            .await
            .expect("seed genus");
    }

    fn session(&self) -> ListSession<Family, CountingStore<Family>> {
        ListSession::new(self.families.clone(), self.ui.clone(), self.nav.clone())
            .with_children(self.genera.clone() as Arc<dyn ChildCounter>)
    }
}

#[tokio::test]
async fn test_load_applies_filter_and_sort() {
    let fx = Fixture::new().await;
    fx.seed_family("Rosaceae", true, Some(fx.owner)).await;
    fx.seed_family("Orchidaceae", true, Some(fx.owner)).await;
    fx.seed_family("Asteraceae", false, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;
    assert_eq!(session.total_count(), 3);
    assert_eq!(session.active_count(), 2);
    let names: Vec<&str> = session.rows().iter().map(|r| r.entity.name()).collect();
    assert_eq!(names, ["Asteraceae", "Orchidaceae", "Rosaceae"]);

    session.filter_by_status(StatusFilter::ActiveOnly).await;
    assert_eq!(session.total_count(), 2);

    session.search("orchid").await;
    assert_eq!(session.total_count(), 1);
    assert_eq!(session.rows()[0].entity.name(), "Orchidaceae");

    session.clear_search().await;
    session.sort(SortOrder::NameDescending);
    assert_eq!(session.rows()[0].entity.name(), "Rosaceae");
}

#[tokio::test]
async fn test_tap_navigates_while_browsing_and_selects_while_selecting() {
    let fx = Fixture::new().await;
    let rose = fx.seed_family("Rosaceae", true, Some(fx.owner)).await;
    fx.seed_family("Orchidaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;

    session.item_tapped(rose.id()).await;
    assert_eq!(fx.nav.routes.lock().expect("lock").len(), 1);

    session.item_long_pressed(rose.id());
    assert_eq!(session.selection_mode(), SelectionMode::Selecting);
    assert_eq!(session.selected_count(), 1);

    // Tapping now toggles instead of navigating; deselecting the last row
    // leaves selection mode implicitly.
    session.item_tapped(rose.id()).await;
    assert_eq!(session.selected_count(), 0);
    assert_eq!(session.selection_mode(), SelectionMode::Browsing);
    assert_eq!(fx.nav.routes.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn test_select_all_then_deselect_all_exits_selection() {
    let fx = Fixture::new().await;
    fx.seed_family("Rosaceae", true, Some(fx.owner)).await;
    fx.seed_family("Orchidaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;

    session.select_all();
    assert_eq!(session.selection_mode(), SelectionMode::Selecting);
    assert_eq!(session.selected_count(), 2);

    session.deselect_all();
    assert_eq!(session.selected_count(), 0);
    assert_eq!(session.selection_mode(), SelectionMode::Browsing);
}

#[tokio::test]
async fn test_favorite_double_toggle_round_trips_and_keeps_selection() {
    let fx = Fixture::new().await;
    let rose = fx.seed_family("Rosaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;
    session.item_long_pressed(rose.id());
    assert!(session.rows()[0].selected);
    let original = session.rows()[0].entity.is_favorite();

    session.toggle_favorite(rose.id()).await;
    assert_eq!(session.rows()[0].entity.is_favorite(), !original);
    assert!(session.rows()[0].selected, "selection survives replacement");

    session.toggle_favorite(rose.id()).await;
    assert_eq!(session.rows()[0].entity.is_favorite(), original);
    assert!(session.rows()[0].selected);
}

#[tokio::test]
async fn test_delete_parent_with_three_children_mentions_count() {
    let fx = Fixture::new().await;
    let orchids = fx.seed_family("Orchidaceae", true, Some(fx.owner)).await;
    for name in ["Phalaenopsis", "Dendrobium", "Vanda"] {
        fx.seed_genus(name, orchids.id()).await;
    }

    let mut session = fx.session();
    session.load().await;

    assert!(session.delete(orchids.id()).await);
    let message = fx.ui.last_confirm_message().expect("confirmation shown");
    assert!(message.contains('3'), "escalated consent names the count: {message}");
    assert!(message.contains("genus"));

    assert_eq!(session.total_count(), 0);
    assert!(fx.genera_inner.is_empty().await, "cascade removed the genera");
}

#[tokio::test]
async fn test_delete_childless_record_gets_plain_confirmation() {
    let fx = Fixture::new().await;
    let rose = fx.seed_family("Rosaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;
    assert!(session.delete(rose.id()).await);

    let message = fx.ui.last_confirm_message().expect("confirmation shown");
    assert!(!message.contains("also be removed"));
}

#[tokio::test]
async fn test_declined_confirmation_deletes_nothing() {
    let fx = Fixture::new().await;
    let rose = fx.seed_family("Rosaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;
    fx.ui.set_accept(false);

    assert!(!session.delete(rose.id()).await);
    assert_eq!(session.total_count(), 1);
    assert_eq!(fx.families_store.removes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_system_default_delete_rejected_before_any_backend_call() {
    let fx = Fixture::new().await;
    let shared = fx.seed_family("Asteraceae", true, None).await;

    let mut session = fx.session();
    session.load().await;
    let writes_before = fx.families_store.write_calls();

    assert!(!session.delete(shared.id()).await);
    assert_eq!(fx.ui.confirm_count(), 0, "no confirmation for protected records");
    assert_eq!(fx.families_store.write_calls(), writes_before);
    assert!(fx
        .ui
        .errors
        .lock()
        .expect("lock")
        .last()
        .expect("error shown")
        .contains("system default"));
    assert_eq!(session.total_count(), 1);
}

#[tokio::test]
async fn test_bulk_delete_sums_child_counts_and_exits_selection() {
    let fx = Fixture::new().await;
    let orchids = fx.seed_family("Orchidaceae", true, Some(fx.owner)).await;
    let roses = fx.seed_family("Rosaceae", true, Some(fx.owner)).await;
    fx.seed_genus("Phalaenopsis", orchids.id()).await;
    fx.seed_genus("Dendrobium", orchids.id()).await;
    fx.seed_genus("Rosa", roses.id()).await;

    let mut session = fx.session();
    session.load().await;
    session.select_all();

    assert_eq!(session.delete_selected().await, 2);
    let message = fx.ui.last_confirm_message().expect("confirmation shown");
    assert!(message.contains('3'), "summed child count: {message}");

    assert_eq!(session.selection_mode(), SelectionMode::Browsing);
    assert_eq!(session.total_count(), 0);
    assert!(fx.genera_inner.is_empty().await);
}

#[tokio::test]
async fn test_connectivity_probe_downgrades_add_affordance() {
    let fx = Fixture::new().await;
    fx.seed_family("Rosaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;
    assert!(session.can_add());

    fx.families_inner.set_offline(true);
    session.probe_connectivity();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!session.can_add());

    // Browsing already-cached data still works.
    session.load().await;
    assert_eq!(session.total_count(), 1);
}

#[tokio::test]
async fn test_refresh_while_offline_keeps_cached_rows() {
    let fx = Fixture::new().await;
    fx.seed_family("Rosaceae", true, Some(fx.owner)).await;

    let mut session = fx.session();
    session.load().await;
    assert_eq!(session.total_count(), 1);

    fx.families_inner.set_offline(true);
    session.refresh().await;
    assert_eq!(session.total_count(), 1, "stale cache still browsable");
}
