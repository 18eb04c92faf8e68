//! List session controller.
//!
//! One instance per collection screen: loads a filtered/sorted projection
//! through the shared repository, keeps per-row selection state, and owns
//! the safe-deletion flow (system-default protection, cascade-aware
//! consent, best-effort bulk delete).
//!
//! Multi-select is a two-state machine: `Browsing` until a long-press or
//! explicit toggle enters `Selecting`; it exits on explicit cancel or
//! implicitly whenever the selected count returns to zero.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cascade::{assess_delete, ChildCounter, DeleteImpact};
use crate::error::{SessionError, SessionResult};
use crate::interaction::{InteractionPort, NavigatorPort};
use crate::model::{Entity, EntityStats};
use crate::repository::{CachedRepository, StatusFilter};
use crate::sort::{sort_records, RowOrdering, SortOrder, StandardOrdering};
use crate::store::EntityStore;

/// Route the session navigates to when a row is opened for editing.
/// Route strings are opaque; the presentation layer owns the table.
pub const EDIT_ROUTE: &str = "entity/edit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Browsing,
    Selecting,
}

/// Row view-model: a read-mostly projection of one entity plus transient
/// UI-only selection state. Replaced wholesale when the entity changes.
#[derive(Debug, Clone)]
pub struct EntityRow<T> {
    pub entity: T,
    pub selected: bool,
}

impl<T: Entity> EntityRow<T> {
    fn new(entity: T) -> Self {
        Self {
            entity,
            selected: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.entity.id()
    }
}

pub struct ListSession<T: Entity, S: EntityStore<T>> {
    repo: Arc<CachedRepository<T, S>>,
    interaction: Arc<dyn InteractionPort>,
    navigator: Arc<dyn NavigatorPort>,
    /// Child-type repository for cascade consent; `None` for flat types.
    children: Option<Arc<dyn ChildCounter>>,
    ordering: Box<dyn RowOrdering<T>>,
    rows: Vec<EntityRow<T>>,
    search_text: String,
    status_filter: StatusFilter,
    sort_order: SortOrder,
    selection: SelectionMode,
    total_count: usize,
    active_count: usize,
    is_busy: bool,
    backend_online: Arc<AtomicBool>,
}

impl<T, S> ListSession<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    pub fn new(
        repo: Arc<CachedRepository<T, S>>,
        interaction: Arc<dyn InteractionPort>,
        navigator: Arc<dyn NavigatorPort>,
    ) -> Self {
        Self {
            repo,
            interaction,
            navigator,
            children: None,
            ordering: Box::new(StandardOrdering),
            rows: Vec::new(),
            search_text: String::new(),
            status_filter: StatusFilter::All,
            sort_order: SortOrder::default(),
            selection: SelectionMode::Browsing,
            total_count: 0,
            active_count: 0,
            is_busy: false,
            backend_online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Wires the child-type repository so deletions gather cascade
    /// consent. Without it the type is treated as flat.
    pub fn with_children(mut self, children: Arc<dyn ChildCounter>) -> Self {
        self.children = Some(children);
        self
    }

    /// Replaces the sort strategy with an entity-specific one.
    pub fn with_ordering(mut self, ordering: Box<dyn RowOrdering<T>>) -> Self {
        self.ordering = ordering;
        self
    }

    // -----------------------------------------------------------------
    // Loading, filtering, sorting
    // -----------------------------------------------------------------

    /// Loads the projection for the current search text and status
    /// filter. Transient read failures downgrade connectivity and keep
    /// whatever is on screen; browsing cached data is never blocked.
    pub async fn load(&mut self) {
        if self.is_busy {
            return;
        }
        self.is_busy = true;
        let search = if self.search_text.trim().is_empty() {
            None
        } else {
            Some(self.search_text.as_str())
        };
        match self.repo.get_filtered(search, self.status_filter).await {
            Ok(mut records) => {
                sort_records(&mut records, self.sort_order, self.ordering.as_ref());
                self.rows = records.into_iter().map(EntityRow::new).collect();
                self.recompute_counts();
                debug!(kind = T::KIND, rows = self.rows.len(), "list loaded");
            }
            Err(err) if err.is_transient() => {
                warn!(kind = T::KIND, %err, "load degraded to offline browsing");
                self.backend_online.store(false, Ordering::SeqCst);
            }
            Err(err) => {
                error!(kind = T::KIND, %err, "list load failed");
                self.interaction.notify_error(&err.to_string()).await;
            }
        }
        self.is_busy = false;
    }

    pub async fn search(&mut self, text: &str) {
        self.search_text = text.to_string();
        self.load().await;
    }

    pub async fn clear_search(&mut self) {
        self.search_text.clear();
        self.load().await;
    }

    pub async fn filter_by_status(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.load().await;
    }

    /// Re-sorts in place; no repository round trip.
    pub fn sort(&mut self, order: SortOrder) {
        self.sort_order = order;
        let ordering = &*self.ordering;
        self.rows.sort_by(|a, b| {
            ordering
                .compare(&a.entity, &b.entity, order)
                .unwrap_or_else(|| crate::sort::standard_compare(&a.entity, &b.entity, order))
        });
    }

    /// Forces a cache refresh, then reloads.
    pub async fn refresh(&mut self) {
        if let Err(err) = self.repo.refresh_cache().await {
            if err.is_transient() {
                warn!(kind = T::KIND, %err, "refresh degraded to offline browsing");
                self.backend_online.store(false, Ordering::SeqCst);
                return;
            }
            error!(kind = T::KIND, %err, "refresh failed");
            self.interaction.notify_error(&err.to_string()).await;
            return;
        }
        self.load().await;
    }

    // -----------------------------------------------------------------
    // Selection machine
    // -----------------------------------------------------------------

    /// Explicit entry/exit. Leaving clears every selection.
    pub fn toggle_multi_select(&mut self) {
        match self.selection {
            SelectionMode::Browsing => self.selection = SelectionMode::Selecting,
            SelectionMode::Selecting => self.exit_selection(),
        }
    }

    /// Tap opens the row for editing while browsing, toggles selection
    /// while selecting.
    pub async fn item_tapped(&mut self, id: Uuid) {
        match self.selection {
            SelectionMode::Browsing => {
                self.navigator
                    .go_to(EDIT_ROUTE, Some(json!({ "id": id })))
                    .await;
            }
            SelectionMode::Selecting => self.toggle_selected(id),
        }
    }

    /// Long-press enters selection mode with the pressed row selected.
    pub fn item_long_pressed(&mut self, id: Uuid) {
        if self.selection == SelectionMode::Browsing {
            self.selection = SelectionMode::Selecting;
        }
        if let Some(row) = self.rows.iter_mut().find(|row| row.id() == id) {
            row.selected = true;
        }
    }

    fn toggle_selected(&mut self, id: Uuid) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.id() == id) {
            row.selected = !row.selected;
        }
        // Deselecting the last row implicitly leaves selection mode.
        if self.selected_count() == 0 {
            self.selection = SelectionMode::Browsing;
        }
    }

    pub fn select_all(&mut self) {
        if self.selection == SelectionMode::Browsing {
            self.selection = SelectionMode::Selecting;
        }
        for row in &mut self.rows {
            row.selected = true;
        }
        if self.rows.is_empty() {
            self.selection = SelectionMode::Browsing;
        }
    }

    /// Clears every selection and exits selection mode.
    pub fn deselect_all(&mut self) {
        self.exit_selection();
    }

    fn exit_selection(&mut self) {
        for row in &mut self.rows {
            row.selected = false;
        }
        self.selection = SelectionMode::Browsing;
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|row| row.selected).count()
    }

    fn selected_ids(&self) -> Vec<Uuid> {
        self.rows
            .iter()
            .filter(|row| row.selected)
            .map(|row| row.id())
            .collect()
    }

    // -----------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------

    /// Deletes one record after cascade-aware consent. System defaults
    /// are rejected before any repository call.
    pub async fn delete(&mut self, id: Uuid) -> bool {
        match self.try_delete(id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                error!(kind = T::KIND, %id, %err, "delete failed");
                self.interaction.notify_error(&err.to_string()).await;
                false
            }
        }
    }

    async fn try_delete(&mut self, id: Uuid) -> SessionResult<bool> {
        let Some(row) = self.rows.iter().find(|row| row.id() == id) else {
            return Err(SessionError::Missing(id));
        };
        if row.entity.is_system_default() {
            return Err(SessionError::SystemDefaultProtected);
        }
        let name = row.entity.name().to_string();

        let impact = self.assess(&[id]).await?;
        let accepted = self
            .interaction
            .confirm(
                &format!("Delete '{name}'?"),
                &impact.confirmation_message(T::KIND, self.child_label()),
                "Delete",
                "Cancel",
            )
            .await;
        if !accepted {
            debug!(kind = T::KIND, %id, "delete declined");
            return Ok(false);
        }

        if !self.repo.delete(id).await? {
            return Err(SessionError::Missing(id));
        }
        if let Some(children) = &self.children {
            children.invalidate().await;
        }
        self.rows.retain(|row| row.id() != id);
        self.recompute_counts();
        info!(kind = T::KIND, %id, "deleted");
        self.interaction
            .notify_success(&format!("Deleted '{name}'."))
            .await;
        Ok(true)
    }

    /// Bulk delete of the current selection: one cascade-aware consent
    /// with summed child counts, then a best-effort batch. Reports the
    /// count actually removed and leaves selection mode.
    pub async fn delete_selected(&mut self) -> usize {
        match self.try_delete_selected().await {
            Ok(removed) => removed,
            Err(err) => {
                error!(kind = T::KIND, %err, "bulk delete failed");
                self.interaction.notify_error(&err.to_string()).await;
                0
            }
        }
    }

    async fn try_delete_selected(&mut self) -> SessionResult<usize> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Ok(0);
        }
        if self
            .rows
            .iter()
            .any(|row| row.selected && row.entity.is_system_default())
        {
            return Err(SessionError::SystemDefaultProtected);
        }

        let impact = self.assess(&ids).await?;
        let accepted = self
            .interaction
            .confirm(
                &format!("Delete {} selected?", ids.len()),
                &impact.confirmation_message(T::KIND, self.child_label()),
                "Delete",
                "Cancel",
            )
            .await;
        if !accepted {
            return Ok(0);
        }

        let removed = self.repo.delete_multiple(&ids).await;
        if removed > 0 {
            if let Some(children) = &self.children {
                children.invalidate().await;
            }
        }
        if removed < ids.len() {
            warn!(
                kind = T::KIND,
                requested = ids.len(),
                removed,
                "bulk delete partially succeeded"
            );
        }
        self.exit_selection();
        // Reload from the repository cache: only the records actually
        // removed are gone, so partial failures stay visible.
        self.load().await;
        self.interaction
            .notify_success(&format!("Deleted {removed} of {} selected.", ids.len()))
            .await;
        Ok(removed)
    }

    async fn assess(&self, ids: &[Uuid]) -> SessionResult<DeleteImpact> {
        match &self.children {
            Some(children) => Ok(assess_delete(children.as_ref(), ids).await?),
            None => Ok(DeleteImpact::flat(ids.len())),
        }
    }

    fn child_label(&self) -> &'static str {
        self.children
            .as_ref()
            .map(|children| children.child_label())
            .unwrap_or("child")
    }

    // -----------------------------------------------------------------
    // Row mutation
    // -----------------------------------------------------------------

    /// Flips the favorite flag through the repository and replaces the
    /// row view-model wholesale, preserving its selection state.
    pub async fn toggle_favorite(&mut self, id: Uuid) {
        let Some(index) = self.rows.iter().position(|row| row.id() == id) else {
            return;
        };
        let mut updated = self.rows[index].entity.clone();
        updated.set_favorite(!updated.is_favorite());
        match self.repo.update(updated).await {
            Ok(stored) => {
                let selected = self.rows[index].selected;
                self.rows[index] = EntityRow {
                    entity: stored,
                    selected,
                };
            }
            Err(err) => {
                error!(kind = T::KIND, %id, %err, "favorite toggle failed");
                self.interaction.notify_error(&err.to_string()).await;
            }
        }
    }

    // -----------------------------------------------------------------
    // Connectivity
    // -----------------------------------------------------------------

    /// Fire-and-forget liveness probe. Only updates the online flag; the
    /// caller is never blocked.
    pub fn probe_connectivity(&self) {
        let repo = Arc::clone(&self.repo);
        let online = Arc::clone(&self.backend_online);
        tokio::spawn(async move {
            let alive = repo.test_connection().await;
            online.store(alive, Ordering::SeqCst);
            debug!(kind = T::KIND, alive, "connectivity probe");
        });
    }

    /// Adding records requires a reachable backend; browsing does not.
    pub fn can_add(&self) -> bool {
        self.backend_online.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------
    // Observable state
    // -----------------------------------------------------------------

    fn recompute_counts(&mut self) {
        self.total_count = self.rows.len();
        self.active_count = self
            .rows
            .iter()
            .filter(|row| row.entity.is_active())
            .count();
    }

    pub fn rows(&self) -> &[EntityRow<T>] {
        &self.rows
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection
    }

    pub fn is_selecting(&self) -> bool {
        self.selection == SelectionMode::Selecting
    }

    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub async fn stats(&self) -> EntityStats {
        self.repo.stats().await
    }
}
