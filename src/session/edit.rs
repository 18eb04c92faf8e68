//! Edit session controller.
//!
//! One instance per form visit, covering both Create and Edit of a single
//! entity. The lifecycle is an explicit phase machine:
//!
//! ```text
//! {Create | Edit: fetch + populate} -> Ready
//! Ready -> (name/parent edit) -> Validating -> Ready
//! Ready -> Saving -> {Closed | Ready on failure}
//! Ready -> cancel (+ discard confirmation when dirty) -> Closed
//! ```
//!
//! `Populating` is a real phase, not a suppression flag: while it holds,
//! field setters record values without marking the session dirty or
//! scheduling validation, so bulk form population is never observed as N
//! separate user edits. The previous phase is restored when population
//! ends.
//!
//! Name validation is debounced: a keystroke re-arms a single in-flight
//! timer, the check runs on a background task against the repository's
//! cached entity list, and the outcome is marshalled back through the
//! session's event channel with a generation stamp so superseded results
//! are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult, ValidationError};
use crate::interaction::{InteractionPort, NavigatorPort};
use crate::model::{Entity, EntityFields};
use crate::repository::CachedRepository;
use crate::store::EntityStore;
use crate::validate::{self, NameRules};

use super::debounce::{Debouncer, DEFAULT_QUIET_PERIOD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Bulk field population; change tracking and validation are off.
    Populating,
    Ready,
    /// A debounced name check is pending or in flight.
    Validating,
    Saving,
    Closed,
}

/// Result of the last completed name check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameStatus {
    Unchecked,
    Valid,
    Invalid(ValidationError),
}

/// Out-of-band events marshalled back onto the session's owning task.
#[derive(Debug)]
pub enum EditEvent {
    NameChecked {
        generation: u64,
        name: String,
        result: Result<(), ValidationError>,
    },
}

pub struct EditSession<T: Entity, S: EntityStore<T>> {
    repo: Arc<CachedRepository<T, S>>,
    interaction: Arc<dyn InteractionPort>,
    navigator: Arc<dyn NavigatorPort>,
    mode: EditMode,
    phase: Phase,
    form: EntityFields,
    original: Option<T>,
    has_unsaved_changes: bool,
    name_status: NameStatus,
    rules: NameRules,
    debouncer: Debouncer,
    events_tx: UnboundedSender<EditEvent>,
    events_rx: UnboundedReceiver<EditEvent>,
    // Diagnostics exposed for bindings and tests.
    checks_completed: u64,
    last_checked_name: Option<String>,
}

impl<T, S> EditSession<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    fn with_mode(
        repo: Arc<CachedRepository<T, S>>,
        interaction: Arc<dyn InteractionPort>,
        navigator: Arc<dyn NavigatorPort>,
        mode: EditMode,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            repo,
            interaction,
            navigator,
            mode,
            phase: Phase::Ready,
            form: EntityFields::default(),
            original: None,
            has_unsaved_changes: false,
            name_status: NameStatus::Unchecked,
            rules: NameRules::default(),
            debouncer: Debouncer::new(DEFAULT_QUIET_PERIOD),
            events_tx,
            events_rx,
            checks_completed: 0,
            last_checked_name: None,
        }
    }

    /// New-record session. Fields default immediately; the session is
    /// `Ready` with nothing unsaved.
    pub fn for_create(
        repo: Arc<CachedRepository<T, S>>,
        interaction: Arc<dyn InteractionPort>,
        navigator: Arc<dyn NavigatorPort>,
    ) -> Self {
        Self::with_mode(repo, interaction, navigator, EditMode::Create)
    }

    /// New-record session pre-scoped to a parent, for hierarchical
    /// entities and batch-entry workflows.
    pub fn for_create_in_parent(
        repo: Arc<CachedRepository<T, S>>,
        interaction: Arc<dyn InteractionPort>,
        navigator: Arc<dyn NavigatorPort>,
        parent_id: Uuid,
    ) -> Self {
        let mut session = Self::with_mode(repo, interaction, navigator, EditMode::Create);
        session.populate(EntityFields {
            parent_id: Some(parent_id),
            ..EntityFields::default()
        });
        session
    }

    /// Edit session over an existing record. Editing a since-deleted id
    /// is a blocking error; the session never reaches `Ready`.
    pub async fn for_edit(
        repo: Arc<CachedRepository<T, S>>,
        interaction: Arc<dyn InteractionPort>,
        navigator: Arc<dyn NavigatorPort>,
        id: Uuid,
    ) -> SessionResult<Self> {
        let record = repo
            .get_by_id(id)
            .await?
            .ok_or(SessionError::Missing(id))?;
        let mut session = Self::with_mode(repo, interaction, navigator, EditMode::Edit(id));
        session.populate(record.fields());
        session.original = Some(record);
        // The stored name is valid within its own scope by construction.
        session.name_status = NameStatus::Valid;
        Ok(session)
    }

    /// Overrides the debounce quiet period.
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.debouncer = Debouncer::new(quiet_period);
        self
    }

    // -----------------------------------------------------------------
    // Field dispatch
    // -----------------------------------------------------------------

    pub fn set_name(&mut self, value: &str) {
        if self.form.name == value {
            return;
        }
        self.form.name = value.to_string();
        if self.phase == Phase::Populating {
            return;
        }
        self.has_unsaved_changes = true;
        self.schedule_name_check();
    }

    pub fn set_description(&mut self, value: Option<&str>) {
        let value = value.map(str::to_string);
        if self.form.description == value {
            return;
        }
        self.form.description = value;
        if self.phase == Phase::Populating {
            return;
        }
        self.has_unsaved_changes = true;
    }

    pub fn set_active(&mut self, value: bool) {
        if self.form.is_active == value {
            return;
        }
        self.form.is_active = value;
        if self.phase == Phase::Populating {
            return;
        }
        self.has_unsaved_changes = true;
    }

    pub fn set_favorite(&mut self, value: bool) {
        if self.form.is_favorite == value {
            return;
        }
        self.form.is_favorite = value;
        if self.phase == Phase::Populating {
            return;
        }
        self.has_unsaved_changes = true;
    }

    /// Re-parents the record. The uniqueness scope changed, so the name
    /// is re-validated even though it did not.
    pub fn set_parent(&mut self, parent_id: Uuid) {
        if self.form.parent_id == Some(parent_id) {
            return;
        }
        self.form.parent_id = Some(parent_id);
        if self.phase == Phase::Populating {
            return;
        }
        self.has_unsaved_changes = true;
        self.schedule_name_check();
    }

    /// Bulk form population. Runs the ordinary setters inside the
    /// `Populating` phase so none of them is observed as a user edit, then
    /// restores whatever phase was active before.
    fn populate(&mut self, fields: EntityFields) {
        let previous = std::mem::replace(&mut self.phase, Phase::Populating);
        self.set_name(&fields.name);
        self.set_description(fields.description.as_deref());
        self.set_active(fields.is_active);
        self.set_favorite(fields.is_favorite);
        match fields.parent_id {
            Some(parent_id) => self.set_parent(parent_id),
            None => self.form.parent_id = None,
        }
        self.phase = previous;
    }

    // -----------------------------------------------------------------
    // Debounced validation
    // -----------------------------------------------------------------

    fn schedule_name_check(&mut self) {
        self.name_status = NameStatus::Unchecked;
        self.phase = Phase::Validating;
        let rules = self.rules;
        let repo = Arc::clone(&self.repo);
        let name = self.form.name.clone();
        let parent_scope = self.form.parent_id;
        let exclude = self.exclude_id();
        let events = self.events_tx.clone();
        self.debouncer.schedule(move |generation| async move {
            let result =
                validate::check_name(&rules, repo.as_ref(), &name, exclude, parent_scope).await;
            // The session may already be gone; nothing to do then.
            let _ = events.send(EditEvent::NameChecked {
                generation,
                name,
                result,
            });
        });
    }

    /// Applies one out-of-band event. Outcomes from superseded checks are
    /// dropped by generation.
    pub fn apply(&mut self, event: EditEvent) {
        match event {
            EditEvent::NameChecked {
                generation,
                name,
                result,
            } => {
                if generation != self.debouncer.current_generation() {
                    debug!(kind = T::KIND, generation, "dropping stale name check");
                    return;
                }
                self.checks_completed += 1;
                self.last_checked_name = Some(name);
                self.name_status = match result {
                    Ok(()) => NameStatus::Valid,
                    Err(err) => NameStatus::Invalid(err),
                };
                if self.phase == Phase::Validating {
                    self.phase = Phase::Ready;
                }
            }
        }
    }

    /// Drains every event already delivered, without waiting.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Waits until no validation is pending. Intended for the owning
    /// task's idle loop (and tests).
    pub async fn settle(&mut self) {
        while self.phase == Phase::Validating {
            match self.events_rx.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    // -----------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------

    /// Save is allowed only when nothing is pending and the last name
    /// check passed.
    pub fn can_save(&self) -> bool {
        self.phase == Phase::Ready && self.name_status == NameStatus::Valid
    }

    /// Batch entry is available when creating inside a parent.
    pub fn can_add_another(&self) -> bool {
        self.mode == EditMode::Create && self.form.parent_id.is_some()
    }

    /// Persists the form and closes the session. Returns whether it
    /// saved; failures are notified and leave the session `Ready`.
    pub async fn save(&mut self) -> bool {
        self.pump();
        if !self.can_save() {
            debug!(kind = T::KIND, phase = ?self.phase, "save blocked");
            return false;
        }
        self.phase = Phase::Saving;
        match self.commit().await {
            Ok(stored) => {
                info!(kind = T::KIND, id = %stored.id(), "saved");
                self.interaction
                    .notify_success(&format!("Saved {} '{}'.", T::KIND, stored.name()))
                    .await;
                self.original = Some(stored);
                self.has_unsaved_changes = false;
                self.phase = Phase::Closed;
                self.navigator.go_back().await;
                true
            }
            Err(err) => {
                error!(kind = T::KIND, %err, "save failed");
                self.interaction.notify_error(&err.to_string()).await;
                self.phase = Phase::Ready;
                false
            }
        }
    }

    /// Persists the form, then resets it for the next record in the same
    /// parent instead of closing. The reset runs under `Populating`.
    pub async fn save_and_add_another(&mut self) -> bool {
        if !self.can_add_another() {
            return self.save().await;
        }
        self.pump();
        if !self.can_save() {
            return false;
        }
        self.phase = Phase::Saving;
        match self.commit().await {
            Ok(stored) => {
                info!(kind = T::KIND, id = %stored.id(), "saved, form reset for next entry");
                self.interaction
                    .notify_success(&format!("Saved {} '{}'.", T::KIND, stored.name()))
                    .await;
                let parent_id = self.form.parent_id;
                self.mode = EditMode::Create;
                self.original = None;
                self.phase = Phase::Ready;
                self.populate(EntityFields {
                    parent_id,
                    ..EntityFields::default()
                });
                self.has_unsaved_changes = false;
                self.name_status = NameStatus::Unchecked;
                true
            }
            Err(err) => {
                error!(kind = T::KIND, %err, "save failed");
                self.interaction.notify_error(&err.to_string()).await;
                self.phase = Phase::Ready;
                false
            }
        }
    }

    async fn commit(&mut self) -> SessionResult<T> {
        let fields = self.canonical_fields();
        if T::REQUIRES_PARENT && fields.parent_id.is_none() {
            return Err(ValidationError::ParentRequired.into());
        }
        if let Some(description) = &fields.description {
            self.rules.check_description(description)?;
        }
        // Final gate: a save that would violate uniqueness must fail
        // validation before reaching the repository.
        validate::check_name(
            &self.rules,
            self.repo.as_ref(),
            &fields.name,
            self.exclude_id(),
            fields.parent_id,
        )
        .await?;
        match self.mode {
            EditMode::Create => {
                let record = T::new_record(self.repo.owner_id(), &fields);
                Ok(self.repo.create(record).await?)
            }
            EditMode::Edit(id) => {
                let original = self.original.as_ref().ok_or(SessionError::Missing(id))?;
                Ok(self.repo.update(original.with_fields(&fields)).await?)
            }
        }
    }

    /// Closes the session, asking for destructive confirmation first when
    /// there are unsaved changes. Returns whether it closed.
    pub async fn cancel(&mut self) -> bool {
        if self.has_unsaved_changes {
            let discard = self
                .interaction
                .confirm(
                    "Discard changes?",
                    "You have unsaved changes. Discard them?",
                    "Discard",
                    "Keep Editing",
                )
                .await;
            if !discard {
                debug!(kind = T::KIND, "cancel declined, keeping session open");
                return false;
            }
        }
        self.debouncer.cancel();
        self.phase = Phase::Closed;
        self.navigator.go_back().await;
        true
    }

    fn canonical_fields(&self) -> EntityFields {
        let mut fields = self.form.clone();
        fields.name = fields.name.trim().to_string();
        fields.description = fields
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        fields
    }

    fn exclude_id(&self) -> Option<Uuid> {
        match self.mode {
            EditMode::Create => None,
            EditMode::Edit(id) => Some(id),
        }
    }

    // -----------------------------------------------------------------
    // Observable state
    // -----------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn fields(&self) -> &EntityFields {
        &self.form
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn is_validating(&self) -> bool {
        self.phase == Phase::Validating
    }

    /// Inline validation copy for the name field, if the last check
    /// failed.
    pub fn validation_message(&self) -> Option<String> {
        match &self.name_status {
            NameStatus::Invalid(err) => Some(err.to_string()),
            _ => None,
        }
    }

    /// Number of name checks that actually ran (debounced edits coalesce).
    pub fn checks_completed(&self) -> u64 {
        self.checks_completed
    }

    /// The name text the most recent completed check looked at.
    pub fn last_checked_name(&self) -> Option<&str> {
        self.last_checked_name.as_deref()
    }
}
