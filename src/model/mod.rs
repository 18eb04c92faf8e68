//! Entity contract shared by every manageable record.
//!
//! The framework never looks at entity-specific fields (scientific names,
//! cultivation notes, and so on); it only needs the structural contract
//! below. Concrete record types for the taxonomy domain live in [`taxa`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod taxa;

/// Form-field projection of an entity.
///
/// This is what an edit session actually edits: a flat bundle of the
/// user-editable fields, detached from identity and timestamps. Bulk form
/// population and canonicalization before save both go through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFields {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_favorite: bool,
    /// Parent reference for hierarchical entities; `None` for flat ones.
    pub parent_id: Option<Uuid>,
}

impl Default for EntityFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            is_active: true,
            is_favorite: false,
            parent_id: None,
        }
    }
}

/// Structural contract satisfied by every record the framework manages.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human label for the record kind ("family", "genus"). Used in
    /// confirmation prompts and notifications.
    const KIND: &'static str;

    /// Whether a record of this kind must reference a parent. Gates every
    /// save; hierarchical types override to `true`.
    const REQUIRES_PARENT: bool = false;

    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Option<Uuid>;
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn is_active(&self) -> bool;
    fn is_favorite(&self) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Derived, never independently settable: a record with no owner is a
    /// shared system default.
    fn is_system_default(&self) -> bool {
        self.owner_id().is_none()
    }

    /// Scope key for name uniqueness. Flat entities share one scope per
    /// owner; hierarchical entities narrow it to `(owner, parent)`.
    fn parent_scope(&self) -> Option<Uuid> {
        None
    }

    /// Projection of the editable fields, used for bulk form population.
    fn fields(&self) -> EntityFields;

    /// Canonical copy with the editable fields replaced. Identity and
    /// `created_at` are untouched; the store refreshes `updated_at`.
    fn with_fields(&self, fields: &EntityFields) -> Self;

    /// Fresh record built from form fields. The id is left nil so the
    /// store assigns identity and timestamps on insert.
    fn new_record(owner_id: Option<Uuid>, fields: &EntityFields) -> Self;

    /// Store hook: stamp identity and timestamps on first insert.
    fn assign_identity(&mut self, id: Uuid, now: DateTime<Utc>);

    /// Store hook: refresh `updated_at`. Called on every mutation.
    fn touch(&mut self, now: DateTime<Utc>);

    fn set_favorite(&mut self, favorite: bool);
}

/// An entity with a required parent reference. Name uniqueness narrows to
/// the `(owner, parent)` scope and deletion cascades to children at the
/// storage layer.
pub trait HierarchicalEntity: Entity {
    fn parent_id(&self) -> Uuid;
}

/// Aggregate counts derived from a full entity scan.
///
/// Recomputed on every cache refresh, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub system: usize,
    pub user_created: usize,
}

impl EntityStats {
    pub fn collect<'a, T, I>(entries: I) -> Self
    where
        T: Entity,
        I: IntoIterator<Item = &'a T>,
    {
        let mut stats = Self::default();
        for entry in entries {
            stats.total += 1;
            if entry.is_active() {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            if entry.is_system_default() {
                stats.system += 1;
            } else {
                stats.user_created += 1;
            }
        }
        stats
    }
}
