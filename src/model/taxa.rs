//! Concrete taxonomy records: botanical families and their genera.
//!
//! These are the inert per-entity schemas the framework carries. A
//! `Family` is a top-level record; a `Genus` always belongs to a family,
//! so its name uniqueness is scoped to that family and deleting a family
//! cascades to its genera at the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityFields, HierarchicalEntity};

/// A botanical family, e.g. Orchidaceae.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Family {
    const KIND: &'static str = "family";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn fields(&self) -> EntityFields {
        EntityFields {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            is_favorite: self.is_favorite,
            parent_id: None,
        }
    }

    fn with_fields(&self, fields: &EntityFields) -> Self {
        Self {
            name: fields.name.clone(),
            description: fields.description.clone(),
            is_active: fields.is_active,
            is_favorite: fields.is_favorite,
            ..self.clone()
        }
    }

    fn new_record(owner_id: Option<Uuid>, fields: &EntityFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            owner_id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            is_active: fields.is_active,
            is_favorite: fields.is_favorite,
            created_at: now,
            updated_at: now,
        }
    }

    fn assign_identity(&mut self, id: Uuid, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
        self.updated_at = now;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn set_favorite(&mut self, favorite: bool) {
        self.is_favorite = favorite;
    }
}

/// A genus within a family, e.g. Phalaenopsis within Orchidaceae.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genus {
    pub id: Uuid,
    pub family_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Genus {
    const KIND: &'static str = "genus";
    const REQUIRES_PARENT: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn parent_scope(&self) -> Option<Uuid> {
        Some(self.family_id)
    }

    fn fields(&self) -> EntityFields {
        EntityFields {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            is_favorite: self.is_favorite,
            parent_id: Some(self.family_id),
        }
    }

    fn with_fields(&self, fields: &EntityFields) -> Self {
        Self {
            family_id: fields.parent_id.unwrap_or(self.family_id),
            name: fields.name.clone(),
            description: fields.description.clone(),
            is_active: fields.is_active,
            is_favorite: fields.is_favorite,
            ..self.clone()
        }
    }

    fn new_record(owner_id: Option<Uuid>, fields: &EntityFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            // A missing parent is rejected at commit, before any save
            // reaches a store; the fallback only exists because
            // `EntityFields` is shared with flat entities.
            family_id: fields.parent_id.unwrap_or_else(Uuid::nil),
            owner_id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            is_active: fields.is_active,
            is_favorite: fields.is_favorite,
            created_at: now,
            updated_at: now,
        }
    }

    fn assign_identity(&mut self, id: Uuid, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
        self.updated_at = now;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn set_favorite(&mut self, favorite: bool) {
        self.is_favorite = favorite;
    }
}

impl HierarchicalEntity for Genus {
    fn parent_id(&self) -> Uuid {
        self.family_id
    }
}
