//! Name validation: shape checks plus scope-aware uniqueness.
//!
//! Uniqueness goes through the repository's `name_exists`, which serves
//! from the cached entity list when possible. A transient repository
//! failure does not fail the field; the shape result stands and the
//! failure is logged, since the duplicate would still be caught by the
//! backend on save.

use tracing::warn;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::Entity;
use crate::repository::CachedRepository;
use crate::store::EntityStore;

/// Length bounds applied to the name and description fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRules {
    pub min_name_len: usize,
    pub max_name_len: usize,
    pub max_description_len: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            min_name_len: 2,
            max_name_len: 80,
            max_description_len: 500,
        }
    }
}

impl NameRules {
    /// Shape checks in order: non-empty, minimum length, maximum length.
    pub fn check_shape(&self, name: &str) -> Result<(), ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::NameEmpty);
        }
        if trimmed.chars().count() < self.min_name_len {
            return Err(ValidationError::NameTooShort(self.min_name_len));
        }
        if trimmed.chars().count() > self.max_name_len {
            return Err(ValidationError::NameTooLong(self.max_name_len));
        }
        Ok(())
    }

    pub fn check_description(&self, description: &str) -> Result<(), ValidationError> {
        if description.chars().count() > self.max_description_len {
            return Err(ValidationError::DescriptionTooLong(self.max_description_len));
        }
        Ok(())
    }
}

/// Full name check: shape first, then uniqueness within the `(owner,
/// parent)` scope, excluding the record being edited.
pub async fn check_name<T, S>(
    rules: &NameRules,
    repo: &CachedRepository<T, S>,
    name: &str,
    exclude: Option<Uuid>,
    parent_scope: Option<Uuid>,
) -> Result<(), ValidationError>
where
    T: Entity,
    S: EntityStore<T>,
{
    rules.check_shape(name)?;
    match repo.name_exists(name, exclude, parent_scope).await {
        Ok(true) => Err(ValidationError::DuplicateName(name.trim().to_string())),
        Ok(false) => Ok(()),
        Err(err) => {
            warn!(kind = T::KIND, %err, "uniqueness check unavailable, shape result stands");
            Ok(())
        }
    }
}
