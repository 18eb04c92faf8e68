//! Cascade-delete consent.
//!
//! Before a hierarchical parent is deleted, the user must be told how many
//! child records go with it. The assessment here only gathers counts and
//! builds the differentiated confirmation copy; the deletion itself rides
//! the backing store's own cascade.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::model::HierarchicalEntity;
use crate::repository::CachedRepository;
use crate::store::HierarchicalStore;

/// Child-count port used by the assessment. A child-type repository is
/// the canonical implementation.
#[async_trait]
pub trait ChildCounter: Send + Sync {
    /// Child count for one parent, inactive children included.
    async fn count_children(&self, parent_id: Uuid) -> RepositoryResult<u64>;

    /// Human label for the child kind ("genus"), used in the prompt.
    fn child_label(&self) -> &'static str;

    /// Marks the child-type cache stale. Called after a parent deletion,
    /// since the storage-layer cascade removed children behind it.
    async fn invalidate(&self);
}

#[async_trait]
impl<T, S> ChildCounter for CachedRepository<T, S>
where
    T: HierarchicalEntity,
    S: HierarchicalStore<T>,
{
    async fn count_children(&self, parent_id: Uuid) -> RepositoryResult<u64> {
        self.get_count_by_parent_id(parent_id).await
    }

    fn child_label(&self) -> &'static str {
        T::KIND
    }

    async fn invalidate(&self) {
        self.invalidate_cache().await;
    }
}

/// What a delete would take with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteImpact {
    pub targets: usize,
    pub descendants: u64,
}

impl DeleteImpact {
    /// An impact with no hierarchical children, for flat entity types.
    pub fn flat(targets: usize) -> Self {
        Self {
            targets,
            descendants: 0,
        }
    }

    /// Escalated consent is required when children would be removed too.
    pub fn requires_escalation(&self) -> bool {
        self.descendants > 0
    }

    /// Confirmation copy. Plain wording when no children are affected,
    /// escalated wording naming the aggregate child count otherwise.
    pub fn confirmation_message(&self, entity_label: &str, child_label: &str) -> String {
        let subject = if self.targets == 1 {
            format!("this {entity_label}")
        } else {
            format!("{} {entity_label} records", self.targets)
        };
        if self.descendants == 0 {
            format!("Permanently delete {subject}?")
        } else {
            format!(
                "Permanently delete {subject}? {} {child_label} record{} will also be removed.",
                self.descendants,
                if self.descendants == 1 { "" } else { "s" }
            )
        }
    }
}

/// Sums child counts across all targets. Pure consent gathering: no
/// deletion, no cache mutation.
pub async fn assess_delete(
    children: &dyn ChildCounter,
    targets: &[Uuid],
) -> RepositoryResult<DeleteImpact> {
    let mut descendants = 0u64;
    for &parent_id in targets {
        descendants += children.count_children(parent_id).await?;
    }
    Ok(DeleteImpact {
        targets: targets.len(),
        descendants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::taxa::Genus;
    use crate::model::{Entity, EntityFields};
    use crate::repository::CachedRepository;
    use crate::store::{EntityStore, InMemoryStore};

    async fn seed_children(genera: &InMemoryStore<Genus>, children: usize) -> Uuid {
        let parent_id = Uuid::new_v4();
        for i in 0..children {
            genera
                .insert(Genus::new_record(
                    Some(Uuid::new_v4()),
                    &EntityFields {
                        name: format!("Genus {i}"),
                        parent_id: Some(parent_id),
                        // Inactive children still count toward consent.
                        is_active: i % 2 == 0,
                        ..Default::default()
                    },
                ))
                .await
                .expect("insert genus");
        }
        parent_id
    }

    #[tokio::test]
    async fn test_cascade_count_accuracy() {
        let genera: std::sync::Arc<InMemoryStore<Genus>> = InMemoryStore::new();
        let repo = CachedRepository::new(genera.clone(), None);

        for expected in [0usize, 1, 5] {
            let parent = seed_children(&genera, expected).await;
            repo.invalidate_cache().await;
            let impact = assess_delete(repo.as_ref(), &[parent]).await.expect("assess");
            assert_eq!(impact.descendants, expected as u64);
            assert_eq!(impact.requires_escalation(), expected > 0);
        }
    }

    #[tokio::test]
    async fn test_bulk_assessment_sums_across_targets() {
        let genera: std::sync::Arc<InMemoryStore<Genus>> = InMemoryStore::new();
        let repo = CachedRepository::new(genera.clone(), None);

        let a = seed_children(&genera, 2).await;
        let b = seed_children(&genera, 3).await;
        let impact = assess_delete(repo.as_ref(), &[a, b]).await.expect("assess");
        assert_eq!(impact.targets, 2);
        assert_eq!(impact.descendants, 5);
    }

    #[test]
    fn test_confirmation_copy_differentiates() {
        let plain = DeleteImpact::flat(1);
        assert_eq!(
            plain.confirmation_message("family", "genus"),
            "Permanently delete this family?"
        );

        let escalated = DeleteImpact {
            targets: 2,
            descendants: 3,
        };
        let message = escalated.confirmation_message("family", "genus");
        assert!(message.contains("2 family records"));
        assert!(message.contains("3 genus records will also be removed"));
    }
}
