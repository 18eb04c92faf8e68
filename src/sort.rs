//! Client-side sort vocabulary and the typed ordering strategy.
//!
//! Sorting is applied after filtering, in the list session. The fixed
//! vocabulary covers every entity type; an entity-specific strategy can
//! layer extra behaviour on top and fall back to the standard comparison
//! for orders it does not handle. No property names are looked up at
//! runtime.

use std::cmp::Ordering;

use crate::model::Entity;

/// Fixed sort vocabulary shared by every list session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NameAscending,
    NameDescending,
    RecentlyUpdated,
    OldestFirst,
    FavoritesFirst,
}

/// Standard comparison for the fixed vocabulary.
pub fn standard_compare<T: Entity>(a: &T, b: &T, order: SortOrder) -> Ordering {
    match order {
        SortOrder::NameAscending => name_key(a).cmp(&name_key(b)),
        SortOrder::NameDescending => name_key(b).cmp(&name_key(a)),
        SortOrder::RecentlyUpdated => b.updated_at().cmp(&a.updated_at()),
        SortOrder::OldestFirst => a.created_at().cmp(&b.created_at()),
        SortOrder::FavoritesFirst => b
            .is_favorite()
            .cmp(&a.is_favorite())
            .then_with(|| name_key(a).cmp(&name_key(b))),
    }
}

fn name_key<T: Entity>(record: &T) -> String {
    record.name().to_lowercase()
}

/// Entity-specific ordering strategy, selected by [`SortOrder`].
///
/// Return `None` to fall back to [`standard_compare`] for that order.
pub trait RowOrdering<T: Entity>: Send + Sync {
    fn compare(&self, _a: &T, _b: &T, _order: SortOrder) -> Option<Ordering> {
        None
    }
}

/// Default strategy: the standard vocabulary only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOrdering;

impl<T: Entity> RowOrdering<T> for StandardOrdering {}

/// Applies `order` through `strategy`, falling back to the standard
/// comparison where the strategy declines.
pub fn sort_records<T: Entity>(
    records: &mut [T],
    order: SortOrder,
    strategy: &dyn RowOrdering<T>,
) {
    records.sort_by(|a, b| {
        strategy
            .compare(a, b, order)
            .unwrap_or_else(|| standard_compare(a, b, order))
    });
}
