//! Entity-session core for the Herbarium taxonomy app.
//!
//! The presentation layer (pages, styling, navigation tables) lives
//! elsewhere; this crate is the part with actual state-machine work:
//!
//! - [`model`]: the structural contract every manageable record satisfies,
//!   plus the concrete taxonomy records (families, genera).
//! - [`store`]: the persistence port the cloud backend implements, with an
//!   in-memory reference backend.
//! - [`repository`]: one caching repository per entity type, shared across
//!   sessions, owning the authoritative in-memory cache.
//! - [`validate`] and [`session::debounce`]: debounced, scope-aware name
//!   validation.
//! - [`session`]: the edit and list session controllers.
//! - [`cascade`]: cascade-delete consent for hierarchical types.
//! - [`interaction`]: confirmation/toast and navigation collaborator
//!   ports, injected at construction.

pub mod cascade;
pub mod error;
pub mod interaction;
pub mod model;
pub mod repository;
pub mod session;
pub mod sort;
pub mod store;
pub mod validate;

pub use cascade::{assess_delete, ChildCounter, DeleteImpact};
pub use error::{
    RepositoryError, RepositoryResult, SessionError, SessionResult, ValidationError,
};
pub use interaction::{InteractionPort, NavigatorPort};
pub use model::{Entity, EntityFields, EntityStats, HierarchicalEntity};
pub use repository::{CachedRepository, StatusFilter};
pub use session::{EditMode, EditSession, EntityRow, ListSession, Phase, SelectionMode};
pub use sort::{RowOrdering, SortOrder, StandardOrdering};
pub use store::{EntityStore, HierarchicalStore, InMemoryStore};
pub use validate::NameRules;
