//! Session controllers: one edit form or one collection view per
//! instance, live for the duration of a screen visit.
//!
//! Both controllers share a single logical thread of control: repository
//! work is async but non-overlapping per session, and the debounce timer
//! is the only out-of-band continuation, marshalled back through an event
//! channel before it touches observable state.

pub mod debounce;
pub mod edit;
pub mod list;

pub use debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
pub use edit::{EditEvent, EditMode, EditSession, NameStatus, Phase};
pub use list::{EntityRow, ListSession, SelectionMode, EDIT_ROUTE};
