//! Lightweight editor module for transcript editing.
//!
//! Provides a rope-backed text buffer with cursor management and
//! transactional edits. Every applied batch of changes produces exactly
//! one [`EditEvent`], which the app feeds to its change listeners.

mod buffer;
mod changes;
mod snapshot;

pub use buffer::{Cursor, Direction, EditorBuffer};
pub use changes::{Assoc, Change, ChangeSet, EditError, EditEvent, Fragment};
pub use snapshot::{LineSnapshot, TextSnapshot};
