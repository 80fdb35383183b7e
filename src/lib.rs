// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. transcript::TranscriptError)
    clippy::module_name_repetitions
)]

//! # Turnscript
//!
//! Speaker-turn tooling for plain-text chat transcripts.
//!
//! A transcript is ordinary text in which a line holding only a marker
//! literal (`__user` or `__assistant` by default) starts a new turn.
//! Turnscript provides:
//! - Normalization into canonical alternating form
//! - Automatic opening of a user turn after an assistant reply
//! - Marker decorations with atomic caret movement
//! - Section listing and marker vocabulary migration
//!
//! ## Architecture
//!
//! The editing side uses The Elm Architecture (TEA) pattern:
//! - **Model**: Buffer, decorations and the auto-continuation monitor
//! - **Message**: Editing actions
//! - **Update**: State transitions, with the monitor run after each edit
//!
//! ## Modules
//!
//! - [`app`]: Editing state and the command runner
//! - [`transcript`]: Markers, normalization, sections and the monitor
//! - [`editor`]: Rope buffer, change sets and snapshots
//! - [`decoration`]: Marker decorations and rendering
//! - [`config`]: rc-file defaults
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod decoration;
pub mod editor;
pub mod transcript;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model, update};
    pub use crate::editor::{Change, ChangeSet, EditorBuffer, TextSnapshot};
    pub use crate::transcript::{Marker, MarkerSet, normalize, normalize_text};
}
