//! Conversation transcript model.
//!
//! A transcript is plain text split into alternating user/assistant turns.
//! Each turn starts with a reserved marker line. This module handles:
//! - The marker vocabulary ([`MarkerSet`])
//! - Canonicalizing marker placement ([`normalize`])
//! - Splitting text into labeled turns ([`sections`])
//! - Opening a new user turn after a paragraph break ([`AutoContinuation`])

mod markers;
mod migrate;
mod monitor;
mod normalize;
mod sections;

pub use markers::{Marker, MarkerSet, MarkerSetError};
pub use migrate::migrate;
pub use monitor::AutoContinuation;
pub use normalize::{normalization_changes, normalize, normalize_text};
pub use sections::{Section, sections};
