//! Editing state and the command runner.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete editing state
//! - [`Message`]: All editing actions
//! - [`update`]: State transitions
//! - [`App`]: Runs the command-line operations on transcript files

mod effects;
mod event_loop;
mod model;
mod update;

pub use model::Model;
pub use update::{Message, update};

use std::time::Duration;

use crate::decoration::GlyphRenderer;
use crate::transcript::MarkerSet;

/// What `fmt` should do with the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
    /// Rewrite the file in place when it changes
    Write,
    /// Leave the file alone; only report
    Check,
}

/// Result of running an operation over one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Whether the output differs from the file contents.
    pub changed: bool,
    /// The resulting text.
    pub text: String,
}

/// Command runner for one marker vocabulary.
#[derive(Debug, Clone)]
pub struct App {
    markers: MarkerSet,
    renderer: GlyphRenderer,
    debounce: Duration,
}

impl App {
    /// Create a runner using `markers`.
    pub fn new(markers: MarkerSet) -> Self {
        Self {
            markers,
            renderer: GlyphRenderer::default(),
            debounce: Duration::from_millis(200),
        }
    }

    /// Width of the rule drawn after rendered markers.
    pub const fn with_rule_width(mut self, width: usize) -> Self {
        self.renderer.rule_width = width;
        self
    }

    /// How long the file must stay quiet before `watch` reformats it.
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub const fn markers(&self) -> &MarkerSet {
        &self.markers
    }
}

#[cfg(test)]
mod tests;
