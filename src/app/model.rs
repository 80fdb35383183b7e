use tracing::warn;

use crate::decoration::{DecorationSet, MarkerDecorator, MarkerRenderer, render_lines};
use crate::editor::{Assoc, ChangeSet, EditError, EditEvent, EditorBuffer, TextSnapshot};
use crate::transcript::{AutoContinuation, MarkerSet, normalization_changes};

/// The complete editing state.
///
/// The buffer owns the text. Everything derived from it (decorations, the
/// auto-continuation check) is driven from [`Model::on_buffer_changed`],
/// which runs once for every applied batch of changes.
pub struct Model {
    pub buffer: EditorBuffer,
    monitor: AutoContinuation,
    decorator: MarkerDecorator,
    decorations: DecorationSet,
    auto_continuations: usize,
}

impl Model {
    /// Create a model editing `text`.
    ///
    /// # Errors
    /// Returns an error if the marker matcher cannot be compiled.
    pub fn new(text: &str, markers: MarkerSet) -> Result<Self, regex::Error> {
        let buffer = EditorBuffer::from_text(text);
        let decorator = MarkerDecorator::new(&markers)?;
        let decorations = decorator.create(&buffer);
        Ok(Self {
            buffer,
            monitor: AutoContinuation::new(markers),
            decorator,
            decorations,
            auto_continuations: 0,
        })
    }

    pub const fn markers(&self) -> &MarkerSet {
        self.monitor.markers()
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Replace the whole document in one transaction.
    pub fn set_text(&mut self, text: &str) {
        let event = self.buffer.set_text(text);
        self.on_buffer_changed(&event);
    }

    /// Text of the current selection; empty when nothing is selected.
    pub fn selection_text(&self) -> String {
        self.buffer.selection_text()
    }

    /// Caret position as a character offset.
    pub fn caret_offset(&self) -> usize {
        self.buffer.caret_offset()
    }

    pub const fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// How many times a user turn was opened automatically.
    pub const fn auto_continuations(&self) -> usize {
        self.auto_continuations
    }

    /// Bring the document into canonical transcript form.
    ///
    /// Returns `true` if anything changed.
    pub fn normalize(&mut self) -> bool {
        let Some(changes) = normalization_changes(&self.buffer, self.markers()) else {
            return false;
        };
        match self.dispatch(&changes) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "normalization edits rejected");
                false
            }
        }
    }

    /// Apply a batch of changes and notify listeners once.
    ///
    /// # Errors
    /// Returns an error if the batch does not fit the document.
    pub fn dispatch(&mut self, changes: &ChangeSet) -> Result<(), EditError> {
        let event = self.buffer.apply(changes)?;
        self.on_buffer_changed(&event);
        Ok(())
    }

    /// Change listener, run after every applied batch.
    ///
    /// Updates decorations, then lets the auto-continuation monitor issue
    /// at most one follow-up batch. The caret ends up after the marker that
    /// batch writes, ready for the next line break.
    pub fn on_buffer_changed(&mut self, event: &EditEvent) {
        self.refresh_decorations(event);
        let Some(follow_up) = self.monitor.check(event, &self.buffer) else {
            return;
        };
        match self.buffer.apply_with(&follow_up, Assoc::After) {
            Ok(next) => {
                self.auto_continuations += 1;
                self.refresh_decorations(&next);
                if self.monitor.check(&next, &self.buffer).is_some() {
                    warn!("auto-continuation matched its own edit; not applying again");
                }
            }
            Err(err) => warn!(%err, "auto-continuation edits rejected"),
        }
    }

    /// Document lines with marker decorations rendered.
    pub fn rendered_lines(&self, renderer: &impl MarkerRenderer) -> Vec<String> {
        render_lines(&self.buffer, &self.decorations, renderer)
    }

    /// Move the caret out of a decoration it landed inside.
    pub(super) fn snap_caret(&mut self, toward_start: bool) {
        let caret = self.buffer.caret_offset();
        if let Some(range) = self.decorations.atomic_range_at(caret) {
            let target = if toward_start { range.start } else { range.end };
            self.buffer.set_caret_offset(target);
        }
    }

    pub fn line_count(&self) -> usize {
        TextSnapshot::line_count(&self.buffer)
    }

    fn refresh_decorations(&mut self, event: &EditEvent) {
        self.decorations = self
            .decorator
            .recompute(&self.decorations, event.changes(), &self.buffer);
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("buffer", &self.buffer)
            .field("markers", self.markers())
            .field("decorations", &self.decorations.len())
            .field("auto_continuations", &self.auto_continuations)
            .finish_non_exhaustive()
    }
}
