use tracing::debug;

use super::markers::{Marker, MarkerSet};
use crate::editor::{Change, ChangeSet, EditEvent, TextSnapshot};

/// Opens a new user turn when the author ends an assistant turn with a
/// paragraph break.
///
/// Runs after every edit. It fires only for a single line break typed at
/// the caret, when that leaves two blank lines (the caret line and the one
/// above it) inside an assistant turn. The blank caret line then becomes
/// a user marker, and a user marker already waiting further down (before
/// the next assistant marker) is cleared so the turn is not opened twice.
#[derive(Debug, Clone)]
pub struct AutoContinuation {
    markers: MarkerSet,
}

/// Blank lines needed above and including the caret.
const PARAGRAPH_BREAK_LINES: usize = 2;

impl AutoContinuation {
    pub const fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    pub const fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Whether `event` looks like one Enter keystroke: two fragments, the
    /// second a bare line break.
    pub fn is_line_break(event: &EditEvent) -> bool {
        match event.fragments() {
            [_, inserted] => {
                inserted.line_count() == 2 && inserted.lines().iter().all(String::is_empty)
            }
            _ => false,
        }
    }

    /// Follow-up edits for a change, or `None` to leave the text as typed.
    ///
    /// Every bail-out is silent; the caller dispatches the returned batch
    /// as one transaction.
    pub fn check(&self, event: &EditEvent, snapshot: &impl TextSnapshot) -> Option<ChangeSet> {
        if !Self::is_line_break(event) {
            return None;
        }
        let caret_line = snapshot.line_at_offset(event.caret());

        let Some(turn) = self.enclosing_turn(snapshot, caret_line) else {
            debug!(caret_line, "auto-continuation: no turn marker above caret");
            return None;
        };
        if turn != Marker::Assistant {
            return None;
        }

        let blank_lines = (1..=caret_line)
            .rev()
            .map_while(|number| snapshot.line_text(number))
            .take_while(|text| text.trim().is_empty())
            .count();
        if blank_lines < PARAGRAPH_BREAK_LINES {
            debug!(caret_line, blank_lines, "auto-continuation: no paragraph break");
            return None;
        }

        // The caret line is blank here, so its content becomes the marker.
        let start = snapshot.line_start(caret_line)?;
        let end = snapshot.line_end(caret_line)?;
        let mut changes = vec![Change::replace(start..end, self.markers.user())];

        if let Some(number) = self.pending_user_marker(snapshot, caret_line) {
            let start = snapshot.line_start(number)?;
            let end = snapshot.line_end(number)?;
            changes.push(Change::delete(start..end));
        }

        debug!(
            caret_line,
            cleared_marker = changes.len() > 1,
            "auto-continuation: opening user turn"
        );
        ChangeSet::new(changes).ok()
    }

    /// Nearest marker at or above `line`.
    fn enclosing_turn(&self, snapshot: &impl TextSnapshot, line: usize) -> Option<Marker> {
        (1..=line)
            .rev()
            .filter_map(|number| snapshot.line_text(number))
            .find_map(|text| self.markers.classify(&text))
    }

    /// First user marker below `line`, unless an assistant marker comes
    /// first. Reaching the end of the document finds nothing.
    fn pending_user_marker(&self, snapshot: &impl TextSnapshot, line: usize) -> Option<usize> {
        for number in line + 1..=snapshot.line_count() {
            match snapshot.line_text(number).and_then(|t| self.markers.classify(&t)) {
                Some(Marker::User) => return Some(number),
                Some(Marker::Assistant) => return None,
                None => {}
            }
        }
        None
    }
}
