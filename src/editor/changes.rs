use std::ops::Range;

use thiserror::Error;

/// One range replacement, in offsets of the document before the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl Change {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            from: at,
            to: at,
            insert: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, "")
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            from: range.start,
            to: range.end,
            insert: text.into(),
        }
    }

    /// Inserted length in characters.
    pub fn insert_len(&self) -> usize {
        self.insert.chars().count()
    }
}

/// Errors from submitting edits to a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("change {from}..{to} is inverted")]
    Inverted { from: usize, to: usize },
    #[error("changes overlap at offset {at}")]
    Overlap { at: usize },
    #[error("change {from}..{to} is outside the document (length {len})")]
    OutOfBounds { from: usize, to: usize, len: usize },
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// A batch of non-overlapping changes applied as a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Build a change set, sorting changes by position.
    ///
    /// # Errors
    /// Returns an error if a change is inverted or two changes overlap.
    /// Insertions at the same offset keep their submission order.
    pub fn new(mut changes: Vec<Change>) -> Result<Self, EditError> {
        changes.sort_by_key(|change| change.from);
        let mut prev_end = 0;
        for (idx, change) in changes.iter().enumerate() {
            if change.from > change.to {
                return Err(EditError::Inverted {
                    from: change.from,
                    to: change.to,
                });
            }
            if idx > 0 && change.from < prev_end {
                return Err(EditError::Overlap { at: change.from });
            }
            prev_end = change.to;
        }
        Ok(Self { changes })
    }

    pub fn single(change: Change) -> Result<Self, EditError> {
        Self::new(vec![change])
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Map an offset in the old document to the new one.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut pos = pos;
        let mut added = 0;
        let mut removed = 0;
        for change in &self.changes {
            if pos < change.from {
                break;
            }
            if pos <= change.to && assoc == Assoc::Before {
                return change.from + added - removed;
            }
            pos = pos.max(change.to);
            added += change.insert_len();
            removed += change.to - change.from;
        }
        pos + added - removed
    }

    /// Ranges of inserted text in the new document, one per change.
    pub fn inserted_ranges(&self) -> Vec<Range<usize>> {
        let mut added = 0;
        let mut removed = 0;
        self.changes
            .iter()
            .map(|change| {
                let start = change.from + added - removed;
                let len = change.insert_len();
                added += len;
                removed += change.to - change.from;
                start..start + len
            })
            .collect()
    }
}

/// Text inserted by one section of an edit, split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    lines: Vec<String>,
}

impl Fragment {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(ToOwned::to_owned).collect(),
        }
    }

    /// The fragment reported for untouched text between changes.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Number of lines spanned; a lone line break spans two.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Change notification delivered once per applied [`ChangeSet`].
///
/// Fragments follow the document order of the edit: the untouched gap
/// before a change (when there is one) is reported as an empty fragment,
/// followed by the change's inserted text. Nothing is reported for the
/// untouched text after the last change, so a single line break typed
/// mid-document arrives as exactly two fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    fragments: Vec<Fragment>,
    changes: ChangeSet,
    caret: usize,
}

impl EditEvent {
    /// An event with the given fragments and no recorded changes.
    pub fn new(fragments: Vec<Fragment>, caret: usize) -> Self {
        Self {
            fragments,
            changes: ChangeSet::default(),
            caret,
        }
    }

    /// Describe an applied change set, with the caret offset after the edit.
    pub fn from_changes(changes: &ChangeSet, caret: usize) -> Self {
        let mut fragments = Vec::with_capacity(changes.len() * 2);
        let mut covered = 0;
        for change in changes.changes() {
            if change.from > covered {
                fragments.push(Fragment::empty());
            }
            fragments.push(Fragment::from_text(&change.insert));
            covered = change.to;
        }
        Self {
            fragments,
            changes: changes.clone(),
            caret,
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// The applied changes, in offsets of the document before the edit.
    pub const fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Caret offset in the document after the edit.
    pub const fn caret(&self) -> usize {
        self.caret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_changes() {
        let set = ChangeSet::new(vec![Change::insert(5, "b"), Change::insert(1, "a")]).unwrap();
        assert_eq!(set.changes()[0].from, 1);
        assert_eq!(set.changes()[1].from, 5);
    }

    #[test]
    fn test_new_rejects_overlap() {
        let err = ChangeSet::new(vec![Change::delete(0..4), Change::delete(2..6)]).unwrap_err();
        assert_eq!(err, EditError::Overlap { at: 2 });
    }

    #[test]
    fn test_new_rejects_inverted() {
        let change = Change {
            from: 4,
            to: 2,
            insert: String::new(),
        };
        assert_eq!(
            ChangeSet::single(change).unwrap_err(),
            EditError::Inverted { from: 4, to: 2 }
        );
    }

    #[test]
    fn test_adjacent_changes_are_allowed() {
        let set = ChangeSet::new(vec![Change::delete(0..2), Change::delete(2..4)]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_map_pos_before_and_after_insertion() {
        let set = ChangeSet::single(Change::insert(3, "xy")).unwrap();
        assert_eq!(set.map_pos(1, Assoc::Before), 1);
        assert_eq!(set.map_pos(3, Assoc::Before), 3);
        assert_eq!(set.map_pos(3, Assoc::After), 5);
        assert_eq!(set.map_pos(4, Assoc::Before), 6);
    }

    #[test]
    fn test_map_pos_inside_deletion_collapses() {
        let set = ChangeSet::single(Change::delete(2..6)).unwrap();
        assert_eq!(set.map_pos(4, Assoc::Before), 2);
        assert_eq!(set.map_pos(4, Assoc::After), 2);
        assert_eq!(set.map_pos(8, Assoc::Before), 4);
    }

    #[test]
    fn test_map_pos_across_several_changes() {
        let set = ChangeSet::new(vec![Change::delete(0..2), Change::insert(5, "abc")]).unwrap();
        assert_eq!(set.map_pos(4, Assoc::Before), 2);
        assert_eq!(set.map_pos(5, Assoc::After), 6);
        assert_eq!(set.map_pos(7, Assoc::Before), 8);
    }

    #[test]
    fn test_inserted_ranges_are_in_new_coordinates() {
        let set = ChangeSet::new(vec![
            Change::replace(0..3, "a"),
            Change::insert(5, "bcd"),
        ])
        .unwrap();
        assert_eq!(set.inserted_ranges(), vec![0..1, 3..6]);
    }

    #[test]
    fn test_fragment_line_break_spans_two_lines() {
        let fragment = Fragment::from_text("\n");
        assert_eq!(fragment.line_count(), 2);
        assert!(fragment.lines().iter().all(String::is_empty));
    }

    #[test]
    fn test_event_for_mid_document_insert_has_two_fragments() {
        let set = ChangeSet::single(Change::insert(4, "\n")).unwrap();
        let event = EditEvent::from_changes(&set, 5);
        assert_eq!(event.fragments().len(), 2);
        assert_eq!(event.fragments()[0], Fragment::empty());
        assert_eq!(event.fragments()[1].line_count(), 2);
        assert_eq!(event.caret(), 5);
    }

    #[test]
    fn test_event_for_insert_at_start_has_one_fragment() {
        let set = ChangeSet::single(Change::insert(0, "\n")).unwrap();
        let event = EditEvent::from_changes(&set, 1);
        assert_eq!(event.fragments().len(), 1);
    }

    #[test]
    fn test_event_for_two_separated_changes() {
        let set = ChangeSet::new(vec![Change::insert(3, "x"), Change::delete(6..8)]).unwrap();
        let event = EditEvent::from_changes(&set, 0);
        assert_eq!(event.fragments().len(), 4);
    }
}
