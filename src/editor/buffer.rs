use std::ops::Range;

use ropey::Rope;

use super::changes::{Assoc, Change, ChangeSet, EditError, EditEvent};
use super::snapshot::TextSnapshot;

/// Caret position: zero-based line and byte column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    /// Byte offset within the line.
    pub col: usize,
    /// Column that vertical moves aim for.
    col_memory: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    /// Set the column and make it the vertical-move target.
    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

/// Arrow-key caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Rope-backed transcript text with a caret and optional selection.
///
/// All modifications go through [`EditorBuffer::apply`], so each editing
/// primitive is one transaction and yields one [`EditEvent`]. The cursor
/// tracks the caret; an optional anchor marks the other end of a selection.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    anchor: Option<usize>,
    dirty: bool,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            anchor: None,
            dirty: false,
        }
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Whether an edit was applied since creation or the last
    /// [`mark_clean`](Self::mark_clean).
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Number of lines; text ending in a line break has an empty last line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of a zero-based line without its line break.
    pub fn line_at(&self, idx: usize) -> Option<String> {
        let mut text = self.rope.get_line(idx)?.to_string();
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        Some(text)
    }

    /// Byte length of a zero-based line without its line break.
    pub fn line_len(&self, idx: usize) -> usize {
        self.line_at(idx).map_or(0, |text| text.len())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Caret position as a character offset.
    pub fn caret_offset(&self) -> usize {
        self.cursor_char_idx()
    }

    /// Place the caret at a character offset, clamped to the document.
    pub fn set_caret_offset(&mut self, offset: usize) {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let line_start = self.rope.line_to_char(line);
        let col: usize = self
            .rope
            .slice(line_start..offset)
            .chars()
            .map(char::len_utf8)
            .sum();
        self.cursor.line = line;
        self.cursor.set_col(col);
    }

    /// Select `range` (character offsets), leaving the caret at its end.
    pub fn select(&mut self, range: Range<usize>) {
        let len = self.rope.len_chars();
        self.anchor = Some(range.start.min(len));
        self.set_caret_offset(range.end);
    }

    /// Drop the selection anchor, keeping the caret.
    pub const fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Selected range in document order, if a non-empty selection exists.
    pub fn selection_range(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let head = self.caret_offset();
        match anchor.cmp(&head) {
            std::cmp::Ordering::Less => Some(anchor..head),
            std::cmp::Ordering::Greater => Some(head..anchor),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Text of the current selection; empty when nothing is selected.
    pub fn selection_text(&self) -> String {
        self.selection_range()
            .map(|range| self.rope.slice(range).to_string())
            .unwrap_or_default()
    }

    /// Apply a batch of changes atomically.
    ///
    /// The caret and selection anchor are mapped through the changes and
    /// stay in front of text inserted at their position.
    ///
    /// # Errors
    /// Returns an error if any change reaches past the end of the buffer;
    /// the buffer is left untouched in that case.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<EditEvent, EditError> {
        self.apply_with(changes, Assoc::Before)
    }

    /// [`apply`](Self::apply), with the caret and anchor sticking to
    /// `assoc`'s side of text inserted at their position.
    ///
    /// # Errors
    /// Same as [`apply`](Self::apply).
    pub fn apply_with(&mut self, changes: &ChangeSet, assoc: Assoc) -> Result<EditEvent, EditError> {
        let len = self.rope.len_chars();
        if let Some(change) = changes.changes().iter().find(|change| change.to > len) {
            return Err(EditError::OutOfBounds {
                from: change.from,
                to: change.to,
                len,
            });
        }

        let caret = changes.map_pos(self.caret_offset(), assoc);
        let anchor = self.anchor.map(|pos| changes.map_pos(pos, assoc));

        // Later changes first so earlier offsets stay valid.
        for change in changes.changes().iter().rev() {
            if change.to > change.from {
                self.rope.remove(change.from..change.to);
            }
            if !change.insert.is_empty() {
                self.rope.insert(change.from, &change.insert);
            }
        }

        if !changes.is_empty() {
            self.dirty = true;
        }
        self.set_caret_offset(caret);
        self.anchor = anchor;
        Ok(EditEvent::from_changes(changes, self.caret_offset()))
    }

    /// Replace the whole document as one change.
    pub fn set_text(&mut self, text: &str) -> EditEvent {
        let change = Change::replace(0..self.rope.len_chars(), text);
        // A single change covering the document is always valid.
        let set = ChangeSet::single(change).unwrap_or_default();
        self.apply(&set)
            .unwrap_or_else(|_| EditEvent::new(Vec::new(), self.caret_offset()))
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) -> EditEvent {
        let mut buf = [0; 4];
        self.insert_str(ch.encode_utf8(&mut buf))
    }

    /// Insert a string at the cursor, replacing any selection.
    pub fn insert_str(&mut self, s: &str) -> EditEvent {
        let range = self
            .selection_range()
            .unwrap_or_else(|| self.caret_offset()..self.caret_offset());
        self.anchor = None;
        self.replace_typed(Change::replace(range, s))
    }

    /// Split the current line at the cursor (Enter key).
    pub fn split_line(&mut self) -> EditEvent {
        self.insert_str("\n")
    }

    /// Delete the character before the cursor (Backspace).
    ///
    /// Returns `None` if nothing was deleted.
    pub fn delete_back(&mut self) -> Option<EditEvent> {
        if let Some(range) = self.selection_range() {
            self.anchor = None;
            return Some(self.replace_typed(Change::delete(range)));
        }
        let char_idx = self.caret_offset();
        if char_idx == 0 {
            return None;
        }
        Some(self.replace_typed(Change::delete(char_idx - 1..char_idx)))
    }

    /// Delete the character at the cursor (Delete key).
    ///
    /// Returns `None` if nothing was deleted.
    pub fn delete_forward(&mut self) -> Option<EditEvent> {
        if let Some(range) = self.selection_range() {
            self.anchor = None;
            return Some(self.replace_typed(Change::delete(range)));
        }
        let char_idx = self.caret_offset();
        if char_idx >= self.rope.len_chars() {
            return None;
        }
        Some(self.replace_typed(Change::delete(char_idx..char_idx + 1)))
    }

    /// Move the cursor in the given direction.
    ///
    /// Horizontal steps treat `\r\n` as a single character.
    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                let to = self.step_back(self.caret_offset());
                self.set_caret_offset(to);
            }
            Direction::Right => {
                let to = self.step_forward(self.caret_offset());
                self.set_caret_offset(to);
            }
            Direction::Up => {
                if let Some(line) = self.cursor.line.checked_sub(1) {
                    self.move_vertical(line);
                }
            }
            Direction::Down => {
                if self.cursor.line + 1 < self.line_count() {
                    self.move_vertical(self.cursor.line + 1);
                }
            }
        }
    }

    /// Move cursor to the beginning of the line (Home).
    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    /// Move cursor to the end of the line (End).
    pub fn move_end(&mut self) {
        let len = self.line_len(self.cursor.line);
        self.cursor.set_col(len);
    }

    /// Move to the start of the previous word, or to the end of the
    /// previous line from column zero.
    pub fn move_word_left(&mut self) {
        let chars = self.cursor_line_chars();
        let mut idx = self.cursor_char_col(&chars);
        if idx == 0 {
            self.move_cursor(Direction::Left);
            return;
        }
        while idx > 0 && chars[idx - 1].is_whitespace() {
            idx -= 1;
        }
        if let Some(class) = idx.checked_sub(1).map(|i| is_word_char(chars[i])) {
            while idx > 0 && same_word(chars[idx - 1], class) {
                idx -= 1;
            }
        }
        self.cursor.set_col(byte_len(&chars[..idx]));
    }

    /// Move to the start of the next word, or to the start of the next
    /// line from the end of this one.
    pub fn move_word_right(&mut self) {
        let chars = self.cursor_line_chars();
        let mut idx = self.cursor_char_col(&chars);
        if idx >= chars.len() {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }
        let class = is_word_char(chars[idx]);
        while idx < chars.len() && same_word(chars[idx], class) {
            idx += 1;
        }
        while idx < chars.len() && chars[idx].is_whitespace() {
            idx += 1;
        }
        self.cursor.set_col(byte_len(&chars[..idx]));
    }

    /// Move cursor to a specific line and column, clamped to the buffer.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        self.cursor.set_col(col.min(self.line_len(self.cursor.line)));
    }

    /// Move cursor to the start of the buffer (Ctrl+Home).
    pub const fn move_to_start(&mut self) {
        self.cursor.line = 0;
        self.cursor.set_col(0);
    }

    /// Move cursor to the end of the buffer (Ctrl+End).
    pub fn move_to_end(&mut self) {
        self.set_caret_offset(self.rope.len_chars());
    }

    // --- Private helpers ---

    /// Apply a change made by typing: the caret lands after the inserted text.
    fn replace_typed(&mut self, change: Change) -> EditEvent {
        let caret_after = change.from + change.insert_len();
        let event = ChangeSet::single(change)
            .and_then(|set| self.apply_with(&set, Assoc::After));
        match event {
            Ok(event) => {
                self.set_caret_offset(caret_after);
                event
            }
            // Typed changes are built from the caret, so they always fit.
            Err(_) => EditEvent::new(Vec::new(), self.caret_offset()),
        }
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.cursor.col.min(text.len());
        line_start + text[..col].chars().count()
    }

    fn step_back(&self, offset: usize) -> usize {
        match offset {
            0 => 0,
            _ if offset >= 2
                && self.rope.char(offset - 1) == '\n'
                && self.rope.char(offset - 2) == '\r' =>
            {
                offset - 2
            }
            _ => offset - 1,
        }
    }

    fn step_forward(&self, offset: usize) -> usize {
        let len = self.rope.len_chars();
        if offset >= len {
            return len;
        }
        let crlf = offset + 1 < len
            && self.rope.char(offset) == '\r'
            && self.rope.char(offset + 1) == '\n';
        if crlf {
            offset + 2
        } else {
            offset + 1
        }
    }

    /// Vertical move keeping the remembered column, snapped to a char boundary.
    fn move_vertical(&mut self, line: usize) {
        let memory = self.cursor.col_memory;
        self.cursor.line = line;
        let text = self.line_at(line).unwrap_or_default();
        let mut col = memory.min(text.len());
        while !text.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.col = col;
    }

    fn cursor_line_chars(&self) -> Vec<char> {
        self.line_at(self.cursor.line)
            .unwrap_or_default()
            .chars()
            .collect()
    }

    fn cursor_char_col(&self, chars: &[char]) -> usize {
        let mut bytes = 0;
        chars
            .iter()
            .take_while(|ch| {
                bytes += ch.len_utf8();
                bytes <= self.cursor.col
            })
            .count()
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Part of a run of non-space characters of one class.
fn same_word(ch: char, word: bool) -> bool {
    !ch.is_whitespace() && is_word_char(ch) == word
}

fn byte_len(chars: &[char]) -> usize {
    chars.iter().copied().map(char::len_utf8).sum()
}

impl TextSnapshot for EditorBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, number: usize) -> Option<String> {
        self.line_at(number.checked_sub(1)?)
    }

    fn line_start(&self, number: usize) -> Option<usize> {
        let idx = number.checked_sub(1)?;
        (idx < self.rope.len_lines()).then(|| self.rope.line_to_char(idx))
    }

    fn line_end(&self, number: usize) -> Option<usize> {
        let start = self.line_start(number)?;
        let visible = self.line_at(number - 1)?;
        Some(start + visible.chars().count())
    }

    fn line_at_offset(&self, pos: usize) -> usize {
        self.rope.char_to_line(pos.min(self.rope.len_chars())) + 1
    }

    fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.rope.len_chars());
        let start = range.start.min(end);
        self.rope.slice(start..end).to_string()
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.rope.len_lines())
            .field("chars", &self.rope.len_chars())
            .field("cursor", &self.cursor)
            .field("anchor", &self.anchor)
            .field("dirty", &self.dirty)
            .finish()
    }
}
