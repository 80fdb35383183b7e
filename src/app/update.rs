use std::ops::Range;

use crate::app::Model;
use crate::editor::Direction;

/// All editing actions the model understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Typing
    /// Insert a character at the caret
    InsertChar(char),
    /// Insert text at the caret (paste)
    InsertText(String),
    /// Split the line at the caret
    Enter,
    /// Delete before the caret
    Backspace,
    /// Delete at the caret
    Delete,

    // Caret movement
    /// Move one step
    Move(Direction),
    /// Jump to the previous word start
    WordLeft,
    /// Jump to the next word start
    WordRight,
    /// Start of line
    Home,
    /// End of line
    End,
    /// Start of document
    DocumentStart,
    /// End of document
    DocumentEnd,

    // Selection
    /// Select a character range
    Select(Range<usize>),
    /// Drop the selection
    ClearSelection,

    // Whole document
    /// Replace all text
    SetText(String),
    /// Canonicalize turn markers
    Normalize,
    /// Forget unsaved-changes state
    MarkClean,
}

/// Apply one message to the model.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::InsertChar(ch) => {
            let event = model.buffer.insert_char(ch);
            model.on_buffer_changed(&event);
        }
        Message::InsertText(text) => {
            let event = model.buffer.insert_str(&text);
            model.on_buffer_changed(&event);
        }
        Message::Enter => {
            let event = model.buffer.split_line();
            model.on_buffer_changed(&event);
        }
        Message::Backspace => {
            if let Some(event) = model.buffer.delete_back() {
                model.on_buffer_changed(&event);
            }
        }
        Message::Delete => {
            if let Some(event) = model.buffer.delete_forward() {
                model.on_buffer_changed(&event);
            }
        }

        Message::Move(direction) => {
            model.buffer.clear_selection();
            model.buffer.move_cursor(direction);
            model.snap_caret(matches!(direction, Direction::Left | Direction::Up));
        }
        Message::WordLeft => {
            model.buffer.clear_selection();
            model.buffer.move_word_left();
            model.snap_caret(true);
        }
        Message::WordRight => {
            model.buffer.clear_selection();
            model.buffer.move_word_right();
            model.snap_caret(false);
        }
        Message::Home => {
            model.buffer.clear_selection();
            model.buffer.move_home();
        }
        Message::End => {
            model.buffer.clear_selection();
            model.buffer.move_end();
        }
        Message::DocumentStart => {
            model.buffer.clear_selection();
            model.buffer.move_to_start();
        }
        Message::DocumentEnd => {
            model.buffer.clear_selection();
            model.buffer.move_to_end();
        }

        Message::Select(range) => model.buffer.select(range),
        Message::ClearSelection => model.buffer.clear_selection(),

        Message::SetText(text) => model.set_text(&text),
        Message::Normalize => {
            model.normalize();
        }
        Message::MarkClean => model.buffer.mark_clean(),
    }
    model
}
