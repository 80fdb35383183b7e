use std::time::Duration;

use tempfile::tempdir;

use crate::decoration::MarkerDecorator;
use crate::editor::{Change, ChangeSet, Direction};
use crate::transcript::{Marker, MarkerSet};

use super::{App, FormatMode, Message, Model, update};

fn create_test_model(text: &str) -> Model {
    Model::new(text, MarkerSet::default()).unwrap()
}

fn press(model: Model, messages: Vec<Message>) -> Model {
    messages.into_iter().fold(model, update)
}

fn assert_decorations_current(model: &Model) {
    let decorator = MarkerDecorator::new(model.markers()).unwrap();
    assert_eq!(model.decorations(), &decorator.create(&model.buffer));
}

#[test]
fn test_second_blank_line_after_assistant_opens_user_turn() {
    let model = create_test_model("__user\nhi\n__assistant\nreply\n");
    let model = press(model, vec![Message::DocumentEnd, Message::Enter]);
    assert_eq!(model.text(), "__user\nhi\n__assistant\nreply\n\n__user");
    assert_eq!(model.auto_continuations(), 1);
    assert_eq!(model.caret_offset(), 35);
    assert_decorations_current(&model);
}

#[test]
fn test_typing_two_enters_after_reply() {
    let model = create_test_model("__user\nhello\n__assistant\nworld");
    let model = press(model, vec![Message::DocumentEnd, Message::Enter]);
    assert_eq!(model.auto_continuations(), 0);
    let model = update(model, Message::Enter);
    assert_eq!(model.text(), "__user\nhello\n__assistant\nworld\n\n__user");
    assert_eq!(model.auto_continuations(), 1);
}

#[test]
fn test_single_blank_line_does_nothing() {
    let model = create_test_model("__user\nhi\n__assistant\nreply");
    let model = press(model, vec![Message::DocumentEnd, Message::Enter]);
    assert_eq!(model.text(), "__user\nhi\n__assistant\nreply\n");
    assert_eq!(model.auto_continuations(), 0);
}

#[test]
fn test_blank_lines_in_user_turn_do_nothing() {
    let model = create_test_model("__user\nhi\n");
    let model = press(model, vec![Message::DocumentEnd, Message::Enter, Message::Enter]);
    assert_eq!(model.text(), "__user\nhi\n\n\n");
    assert_eq!(model.auto_continuations(), 0);
}

#[test]
fn test_existing_user_marker_below_is_cleared() {
    let mut model = create_test_model("__user\nq\n__assistant\nr\n\n__user");
    model.buffer.set_caret_offset(23);
    let model = update(model, Message::Enter);
    assert_eq!(model.text(), "__user\nq\n__assistant\nr\n\n__user\n");
    assert_eq!(model.auto_continuations(), 1);
    assert_decorations_current(&model);
}

#[test]
fn test_pasting_text_does_not_trigger() {
    let model = create_test_model("__user\nhi\n__assistant\nreply\n");
    let model = press(
        model,
        vec![Message::DocumentEnd, Message::InsertText("\n\n".to_string())],
    );
    assert_eq!(model.text(), "__user\nhi\n__assistant\nreply\n\n\n");
    assert_eq!(model.auto_continuations(), 0);
}

#[test]
fn test_caret_skips_over_marker() {
    let model = create_test_model("__user\nhi");
    let model = update(model, Message::Move(Direction::Right));
    assert_eq!(model.caret_offset(), 6);
    let model = update(model, Message::Move(Direction::Left));
    assert_eq!(model.caret_offset(), 0);
}

#[test]
fn test_word_left_stops_at_marker_edge() {
    let model = create_test_model("x __user\n__assistant\nok");
    let model = press(model, vec![Message::Move(Direction::Down), Message::End]);
    assert_eq!(model.caret_offset(), 20);
    let model = update(model, Message::WordLeft);
    assert_eq!(model.caret_offset(), 9);
}

#[test]
fn test_normalize_message_rewrites_document() {
    let model = create_test_model("hi\n__assistant\n__assistant\nok");
    let model = update(model, Message::Normalize);
    assert_eq!(model.text(), "__user\nhi\n__assistant\nok");
    assert_eq!(model.auto_continuations(), 0);
    assert_decorations_current(&model);
}

#[test]
fn test_normalize_reports_no_change_on_canonical_text() {
    let mut model = create_test_model("__user\nhi\n__assistant\nok");
    assert!(!model.normalize());
    assert!(!model.buffer.is_dirty());
}

#[test]
fn test_set_text_replaces_document_and_decorations() {
    let model = create_test_model("__user\nold");
    let model = update(model, Message::SetText("a\n__assistant\nb".to_string()));
    assert_eq!(model.text(), "a\n__assistant\nb");
    let markers: Vec<Marker> = model.decorations().iter().map(|d| d.marker).collect();
    assert_eq!(markers, vec![Marker::Assistant]);
    assert_decorations_current(&model);
}

#[test]
fn test_selection_text_and_replace() {
    let model = create_test_model("__user\nhello world");
    let model = update(model, Message::Select(13..18));
    assert_eq!(model.selection_text(), "world");
    let model = update(model, Message::InsertText("there".to_string()));
    assert_eq!(model.text(), "__user\nhello there");
    assert_eq!(model.selection_text(), "");
}

#[test]
fn test_backspace_over_marker_updates_decorations() {
    let mut model = create_test_model("__user\nhi");
    model.buffer.set_caret_offset(6);
    let model = update(model, Message::Backspace);
    assert_eq!(model.text(), "__use\nhi");
    assert!(model.decorations().is_empty());
}

#[test]
fn test_dispatch_rejects_out_of_bounds_batch() {
    let mut model = create_test_model("__user");
    let changes = ChangeSet::single(Change::delete(2..40)).unwrap();
    assert!(model.dispatch(&changes).is_err());
    assert_eq!(model.text(), "__user");
}

#[test]
fn test_mark_clean_resets_dirty_flag() {
    let model = create_test_model("__user\n");
    let model = press(model, vec![Message::DocumentEnd, Message::InsertChar('x')]);
    assert!(model.buffer.is_dirty());
    let model = update(model, Message::MarkClean);
    assert!(!model.buffer.is_dirty());
}

#[test]
fn test_legacy_vocabulary_drives_monitor() {
    let model = Model::new("__1\nq\n__2\na\n", MarkerSet::legacy()).unwrap();
    let model = press(model, vec![Message::DocumentEnd, Message::Enter]);
    assert_eq!(model.text(), "__1\nq\n__2\na\n\n__1");
}

#[test]
fn test_format_file_rewrites_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "hi\n__assistant\n__assistant\nok\n").unwrap();

    let app = App::new(MarkerSet::default());
    let report = app.format_file(&path, FormatMode::Write).unwrap();
    assert!(report.changed);
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "__user\nhi\n__assistant\nok\n");

    let again = app.format_file(&path, FormatMode::Write).unwrap();
    assert!(!again.changed);
}

#[test]
fn test_format_file_check_leaves_file_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "hi").unwrap();

    let app = App::new(MarkerSet::default());
    let report = app.format_file(&path, FormatMode::Check).unwrap();
    assert!(report.changed);
    assert_eq!(report.text, "__user\nhi");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi");
}

#[test]
fn test_format_missing_file_has_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.txt");
    let err = App::new(MarkerSet::default())
        .format_file(&path, FormatMode::Check)
        .unwrap_err();
    assert!(err.to_string().contains("missing.txt"));
}

#[test]
fn test_sections_report_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "__user\nhi\n__assistant\nok").unwrap();

    let json = App::new(MarkerSet::default())
        .sections_report(&path, true)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["speaker"], "user");
    assert_eq!(value[0]["start_line"], 1);
    assert_eq!(value[1]["speaker"], "assistant");
    assert_eq!(value[1]["body"][0], "ok");
}

#[test]
fn test_sections_report_plain() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "preface\n__assistant\n\n  answer").unwrap();

    let report = App::new(MarkerSet::default())
        .sections_report(&path, false)
        .unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines, vec!["    -  user       preface", "    2  assistant  answer"]);
}

#[test]
fn test_sections_report_flattens_body_and_flags_empty_turns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "__user
why is
  the sky

blue?
__assistant
   
").unwrap();

    let report = App::new(MarkerSet::default())
        .sections_report(&path, false)
        .unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(
        lines,
        vec!["    1  user       why is the sky blue?", "    6  assistant  (empty)"]
    );
}

#[test]
fn test_render_file_uses_glyphs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "__user\nhi\n__assistant\nok").unwrap();

    let out = App::new(MarkerSet::default())
        .with_rule_width(0)
        .render_file(&path)
        .unwrap();
    assert_eq!(out, "👤 user\nhi\n🤖 assistant\nok");
}

#[test]
fn test_migrate_file_relabels_legacy_markers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, "__1\nq\n__2\r\na\n").unwrap();

    let app = App::new(MarkerSet::default());
    let report = app
        .migrate_file(&path, &MarkerSet::legacy(), FormatMode::Write)
        .unwrap();
    assert!(report.changed);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "__user\nq\n__assistant\r\na\n"
    );
}

#[test]
fn test_watch_poll_reformats_changed_file() {
    let dir = tempdir().unwrap();
    let canonical_dir = dir.path().canonicalize().unwrap();
    let path = canonical_dir.join("chat.txt");
    std::fs::write(&path, "__user\nhi\n").unwrap();

    let app = App::new(MarkerSet::default()).with_debounce(Duration::from_millis(50));
    let mut watcher = app.make_file_watcher(&path).unwrap();
    std::thread::sleep(Duration::from_millis(500));
    std::fs::write(&path, "hi\n__assistant\n__assistant\n").unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let mut rewritten = false;
    while std::time::Instant::now() < deadline {
        if app.poll_watcher(&mut watcher).unwrap() {
            rewritten = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(rewritten, "watch should reformat the file after a change");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "__user\nhi\n__assistant\n"
    );
}
