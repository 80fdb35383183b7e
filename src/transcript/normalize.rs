use std::ops::Range;

use tracing::debug;

use super::markers::{Marker, MarkerSet};
use crate::editor::{Change, ChangeSet, TextSnapshot};

/// Canonicalize marker placement.
///
/// The result starts with a marker line (a user marker is prepended when
/// needed), and a marker repeating the speaker of the currently open turn
/// is dropped. Content lines are kept verbatim and in order; a user turn
/// is never folded into an assistant turn or vice versa.
///
/// Lines may keep a trailing `\r`. A prepended marker copies the first
/// line's, so CRLF text stays CRLF.
pub fn normalize<S: AsRef<str>>(lines: &[S], markers: &MarkerSet) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + 1);
    let mut current = None;
    let first = lines.first().map(AsRef::as_ref);
    if needs_leading_marker(first, markers) {
        let cr = if first.is_some_and(|line| line.ends_with('\r')) { "\r" } else { "" };
        out.push(format!("{}{cr}", markers.user()));
        current = Some(Marker::User);
    }
    for line in lines {
        let line = line.as_ref();
        if let Some(marker) = markers.classify(line) {
            if current == Some(marker) {
                continue;
            }
            current = Some(marker);
        }
        out.push(line.to_string());
    }
    out
}

/// [`normalize`] over `\n`-separated text.
///
/// Empty text is treated as a document with no lines at all, so it
/// becomes a lone user marker rather than a marker followed by a blank line.
pub fn normalize_text(text: &str, markers: &MarkerSet) -> String {
    let lines: Vec<&str> = if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    };
    normalize(&lines, markers).join("\n")
}

/// Edits that bring `snapshot` into canonical form, as one batch.
///
/// Produces at most one leading insertion plus one deletion per run of
/// dropped marker lines, so undo history and caret placement survive.
/// Returns `None` when the document is already canonical.
pub fn normalization_changes(snapshot: &impl TextSnapshot, markers: &MarkerSet) -> Option<ChangeSet> {
    let line_count = snapshot.line_count();
    let mut changes = Vec::new();
    let mut current = None;

    if snapshot.len_chars() == 0 {
        return ChangeSet::single(Change::insert(0, markers.user())).ok();
    }
    if needs_leading_marker(snapshot.line_text(1).as_deref(), markers) {
        let newline = if ends_with_cr(snapshot, 1) { "\r\n" } else { "\n" };
        changes.push(Change::insert(0, format!("{}{newline}", markers.user())));
        current = Some(Marker::User);
    }

    // Runs of consecutive dropped line numbers.
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for number in 1..=line_count {
        let Some(text) = snapshot.line_text(number) else {
            continue;
        };
        let Some(marker) = markers.classify(&text) else {
            continue;
        };
        if current != Some(marker) {
            current = Some(marker);
            continue;
        }
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == number => *last = number,
            _ => runs.push((number, number)),
        }
    }

    if changes.is_empty() && runs.is_empty() {
        return None;
    }
    debug!(
        leading_marker = !changes.is_empty(),
        dropped_runs = runs.len(),
        "normalizing transcript"
    );
    changes.extend(
        runs.into_iter()
            .filter_map(|(first, last)| run_removal_range(snapshot, first, last))
            .map(Change::delete),
    );
    ChangeSet::new(changes).ok()
}

fn needs_leading_marker(first: Option<&str>, markers: &MarkerSet) -> bool {
    !first.is_some_and(|line| markers.is_marker(line))
}

/// Whether line `number` ends in `\r`, before its `\n` if it has one.
fn ends_with_cr(snapshot: &impl TextSnapshot, number: usize) -> bool {
    let Some(start) = snapshot.line_start(number) else {
        return false;
    };
    let end = snapshot.line_start(number + 1).unwrap_or_else(|| snapshot.len_chars());
    let raw = snapshot.slice(start..end);
    raw.strip_suffix('\n').unwrap_or(&raw).ends_with('\r')
}

/// Range covering lines `first..=last` plus one adjacent `\n`.
///
/// A run reaching the end of the document takes the `\n` before it,
/// any other run the one after it. A `\r` on the previous line is kept,
/// matching a split on `\n`. Line 1 is never dropped, so a trailing run
/// always has a previous line.
fn run_removal_range(snapshot: &impl TextSnapshot, first: usize, last: usize) -> Option<Range<usize>> {
    if last < snapshot.line_count() {
        return Some(snapshot.line_start(first)?..snapshot.line_start(last + 1)?);
    }
    let prev_break = snapshot.line_start(first)?.checked_sub(1)?;
    Some(prev_break..snapshot.len_chars())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{EditorBuffer, LineSnapshot};

    const U: &str = "__user";
    const A: &str = "__assistant";

    fn markers() -> MarkerSet {
        MarkerSet::default()
    }

    fn norm(lines: &[&str]) -> Vec<String> {
        normalize(lines, &markers())
    }

    #[test]
    fn test_empty_input_becomes_single_user_marker() {
        let empty: [&str; 0] = [];
        assert_eq!(norm(&empty), vec![U]);
    }

    #[test]
    fn test_duplicate_user_markers_merge() {
        assert_eq!(norm(&[U, "a", U, "b"]), vec![U, "a", "b"]);
    }

    #[test]
    fn test_missing_leading_marker_is_inserted() {
        assert_eq!(norm(&["a", "b"]), vec![U, "a", "b"]);
    }

    #[test]
    fn test_adjacent_assistant_markers_merge() {
        assert_eq!(norm(&[U, A, A, "x"]), vec![U, A, "x"]);
    }

    #[test]
    fn test_inserted_marker_opens_the_user_turn() {
        assert_eq!(norm(&["a", U, "b"]), vec![U, "a", "b"]);
    }

    #[test]
    fn test_leading_assistant_marker_is_kept() {
        assert_eq!(norm(&[A, "x", A, U]), vec![A, "x", U]);
    }

    #[test]
    fn test_alternating_turns_are_untouched() {
        let lines = [U, "q", A, "r", U, "q2", A, "r2"];
        assert_eq!(norm(&lines), lines.to_vec());
    }

    #[test]
    fn test_content_is_preserved_verbatim() {
        let lines = [U, "  indented", "", "__user trailing", A, "\ttab"];
        assert_eq!(norm(&lines), lines.to_vec());
    }

    #[test]
    fn test_crlf_marker_lines_are_recognized() {
        assert_eq!(
            normalize_text("__user\r\na\r\n__user\r\nb", &markers()),
            "__user\r\na\r\nb"
        );
    }

    #[test]
    fn test_normalize_text_on_empty_string() {
        assert_eq!(normalize_text("", &markers()), U);
    }

    #[test]
    fn test_normalize_text_keeps_trailing_newline() {
        assert_eq!(normalize_text("hi\n", &markers()), "__user\nhi\n");
    }

    #[test]
    fn test_custom_vocabulary() {
        let legacy = MarkerSet::legacy();
        assert_eq!(
            normalize(&["__1", "a", "__1", "__user"], &legacy),
            vec!["__1", "a", "__user"]
        );
    }

    // --- Edit generation ---

    fn apply_normalization(text: &str) -> String {
        let mut buf = EditorBuffer::from_text(text);
        if let Some(changes) = normalization_changes(&buf, &markers()) {
            buf.apply(&changes).unwrap();
        }
        buf.text()
    }

    #[test]
    fn test_changes_none_when_canonical() {
        let snap = LineSnapshot::from_text("__user\nhi\n__assistant\nyo");
        assert!(normalization_changes(&snap, &markers()).is_none());
    }

    #[test]
    fn test_changes_delete_duplicate_lines() {
        let text = "__user\na\n__user\nb";
        let snap = LineSnapshot::from_text(text);
        let changes = normalization_changes(&snap, &markers()).unwrap();
        assert_eq!(changes.changes(), &[Change::delete(9..16)]);
        assert_eq!(apply_normalization(text), "__user\na\nb");
    }

    #[test]
    fn test_changes_insert_leading_marker() {
        assert_eq!(apply_normalization("a\nb"), "__user\na\nb");
    }

    #[test]
    fn test_changes_remove_duplicate_last_line() {
        assert_eq!(
            apply_normalization("__user\n__assistant\nx\n__assistant"),
            "__user\n__assistant\nx"
        );
    }

    #[test]
    fn test_changes_merge_consecutive_duplicates_at_end() {
        assert_eq!(
            apply_normalization("__user\nx\n__user\n__user"),
            "__user\nx"
        );
    }

    #[test]
    fn test_crlf_trailing_duplicate_keeps_previous_line_ending() {
        let text = "__user\r\nx\r\n__user";
        assert_eq!(apply_normalization(text), "__user\r\nx\r");
        assert_eq!(apply_normalization(text), normalize_text(text, &markers()));
    }

    #[test]
    fn test_crlf_leading_marker_uses_crlf() {
        assert_eq!(apply_normalization("a\r\nb"), "__user\r\na\r\nb");
        assert_eq!(normalize_text("a\r\nb", &markers()), "__user\r\na\r\nb");
        assert_eq!(apply_normalization("a\r"), normalize_text("a\r", &markers()));
    }

    #[test]
    fn test_changes_match_pure_normalizer() {
        let text = "intro\n__user\n__assistant\n__assistant\nreply\n\n__assistant\n__user";
        assert_eq!(apply_normalization(text), normalize_text(text, &markers()));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn transcript_line() -> impl Strategy<Value = String> {
            prop_oneof![
                Just(U.to_string()),
                Just(A.to_string()),
                Just(String::new()),
                Just("x\r".to_string()),
                Just(format!("{U}\r")),
                "[a-z ]{1,6}",
            ]
        }

        proptest! {
            #[test]
            fn normalize_is_idempotent(lines in prop::collection::vec(transcript_line(), 0..30)) {
                let once = normalize(&lines, &markers());
                let twice = normalize(&once, &markers());
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn normalized_turns_alternate(lines in prop::collection::vec(transcript_line(), 0..30)) {
                let out = normalize(&lines, &markers());
                prop_assert!(markers().is_marker(&out[0]));
                let speakers: Vec<Marker> = out.iter().filter_map(|l| markers().classify(l)).collect();
                prop_assert!(speakers.windows(2).all(|w| w[0] != w[1]));
            }

            #[test]
            fn normalize_preserves_content_lines(lines in prop::collection::vec(transcript_line(), 0..30)) {
                let out = normalize(&lines, &markers());
                let content = |ls: &[String]| -> Vec<String> {
                    ls.iter().filter(|l| !markers().is_marker(l)).cloned().collect()
                };
                prop_assert_eq!(content(&lines), content(&out));
            }

            #[test]
            fn changes_agree_with_normalizer(lines in prop::collection::vec(transcript_line(), 0..30)) {
                let text = lines.join("\n");
                prop_assert_eq!(apply_normalization(&text), normalize_text(&text, &markers()));
            }
        }
    }
}
