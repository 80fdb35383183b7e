use std::ops::Range;

/// Read access to a document, addressed by 1-based line numbers and
/// character offsets.
///
/// Transcript logic only ever reads through this trait and hands edits
/// back as a [`ChangeSet`](super::ChangeSet); it never owns the document.
pub trait TextSnapshot {
    /// Total length in characters.
    fn len_chars(&self) -> usize;

    /// Number of lines. An empty document has one (empty) line, and a
    /// trailing line break starts a final empty line.
    fn line_count(&self) -> usize;

    /// Text of line `number` without its line break.
    fn line_text(&self, number: usize) -> Option<String>;

    /// Offset of the first character of line `number`.
    fn line_start(&self, number: usize) -> Option<usize>;

    /// Offset just past the last character of line `number`, before its
    /// line break.
    fn line_end(&self, number: usize) -> Option<usize>;

    /// Line number containing `pos`. Offsets past the end clamp to the
    /// last line.
    fn line_at_offset(&self, pos: usize) -> usize;

    /// Text between two offsets, clamped to the document.
    fn slice(&self, range: Range<usize>) -> String;

    /// All line texts in order.
    fn lines(&self) -> Vec<String> {
        (1..=self.line_count())
            .filter_map(|number| self.line_text(number))
            .collect()
    }
}

/// An immutable snapshot over owned lines, joined with `\n`.
///
/// Useful where text does not live in an [`EditorBuffer`](super::EditorBuffer),
/// such as files normalized from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    lines: Vec<String>,
    starts: Vec<usize>,
    len: usize,
}

impl LineSnapshot {
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(ToOwned::to_owned).collect())
    }

    pub fn from_lines(mut lines: Vec<String>) -> Self {
        if lines.is_empty() {
            lines.push(String::new());
        }
        let mut starts = Vec::with_capacity(lines.len());
        let mut pos = 0;
        for line in &lines {
            starts.push(pos);
            pos += line.chars().count() + 1;
        }
        Self {
            lines,
            starts,
            len: pos - 1,
        }
    }

    fn index(&self, number: usize) -> Option<usize> {
        number
            .checked_sub(1)
            .filter(|idx| *idx < self.lines.len())
    }
}

impl TextSnapshot for LineSnapshot {
    fn len_chars(&self) -> usize {
        self.len
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, number: usize) -> Option<String> {
        self.index(number).map(|idx| {
            let line = &self.lines[idx];
            line.strip_suffix('\r').unwrap_or(line).to_string()
        })
    }

    fn line_start(&self, number: usize) -> Option<usize> {
        self.index(number).map(|idx| self.starts[idx])
    }

    fn line_end(&self, number: usize) -> Option<usize> {
        self.index(number).map(|idx| {
            let line = &self.lines[idx];
            let visible = line.strip_suffix('\r').unwrap_or(line);
            self.starts[idx] + visible.chars().count()
        })
    }

    fn line_at_offset(&self, pos: usize) -> usize {
        // starts is sorted; the containing line is the last start <= pos
        let idx = self.starts.partition_point(|start| *start <= pos);
        idx.max(1)
    }

    fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.len);
        let start = range.start.min(end);
        let mut out = String::new();
        if start == end {
            return out;
        }
        let first = self.line_at_offset(start) - 1;
        for (idx, line) in self.lines.iter().enumerate().skip(first) {
            let line_start = self.starts[idx];
            if line_start >= end {
                break;
            }
            let line_len = self.starts.get(idx + 1).map_or(self.len, |next| next - 1) - line_start;
            let from = start.saturating_sub(line_start);
            let to = (end - line_start).min(line_len);
            out.extend(line.chars().skip(from).take(to - from));
            if end > line_start + line_len {
                out.push('\n');
            }
        }
        out
    }
}
