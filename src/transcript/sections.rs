use serde::Serialize;

use super::markers::{Marker, MarkerSet};

/// One speaker turn: a marker line and the content up to the next marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub speaker: Marker,
    /// 1-based line number of the marker line; `None` for text that
    /// precedes the first marker, which is read as an implicit user turn.
    pub start_line: Option<usize>,
    pub body: Vec<String>,
}

impl Section {
    /// Body text joined back into lines.
    pub fn text(&self) -> String {
        self.body.join("\n")
    }

    /// Whether the body holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(|line| line.trim().is_empty())
    }
}

/// Split lines into labeled turns.
///
/// Works on any input, canonical or not; a repeated marker simply starts
/// another section for the same speaker.
pub fn sections<S: AsRef<str>>(lines: &[S], markers: &MarkerSet) -> Vec<Section> {
    let mut out: Vec<Section> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if let Some(speaker) = markers.classify(line) {
            out.push(Section {
                speaker,
                start_line: Some(idx + 1),
                body: Vec::new(),
            });
            continue;
        }
        match out.last_mut() {
            Some(section) => section.body.push(line.to_string()),
            None => out.push(Section {
                speaker: Marker::User,
                start_line: None,
                body: vec![line.to_string()],
            }),
        }
    }
    out
}
