//! Marker decorations.
//!
//! Marker lines are shown as an icon instead of their raw literal. This
//! module handles:
//! - Finding marker spans with a regex built once per [`MarkerSet`]
//! - Keeping the spans current across edits without a full rescan
//! - Treating each span as atomic for caret movement
//! - Rendering a span through a [`MarkerRenderer`]

mod render;

pub use render::{GlyphRenderer, MarkerRenderer, VisualElement, render_lines};

use std::ops::Range;

use regex::Regex;

use crate::editor::{Assoc, ChangeSet, TextSnapshot};
use crate::transcript::{Marker, MarkerSet};

/// A marker span replaced by a visual element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Character offsets of the marker literal.
    pub range: Range<usize>,
    pub marker: Marker,
}

/// Decorations in document order, without overlaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    /// The decoration `pos` falls strictly inside of, if any.
    ///
    /// The caret may sit at either edge of a decoration but never within it.
    pub fn atomic_range_at(&self, pos: usize) -> Option<Range<usize>> {
        let idx = self
            .decorations
            .partition_point(|decoration| decoration.range.end <= pos);
        self.decorations
            .get(idx)
            .filter(|decoration| decoration.range.start < pos)
            .map(|decoration| decoration.range.clone())
    }

    /// Decorations overlapping `range`.
    pub fn in_range(&self, range: Range<usize>) -> impl Iterator<Item = &Decoration> {
        self.decorations
            .iter()
            .filter(move |d| d.range.start < range.end && range.start < d.range.end)
    }

    fn from_unsorted(mut decorations: Vec<Decoration>) -> Self {
        decorations.sort_by_key(|decoration| decoration.range.start);
        decorations.dedup_by_key(|decoration| decoration.range.start);
        Self { decorations }
    }
}

/// Matches marker literals occupying a whole line.
#[derive(Debug, Clone)]
pub struct MarkerDecorator {
    pattern: Regex,
}

impl MarkerDecorator {
    /// Compile the matcher for a marker vocabulary.
    ///
    /// # Errors
    /// Returns an error if the pattern cannot be compiled.
    pub fn new(markers: &MarkerSet) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?m)^(?:(?P<user>{})|(?P<assistant>{}))\r?$",
            regex::escape(markers.user()),
            regex::escape(markers.assistant()),
        ))?;
        Ok(Self { pattern })
    }

    /// Decorate a whole document.
    pub fn create(&self, snapshot: &impl TextSnapshot) -> DecorationSet {
        let mut decorations = Vec::new();
        self.scan_lines(snapshot, 1, snapshot.line_count(), &mut decorations);
        DecorationSet::from_unsorted(decorations)
    }

    /// Bring `previous` up to date with `changes`, already applied to
    /// `snapshot`.
    ///
    /// Decorations clear of every change are shifted; lines touched by a
    /// change, and lines whose decoration a change touched, are scanned
    /// again. The result matches [`Self::create`] on
    /// the new document.
    pub fn recompute(
        &self,
        previous: &DecorationSet,
        changes: &ChangeSet,
        snapshot: &impl TextSnapshot,
    ) -> DecorationSet {
        if changes.is_empty() {
            return previous.clone();
        }

        let mut dirty_lines: Vec<(usize, usize)> = changes
            .inserted_ranges()
            .into_iter()
            .map(|inserted| {
                (
                    snapshot.line_at_offset(inserted.start),
                    snapshot.line_at_offset(inserted.end),
                )
            })
            .collect();

        let mut decorations = Vec::with_capacity(previous.len());
        for decoration in previous.iter() {
            let range = changes.map_pos(decoration.range.start, Assoc::Before)
                ..changes.map_pos(decoration.range.end, Assoc::Before);
            // One past the end so an edited line break (or `\r`) counts.
            let touched = changes.changes().iter().any(|change| {
                decoration.range.start <= change.to && change.from <= decoration.range.end + 1
            });
            if touched {
                let line = snapshot.line_at_offset(range.start);
                dirty_lines.push((line, line));
            } else {
                decorations.push(Decoration {
                    range,
                    marker: decoration.marker,
                });
            }
        }

        dirty_lines.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(dirty_lines.len());
        for (first, last) in dirty_lines {
            match merged.last_mut() {
                Some((_, prev_last)) if first <= *prev_last + 1 => {
                    *prev_last = (*prev_last).max(last);
                }
                _ => merged.push((first, last)),
            }
        }
        for (first, last) in merged {
            self.scan_lines(snapshot, first, last, &mut decorations);
        }

        DecorationSet::from_unsorted(decorations)
    }

    fn scan_lines(
        &self,
        snapshot: &impl TextSnapshot,
        first: usize,
        last: usize,
        out: &mut Vec<Decoration>,
    ) {
        let (Some(start), Some(end)) = (snapshot.line_start(first), snapshot.line_end(last)) else {
            return;
        };
        let text = snapshot.slice(start..end);

        // Matches arrive in order, so byte offsets convert incrementally.
        let mut byte_pos = 0;
        let mut char_pos = start;
        for caps in self.pattern.captures_iter(&text) {
            let (marker, found) = match (caps.name("user"), caps.name("assistant")) {
                (Some(found), _) => (Marker::User, found),
                (None, Some(found)) => (Marker::Assistant, found),
                (None, None) => continue,
            };
            char_pos += text[byte_pos..found.start()].chars().count();
            let len = found.as_str().chars().count();
            out.push(Decoration {
                range: char_pos..char_pos + len,
                marker,
            });
            char_pos += len;
            byte_pos = found.end();
        }
    }
}
