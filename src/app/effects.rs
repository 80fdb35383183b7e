use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::app::{App, FileReport, FormatMode, Model};
use crate::transcript::{MarkerSet, Section, migrate, sections};

const PREVIEW_CHARS: usize = 48;

impl App {
    /// Load `text` into a fresh model.
    ///
    /// # Errors
    /// Returns an error if the marker matcher cannot be built.
    pub fn open(&self, text: &str) -> Result<Model> {
        Model::new(text, self.markers.clone()).context("Failed to build marker matcher")
    }

    /// Normalize a whole document.
    ///
    /// # Errors
    /// Returns an error if the marker matcher cannot be built.
    pub fn format_text(&self, text: &str) -> Result<String> {
        let mut model = self.open(text)?;
        model.normalize();
        Ok(model.text())
    }

    /// Normalize the transcript at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or written.
    pub fn format_file(&self, path: &Path, mode: FormatMode) -> Result<FileReport> {
        let original = read_transcript(path)?;
        let text = self.format_text(&original)?;
        let changed = text != original;
        if changed && mode == FormatMode::Write {
            write_transcript(path, &text)?;
        }
        Ok(FileReport { changed, text })
    }

    /// Describe the turns in the transcript at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn sections_report(&self, path: &Path, json: bool) -> Result<String> {
        let text = read_transcript(path)?;
        let lines = split_lines(&text);
        let found = sections(&lines, &self.markers);
        if json {
            return serde_json::to_string_pretty(&found).context("Failed to serialize sections");
        }
        let mut out = String::new();
        for section in &found {
            let _ = writeln!(out, "{}", summary_line(section));
        }
        Ok(out)
    }

    /// Render the transcript at `path` with marker glyphs.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn render_file(&self, path: &Path) -> Result<String> {
        let text = read_transcript(path)?;
        let model = self.open(&text)?;
        Ok(model.rendered_lines(&self.renderer).join("\n"))
    }

    /// Relabel markers written in the `from` vocabulary.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or written.
    pub fn migrate_file(
        &self,
        path: &Path,
        from: &MarkerSet,
        mode: FormatMode,
    ) -> Result<FileReport> {
        let original = read_transcript(path)?;
        let text = migrate(&split_lines(&original), from, &self.markers).join("\n");
        let changed = text != original;
        if changed && mode == FormatMode::Write {
            write_transcript(path, &text)?;
        }
        Ok(FileReport { changed, text })
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

fn summary_line(section: &Section) -> String {
    let line = section
        .start_line
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let preview: String = if section.is_blank() {
        "(empty)".to_string()
    } else {
        section
            .text()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(PREVIEW_CHARS)
            .collect()
    };
    format!("{:>5}  {:<9}  {}", line, section.speaker.name(), preview)
}

fn read_transcript(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_transcript(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = text.len(), "rewrote transcript");
    Ok(())
}
