use std::fmt;

use super::DecorationSet;
use crate::editor::TextSnapshot;
use crate::transcript::Marker;

/// What a decorated marker looks like once rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualElement {
    pub icon: &'static str,
    pub label: &'static str,
    /// Width of the divider rule drawn after the label; zero for none.
    pub rule_width: usize,
}

impl fmt::Display for VisualElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon, self.label)?;
        if self.rule_width > 0 {
            write!(f, " {}", "─".repeat(self.rule_width))?;
        }
        Ok(())
    }
}

/// Chooses the visual for a marker.
pub trait MarkerRenderer {
    fn render(&self, marker: Marker) -> VisualElement;
}

/// Terminal glyphs: a person for the user, a robot for the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRenderer {
    pub rule_width: usize,
}

impl Default for GlyphRenderer {
    fn default() -> Self {
        Self { rule_width: 24 }
    }
}

impl MarkerRenderer for GlyphRenderer {
    fn render(&self, marker: Marker) -> VisualElement {
        let icon = match marker {
            Marker::User => "👤",
            Marker::Assistant => "🤖",
        };
        VisualElement {
            icon,
            label: marker.name(),
            rule_width: self.rule_width,
        }
    }
}

/// Lines of `snapshot` with every decorated span replaced by its visual.
pub fn render_lines(
    snapshot: &impl TextSnapshot,
    decorations: &DecorationSet,
    renderer: &impl MarkerRenderer,
) -> Vec<String> {
    let mut out = Vec::with_capacity(snapshot.line_count());
    for number in 1..=snapshot.line_count() {
        let (Some(start), Some(end)) = (snapshot.line_start(number), snapshot.line_end(number))
        else {
            continue;
        };
        let mut rendered = String::new();
        let mut pos = start;
        for decoration in decorations.in_range(start..end) {
            rendered.push_str(&snapshot.slice(pos..decoration.range.start));
            rendered.push_str(&renderer.render(decoration.marker).to_string());
            pos = decoration.range.end;
        }
        rendered.push_str(&snapshot.slice(pos..end));
        out.push(rendered);
    }
    out
}
