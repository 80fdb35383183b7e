use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    User,
    Assistant,
}

impl Marker {
    /// Lowercase speaker name, as used in JSON output and glyph labels.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Reasons a marker vocabulary is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerSetError {
    #[error("{0} marker must not be empty")]
    Empty(Marker),
    #[error("{0} marker must fit on a single line")]
    Multiline(Marker),
    #[error("{0} marker must not start or end with whitespace")]
    Padded(Marker),
    #[error("user and assistant markers must differ (both are {0:?})")]
    Identical(String),
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The literal lines that open user and assistant turns.
///
/// Built once and passed explicitly to everything that needs to recognize
/// markers; nothing in the crate hardcodes the literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    user: String,
    assistant: String,
}

impl MarkerSet {
    /// Create a marker set from two literals.
    ///
    /// # Errors
    /// Returns an error if a literal is empty, spans lines, carries
    /// surrounding whitespace, or both literals are the same.
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Result<Self, MarkerSetError> {
        let user = user.into();
        let assistant = assistant.into();
        validate(Marker::User, &user)?;
        validate(Marker::Assistant, &assistant)?;
        if user == assistant {
            return Err(MarkerSetError::Identical(user));
        }
        Ok(Self { user, assistant })
    }

    /// The `__1` / `__2` vocabulary used by older transcripts.
    pub fn legacy() -> Self {
        Self {
            user: "__1".to_string(),
            assistant: "__2".to_string(),
        }
    }

    /// Literal for the given speaker.
    pub fn literal(&self, marker: Marker) -> &str {
        match marker {
            Marker::User => &self.user,
            Marker::Assistant => &self.assistant,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn assistant(&self) -> &str {
        &self.assistant
    }

    /// Classify a line; `None` for ordinary content.
    ///
    /// A trailing `\r` is ignored so CRLF documents classify the same way.
    pub fn classify(&self, line: &str) -> Option<Marker> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line == self.user {
            Some(Marker::User)
        } else if line == self.assistant {
            Some(Marker::Assistant)
        } else {
            None
        }
    }

    pub fn is_marker(&self, line: &str) -> bool {
        self.classify(line).is_some()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            user: "__user".to_string(),
            assistant: "__assistant".to_string(),
        }
    }
}

fn validate(marker: Marker, literal: &str) -> Result<(), MarkerSetError> {
    if literal.is_empty() {
        return Err(MarkerSetError::Empty(marker));
    }
    if literal.contains(['\n', '\r']) {
        return Err(MarkerSetError::Multiline(marker));
    }
    if literal.trim() != literal {
        return Err(MarkerSetError::Padded(marker));
    }
    Ok(())
}
