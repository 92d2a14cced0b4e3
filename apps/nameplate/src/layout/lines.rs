//! Input normalization: raw name fields become uppercase, non-empty text lines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single line of text to render. Always non-empty and uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TextLine(String);

impl TextLine {
    /// Trims and uppercases `raw`. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes an ordered list of raw inputs, dropping blank entries.
pub fn normalize_lines<S: AsRef<str>>(raw: &[S]) -> Vec<TextLine> {
    raw.iter().filter_map(|s| TextLine::new(s.as_ref())).collect()
}

/// First and last name as typed by the operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameCard {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl NameCard {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
        }
    }

    /// First name line, then last name line; missing or blank fields are omitted.
    pub fn lines(&self) -> Vec<TextLine> {
        [&self.first_name, &self.last_name]
            .into_iter()
            .flatten()
            .filter_map(|s| TextLine::new(s))
            .collect()
    }
}
