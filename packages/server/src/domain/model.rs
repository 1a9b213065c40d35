//! Value objects identifying a participant.

use std::fmt;

use uuid::Uuid;

use super::AdmissionError;

/// Identity of one accepted connection.
///
/// Names are unique too, but the sender-exclusion rule compares connections,
/// not names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A participant's display name: trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Build a name from the raw line a client sent.
    ///
    /// # Errors
    ///
    /// Returns `AdmissionError::EmptyName` when nothing is left after trimming.
    pub fn new(raw: &str) -> Result<Self, AdmissionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AdmissionError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive equality, the rule used for uniqueness.
    ///
    /// Compared char by char, so context-dependent lowercasing (a final
    /// `Σ` becoming `ς`) does not split names that fold to the same letters.
    pub fn matches(&self, other: &DisplayName) -> bool {
        self.0.chars().count() == other.0.chars().count()
            && self
                .0
                .chars()
                .zip(other.0.chars())
                .all(|(a, b)| chars_fold_equal(a, b))
    }
}

fn chars_fold_equal(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase()) || a.to_uppercase().eq(b.to_uppercase())
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
