use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::error::ValidationError;

pub const MAX_NOTE_CHARS: usize = 5000;

/// A single persisted text note.
///
/// `text` is always trimmed and non-empty, and `updated_at` never precedes
/// `created_at`. The store is the only place that constructs or mutates notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Why a deserialised record cannot be admitted into a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordDefect {
    #[error(transparent)]
    Text(#[from] ValidationError),
    #[error("updatedAt precedes createdAt")]
    TimestampsReversed,
    #[error("id is empty")]
    MissingId,
    #[error("id appears more than once")]
    DuplicateId,
}

impl Note {
    pub(crate) fn new(id: String, text: String, now: OffsetDateTime) -> Self {
        Self {
            id,
            text,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn was_edited(&self) -> bool {
        self.updated_at > self.created_at
    }

    /// Normalises a record read from storage or a snapshot.
    pub(crate) fn admit(mut self) -> Result<Self, RecordDefect> {
        if self.id.trim().is_empty() {
            return Err(RecordDefect::MissingId);
        }
        let trimmed = validate_text(&self.text)?;
        if trimmed.len() != self.text.len() {
            self.text = trimmed.to_owned();
        }
        if self.updated_at < self.created_at {
            return Err(RecordDefect::TimestampsReversed);
        }
        Ok(self)
    }
}

/// Trims `text` and checks it against the note length rules.
pub fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_NOTE_CHARS {
        return Err(ValidationError::too_long(chars));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use time::macros::datetime;

    fn note(text: &str) -> Note {
        Note::new("n-1".into(), text.into(), datetime!(2024-05-01 09:00 UTC))
    }

    #[test]
    fn validate_text_trims_and_bounds() {
        assert_eq!(validate_text("  hello \n").unwrap(), "hello");
        assert_matches!(validate_text(""), Err(ValidationError::Empty));
        assert_matches!(validate_text(" \t\n"), Err(ValidationError::Empty));
        assert!(validate_text(&"x".repeat(MAX_NOTE_CHARS)).is_ok());
        assert_matches!(
            validate_text(&"x".repeat(MAX_NOTE_CHARS + 1)),
            Err(ValidationError::TooLong { chars: 5001, max: 5000 })
        );
    }

    #[test]
    fn length_limit_counts_characters_not_bytes() {
        let text = "é".repeat(MAX_NOTE_CHARS);
        assert!(text.len() > MAX_NOTE_CHARS);
        assert!(validate_text(&text).is_ok());
    }

    #[test]
    fn serialises_with_camel_case_rfc3339_fields() {
        let json = serde_json::to_value(note("buy milk")).unwrap();
        assert_eq!(json["createdAt"], "2024-05-01T09:00:00Z");
        assert_eq!(json["updatedAt"], "2024-05-01T09:00:00Z");
        assert_eq!(json["text"], "buy milk");
    }

    #[test]
    fn admit_trims_text_and_rejects_broken_records() {
        let admitted = note("  padded  ").admit().unwrap();
        assert_eq!(admitted.text, "padded");

        assert_matches!(
            note("   ").admit(),
            Err(RecordDefect::Text(ValidationError::Empty))
        );

        let mut reversed = note("fine");
        reversed.updated_at = datetime!(2024-04-01 09:00 UTC);
        assert_matches!(reversed.admit(), Err(RecordDefect::TimestampsReversed));

        let mut anonymous = note("fine");
        anonymous.id.clear();
        assert_matches!(anonymous.admit(), Err(RecordDefect::MissingId));
    }
}
