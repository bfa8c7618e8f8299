use thiserror::Error;

use crate::model::{RecordDefect, MAX_NOTE_CHARS};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("note {id} not found")]
    NotFound { id: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("snapshot could not be parsed: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),

    #[error("snapshot record {index} ({id}) rejected: {defect}")]
    InvalidRecord {
        index: usize,
        id: String,
        defect: RecordDefect,
    },
}

impl NoteError {
    pub fn not_found(id: impl Into<String>) -> Self {
        NoteError::NotFound { id: id.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NoteError::Validation(_) => ErrorKind::Validation,
            NoteError::NotFound { .. } => ErrorKind::NotFound,
            NoteError::Persistence(_) => ErrorKind::Persistence,
            NoteError::MalformedSnapshot(_) | NoteError::InvalidRecord { .. } => {
                ErrorKind::Snapshot
            }
        }
    }

    /// True when the in-memory mutation went through but storage may be stale.
    pub fn is_durability_only(&self) -> bool {
        matches!(self, NoteError::Persistence(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("note text cannot be empty")]
    Empty,
    #[error("note text is {chars} characters long, the limit is {max}")]
    TooLong { chars: usize, max: usize },
}

impl ValidationError {
    pub(crate) fn too_long(chars: usize) -> Self {
        ValidationError::TooLong {
            chars,
            max: MAX_NOTE_CHARS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PersistOp {
    Read,
    Write,
}

#[derive(Debug, Error)]
#[error("failed to {op} slot '{key}': {source}")]
pub struct PersistenceError {
    pub op: PersistOp,
    pub key: String,
    #[source]
    source: BoxError,
}

impl PersistenceError {
    pub fn new(op: PersistOp, key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            op,
            key: key.into(),
            source: source.into(),
        }
    }

    pub fn read(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::new(PersistOp::Read, key, source)
    }

    pub fn write(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::new(PersistOp::Write, key, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_one_to_one() {
        assert_eq!(
            NoteError::from(ValidationError::Empty).kind(),
            ErrorKind::Validation
        );
        assert_eq!(NoteError::not_found("abc").kind(), ErrorKind::NotFound);
        let err = NoteError::from(PersistenceError::write("notes", "disk full"));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.is_durability_only());
        assert_eq!(ErrorKind::NotFound.to_string(), "not-found");
    }

    #[test]
    fn persistence_error_names_operation_and_slot() {
        let err = PersistenceError::read("notes", "permission denied");
        assert_eq!(
            err.to_string(),
            "failed to read slot 'notes': permission denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn too_long_reports_limit() {
        let err = ValidationError::too_long(5001);
        assert_eq!(
            err.to_string(),
            "note text is 5001 characters long, the limit is 5000"
        );
    }
}
