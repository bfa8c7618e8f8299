use crate::model::Note;

/// Case-insensitive substring filter over note text.
///
/// A blank query matches everything, so callers can pass the raw contents of
/// a search box without special-casing the empty state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    needle: Option<String>,
}

impl SearchQuery {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Self::default()
        } else {
            Self {
                needle: Some(trimmed.to_lowercase()),
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.needle.is_none()
    }

    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    pub fn matches(&self, note: &Note) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => note.text.to_lowercase().contains(needle.as_str()),
        }
    }

    /// Keeps the matching notes in their original relative order.
    pub fn filter<'a, I>(&self, notes: I) -> Vec<&'a Note>
    where
        I: IntoIterator<Item = &'a Note>,
    {
        notes.into_iter().filter(|note| self.matches(note)).collect()
    }
}
