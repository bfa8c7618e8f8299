use std::collections::HashSet;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::DEFAULT_SLOT_KEY;
use crate::error::{NoteError, PersistenceError};
use crate::model::{validate_text, Note, RecordDefect};
use crate::search::SearchQuery;
use crate::storage::KeyValueStore;

/// Result of reading the persisted slot. Loading never fails: anything short
/// of a clean read leaves the store empty (or partially filled) and says why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded { count: usize, dropped: usize },
    Missing,
    Corrupt,
    /// The backend failed to read; the slot may still hold notes. The next
    /// mutation rewrites the slot with only what is in memory.
    Unreadable,
}

impl LoadStatus {
    /// Whether persisted data exists that the next mutation will overwrite
    /// without having loaded it.
    pub fn discards_persisted_data(&self) -> bool {
        match self {
            LoadStatus::Loaded { dropped, .. } => *dropped > 0,
            LoadStatus::Missing => false,
            LoadStatus::Corrupt | LoadStatus::Unreadable => true,
        }
    }
}

/// Ordered, newest-first list of notes mirrored into one key-value slot.
///
/// Every successful mutation rewrites the whole slot before returning. When
/// that write fails the mutation stays applied in memory and the caller gets
/// [`NoteError::Persistence`].
pub struct NoteStore {
    backend: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    slot_key: String,
    notes: Vec<Note>,
}

impl NoteStore {
    pub fn new(backend: Box<dyn KeyValueStore>, clock: Box<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            notes: Vec::new(),
        }
    }

    pub fn with_slot_key(mut self, slot_key: impl Into<String>) -> Self {
        self.slot_key = slot_key.into();
        self
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    pub fn load(&mut self) -> LoadStatus {
        self.notes.clear();
        let raw = match self.backend.read(&self.slot_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(slot = %self.slot_key, "no persisted notes, starting empty");
                return LoadStatus::Missing;
            }
            Err(err) => {
                tracing::error!(
                    slot = %self.slot_key,
                    error = %err,
                    "persisted notes unreadable, starting empty; next change overwrites the slot"
                );
                return LoadStatus::Unreadable;
            }
        };
        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    slot = %self.slot_key,
                    error = %err,
                    "persisted notes corrupt, starting empty"
                );
                return LoadStatus::Corrupt;
            }
        };

        let mut seen = HashSet::new();
        let mut dropped = 0;
        for (index, value) in records.into_iter().enumerate() {
            let admitted = serde_json::from_value::<Note>(value)
                .map_err(|err| err.to_string())
                .and_then(|note| note.admit().map_err(|defect| defect.to_string()))
                .and_then(|note| {
                    if seen.insert(note.id.clone()) {
                        Ok(note)
                    } else {
                        Err(RecordDefect::DuplicateId.to_string())
                    }
                });
            match admitted {
                Ok(note) => self.notes.push(note),
                Err(reason) => {
                    dropped += 1;
                    tracing::warn!(index, %reason, "dropping invalid persisted note");
                }
            }
        }
        let count = self.notes.len();
        tracing::info!(count, dropped, "loaded notes");
        LoadStatus::Loaded { count, dropped }
    }

    pub fn add(&mut self, text: &str) -> Result<Note, NoteError> {
        let text = validate_text(text)?;
        let note = Note::new(self.fresh_id(), text.to_owned(), self.clock.now());
        self.notes.insert(0, note.clone());
        tracing::debug!(id = %note.id, "note added");
        self.persist()?;
        Ok(note)
    }

    pub fn update(&mut self, id: &str, text: &str) -> Result<Note, NoteError> {
        let text = validate_text(text)?;
        let now = self.clock.now();
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| NoteError::not_found(id))?;
        note.text = text.to_owned();
        // a clock that steps backwards must not put updated_at before created_at
        note.updated_at = now.max(note.updated_at);
        let note = note.clone();
        tracing::debug!(id = %note.id, "note updated");
        self.persist()?;
        Ok(note)
    }

    /// Removes the note if present. Deleting an unknown id is a successful
    /// no-op and reports `false`.
    pub fn delete(&mut self, id: &str) -> Result<bool, NoteError> {
        let Some(position) = self.notes.iter().position(|note| note.id == id) else {
            tracing::debug!(id, "delete of unknown note ignored");
            return Ok(false);
        };
        self.notes.remove(position);
        tracing::debug!(id, "note deleted");
        self.persist()?;
        Ok(true)
    }

    pub fn search(&self, term: &str) -> Vec<&Note> {
        SearchQuery::parse(term).filter(&self.notes)
    }

    /// Drops every note, returning how many were removed.
    pub fn clear(&mut self) -> Result<usize, NoteError> {
        let removed = self.notes.len();
        self.notes.clear();
        tracing::info!(removed, "notes cleared");
        self.persist()?;
        Ok(removed)
    }

    pub fn count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Pretty-printed JSON array of every note, in store order.
    pub fn export(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.notes)
    }

    /// Replaces the whole sequence with the notes in `snapshot` (as produced
    /// by [`NoteStore::export`]). Any unparseable or invalid record rejects
    /// the import and leaves the store untouched.
    pub fn import(&mut self, snapshot: &str) -> Result<usize, NoteError> {
        let records: Vec<Note> = serde_json::from_str(snapshot)?;
        let mut seen = HashSet::new();
        let mut notes = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let id = record.id.clone();
            let invalid = |defect: RecordDefect| NoteError::InvalidRecord {
                index,
                id: id.clone(),
                defect,
            };
            let note = record.admit().map_err(invalid)?;
            if !seen.insert(note.id.clone()) {
                return Err(invalid(RecordDefect::DuplicateId));
            }
            notes.push(note);
        }
        self.notes = notes;
        let count = self.notes.len();
        tracing::info!(count, "notes imported");
        self.persist()?;
        Ok(count)
    }

    fn persist(&mut self) -> Result<(), NoteError> {
        let payload = serde_json::to_string(&self.notes)
            .map_err(|err| PersistenceError::write(self.slot_key.as_str(), err))?;
        self.backend
            .write(&self.slot_key, &payload)
            .map_err(|err| {
                tracing::warn!(error = %err, "persisting notes failed, storage may be stale");
                NoteError::from(err)
            })
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("slot_key", &self.slot_key)
            .field("notes", &self.notes)
            .finish_non_exhaustive()
    }
}
