use crate::error::NoteError;
use crate::model::Note;
use crate::store::NoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EditMode {
    Add,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Added(Note),
    Updated(Note),
}

impl SubmitOutcome {
    pub fn note(&self) -> &Note {
        match self {
            SubmitOutcome::Added(note) | SubmitOutcome::Updated(note) => note,
        }
    }
}

/// Whether the single input field is adding a new note or editing one.
///
/// The target is held by id only and resolved against the store on demand.
/// Starting an edit while another is in progress replaces the target and
/// drops whatever draft the previous one had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        target_id: String,
        /// Note text captured when the edit began, for pre-filling the input.
        draft: String,
    },
}

impl EditSession {
    pub fn mode(&self) -> EditMode {
        match self {
            EditSession::Idle => EditMode::Add,
            EditSession::Editing { .. } => EditMode::Edit,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing { .. })
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { target_id, .. } => Some(target_id),
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn target<'s>(&self, store: &'s NoteStore) -> Option<&'s Note> {
        self.target_id().and_then(|id| store.get(id))
    }

    /// Enters edit mode for `id` and returns the text to pre-fill. Unknown ids
    /// leave the session as it was.
    pub fn begin_edit(&mut self, store: &NoteStore, id: &str) -> Result<&str, NoteError> {
        let note = store.get(id).ok_or_else(|| NoteError::not_found(id))?;
        if let Some(previous) = self.target_id().filter(|previous| *previous != id) {
            tracing::debug!(previous, next = id, "edit target replaced");
        }
        *self = EditSession::Editing {
            target_id: note.id.clone(),
            draft: note.text.clone(),
        };
        Ok(self.draft().unwrap_or_default())
    }

    /// Adds a note when idle, otherwise updates the target.
    ///
    /// A rejected edit keeps the session in edit mode so the user can fix the
    /// text. A persistence failure still ends the edit, since the update was
    /// applied in memory.
    pub fn submit(&mut self, store: &mut NoteStore, text: &str) -> Result<SubmitOutcome, NoteError> {
        let EditSession::Editing { target_id, .. } = self else {
            return store.add(text).map(SubmitOutcome::Added);
        };
        match store.update(target_id, text) {
            Ok(note) => {
                *self = EditSession::Idle;
                Ok(SubmitOutcome::Updated(note))
            }
            Err(err) if err.is_durability_only() => {
                *self = EditSession::Idle;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Leaves edit mode without touching the store. Returns whether an edit
    /// was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_editing = self.is_editing();
        *self = EditSession::Idle;
        was_editing
    }

    /// Called after `id` was removed from the store.
    pub fn note_deleted(&mut self, id: &str) -> bool {
        if self.target_id() == Some(id) {
            tracing::debug!(id, "edit target deleted, leaving edit mode");
            *self = EditSession::Idle;
            true
        } else {
            false
        }
    }

    /// Drops the edit if its target no longer exists in `store`.
    pub fn sync_with(&mut self, store: &NoteStore) -> bool {
        match self.target_id() {
            Some(id) if !store.contains(id) => {
                let id = id.to_owned();
                self.note_deleted(&id)
            }
            _ => false,
        }
    }
}
