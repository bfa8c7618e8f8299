use crate::error::{ErrorKind, NoteError};
use crate::model::Note;

use super::state::SubmitOutcome;
use super::NotesApp;

/// A user intent coming from the rendering layer, addressed by note id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit(String),
    BeginEdit(String),
    CancelEdit,
    Delete(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Added(Note),
    Updated(Note),
    EditStarted { id: String, draft: String },
    EditCancelled { was_editing: bool },
    Deleted { id: String, existed: bool },
    Cleared { removed: usize },
}

impl From<SubmitOutcome> for ActionOutcome {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Added(note) => ActionOutcome::Added(note),
            SubmitOutcome::Updated(note) => ActionOutcome::Updated(note),
        }
    }
}

pub struct ActionDispatcher<'a> {
    app: &'a mut NotesApp,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(app: &'a mut NotesApp) -> Self {
        Self { app }
    }

    pub fn dispatch(&mut self, action: Action) -> Result<ActionOutcome, NoteError> {
        tracing::trace!(?action, "dispatching");
        match action {
            Action::Submit(text) => self.app.submit(&text).map(ActionOutcome::from),
            Action::BeginEdit(id) => {
                let draft = self.app.begin_edit(&id)?.to_owned();
                Ok(ActionOutcome::EditStarted { id, draft })
            }
            Action::CancelEdit => Ok(ActionOutcome::EditCancelled {
                was_editing: self.app.cancel_edit(),
            }),
            Action::Delete(id) => {
                let existed = self.app.delete(&id)?;
                Ok(ActionOutcome::Deleted { id, existed })
            }
            Action::Clear => Ok(ActionOutcome::Cleared {
                removed: self.app.clear()?,
            }),
        }
    }
}

/// Short message suitable for a status line.
pub fn user_feedback(err: &NoteError) -> String {
    match err.kind() {
        ErrorKind::Validation => format!("Cannot save note: {err}."),
        ErrorKind::NotFound => "That note no longer exists.".to_string(),
        ErrorKind::Persistence => {
            "Saved in this session, but writing to storage failed; changes may be lost.".to_string()
        }
        ErrorKind::Snapshot => format!("Backup not restored: {err}."),
    }
}
