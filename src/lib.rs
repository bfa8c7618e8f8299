pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod search;
pub mod storage;
pub mod store;

pub use app::{Action, ActionDispatcher, EditMode, EditSession, NotesApp, SubmitOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use error::{ErrorKind, NoteError, PersistenceError, ValidationError};
pub use model::{Note, MAX_NOTE_CHARS};
pub use store::{LoadStatus, NoteStore};
