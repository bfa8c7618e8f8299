use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::macros::format_description;

use crate::clock::SystemClock;
use crate::config::{AppConfig, ConfigLoader};
use crate::error::NoteError;
use crate::logging;
use crate::model::Note;
use crate::storage::{self, write_atomic};
use crate::store::{LoadStatus, NoteStore};

pub mod actions;
pub mod state;

pub use actions::{user_feedback, Action, ActionDispatcher, ActionOutcome};
pub use state::{EditMode, EditSession, SubmitOutcome};

/// Owns the note store and the edit session, and is the only surface a
/// rendering layer talks to. Keeping both behind one owner lets every
/// mutation path tell the session when its target disappears.
#[derive(Debug)]
pub struct NotesApp {
    store: NoteStore,
    session: EditSession,
    backup_dir: Option<PathBuf>,
}

impl NotesApp {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            session: EditSession::default(),
            backup_dir: None,
        }
    }

    /// Opens the configured backend, loads the persisted notes and wires the
    /// wall clock in.
    pub fn open(config: &AppConfig) -> Result<(Self, LoadStatus)> {
        let backend = storage::open(&config.storage).context("opening note storage")?;
        let mut store = NoteStore::new(backend, Box::new(SystemClock))
            .with_slot_key(config.storage.slot_key.clone());
        let status = store.load();
        let app = Self::new(store).with_backup_dir(config.storage.backup_dir.clone());
        Ok((app, status))
    }

    /// Loads (or creates) the config, installs logging at the configured
    /// level and opens the store.
    pub fn bootstrap(loader: &ConfigLoader) -> Result<(Self, LoadStatus)> {
        let config = loader.load_or_init()?;
        if !logging::init_tracing(&config.log_level) {
            tracing::debug!(level = %config.log_level, "host subscriber in use, log_level not applied");
        }
        let (app, status) = Self::open(&config)?;
        tracing::info!(?status, backend = %config.storage.backend, "notes ready");
        Ok((app, status))
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.backup_dir = (!dir.as_os_str().is_empty()).then_some(dir);
        self
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn get_visible_notes(&self, filter: Option<&str>) -> Vec<&Note> {
        self.store.search(filter.unwrap_or_default())
    }

    pub fn get_edit_target(&self) -> Option<&Note> {
        self.session.target(&self.store)
    }

    pub fn edit_mode(&self) -> EditMode {
        self.session.mode()
    }

    pub fn edit_draft(&self) -> Option<&str> {
        self.session.draft()
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<&str, NoteError> {
        self.session.begin_edit(&self.store, id)
    }

    pub fn submit(&mut self, text: &str) -> Result<SubmitOutcome, NoteError> {
        self.session.submit(&mut self.store, text)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.session.cancel()
    }

    pub fn add(&mut self, text: &str) -> Result<Note, NoteError> {
        self.store.add(text)
    }

    pub fn update(&mut self, id: &str, text: &str) -> Result<Note, NoteError> {
        self.store.update(id, text)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, NoteError> {
        let result = self.store.delete(id);
        // a failed write still removed the note from memory
        if !self.store.contains(id) {
            self.session.note_deleted(id);
        }
        result
    }

    pub fn clear(&mut self) -> Result<usize, NoteError> {
        let result = self.store.clear();
        self.session.sync_with(&self.store);
        result
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn export(&self) -> serde_json::Result<String> {
        self.store.export()
    }

    pub fn import(&mut self, snapshot: &str) -> Result<usize, NoteError> {
        let result = self.store.import(snapshot);
        self.session.sync_with(&self.store);
        result
    }

    /// Writes the export snapshot into the backup directory and returns the
    /// file it landed in.
    pub fn write_backup(&self) -> Result<PathBuf> {
        let dir = self
            .backup_dir
            .as_deref()
            .context("no backup directory configured")?;
        let snapshot = self.export().context("serializing notes for backup")?;
        let path = next_backup_path(dir, &self.backup_stamp()?);
        write_atomic(&path, snapshot.as_bytes())
            .with_context(|| format!("writing backup {}", path.display()))?;
        tracing::info!(path = %path.display(), count = self.count(), "notes backed up");
        Ok(path)
    }

    fn backup_stamp(&self) -> Result<String> {
        let format = format_description!("[year][month][day]T[hour][minute][second]Z");
        self.store
            .now()
            .format(format)
            .context("formatting backup timestamp")
    }
}

fn next_backup_path(dir: &Path, stamp: &str) -> PathBuf {
    let mut candidate = dir.join(format!("notes-{stamp}.json"));
    let mut suffix = 1;
    while candidate.exists() {
        candidate = dir.join(format!("notes-{stamp}-{suffix}.json"));
        suffix += 1;
    }
    candidate
}
