use anyhow::Context;

use crate::config::{BackendKind, StorageOptions};
use crate::error::PersistenceError;

mod file;
mod memory;
mod schema;
mod sqlite;

pub use file::FileStore;
pub(crate) use file::write_atomic;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Opaque key-value persistence medium. Each key names one slot holding a
/// whole serialised value; writes replace the slot in full.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Slot keys double as file names, so they are restricted to a portable set.
pub fn is_valid_slot_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
}

pub fn open(options: &StorageOptions) -> anyhow::Result<Box<dyn KeyValueStore>> {
    let backend: Box<dyn KeyValueStore> = match options.backend {
        BackendKind::File => Box::new(
            FileStore::open(&options.data_dir)
                .with_context(|| format!("opening slot directory {}", options.data_dir.display()))?,
        ),
        BackendKind::Sqlite => Box::new(
            SqliteStore::open(&options.database_path, options.wal_autocheckpoint).with_context(
                || format!("opening slot database {}", options.database_path.display()),
            )?,
        ),
        BackendKind::Memory => Box::new(MemoryStore::new()),
    };
    tracing::debug!(backend = %options.backend, "opened persistence backend");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPaths;
    use tempfile::TempDir;

    #[test]
    fn slot_keys_are_restricted_to_portable_names() {
        assert!(is_valid_slot_key("notes"));
        assert!(is_valid_slot_key("notes_v2-backup"));
        assert!(!is_valid_slot_key(""));
        assert!(!is_valid_slot_key("../escape"));
        assert!(!is_valid_slot_key("with space"));
    }

    #[test]
    fn open_builds_each_configured_backend() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        for backend in [BackendKind::File, BackendKind::Sqlite, BackendKind::Memory] {
            let mut options = StorageOptions {
                backend,
                ..StorageOptions::default()
            };
            options.resolve(&paths);
            let mut store = open(&options)?;
            store.write("notes", "[]")?;
            assert_eq!(store.read("notes")?.as_deref(), Some("[]"), "{backend}");
        }
        Ok(())
    }
}
