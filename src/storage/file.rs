use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{is_valid_slot_key, KeyValueStore};
use crate::error::PersistenceError;

const SLOT_EXTENSION: &str = "json";
const SLOT_TMP_EXTENSION: &str = "json.tmp";

/// Stores each slot as `<key>.json` inside one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating slot directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn slot_path(&self, key: &str) -> Option<PathBuf> {
        is_valid_slot_key(key).then(|| self.dir.join(format!("{key}.{SLOT_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self
            .slot_path(key)
            .ok_or_else(|| PersistenceError::read(key, "invalid slot key"))?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistenceError::read(key, err)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self
            .slot_path(key)
            .ok_or_else(|| PersistenceError::write(key, "invalid slot key"))?;
        write_atomic(&path, value.as_bytes()).map_err(|err| PersistenceError::write(key, err))
    }
}

/// Writes next to `path` and renames into place so readers never observe a
/// partially written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension(SLOT_TMP_EXTENSION);
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    #[test]
    fn missing_slot_reads_as_none() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::open(temp.path().join("slots"))?;
        assert_eq!(store.read("notes")?, None);
        Ok(())
    }

    #[test]
    fn write_replaces_slot_without_leaving_temp_files() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut store = FileStore::open(temp.path())?;
        store.write("notes", "[\"first\"]")?;
        store.write("notes", "[\"second\"]")?;
        assert_eq!(store.read("notes")?.as_deref(), Some("[\"second\"]"));

        let names: Vec<_> = fs::read_dir(temp.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["notes.json".to_string()]);
        Ok(())
    }

    #[test]
    fn rejects_keys_that_would_escape_the_directory() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut store = FileStore::open(temp.path())?;
        assert_matches!(store.write("../notes", "[]"), Err(err) if err.key == "../notes");
        assert!(store.read("a/b").is_err());
        Ok(())
    }

    #[test]
    fn surviving_data_is_visible_to_a_new_handle() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        {
            let mut store = FileStore::open(temp.path())?;
            store.write("notes", "[]")?;
        }
        let reopened = FileStore::open(temp.path())?;
        assert_eq!(reopened.read("notes")?.as_deref(), Some("[]"));
        Ok(())
    }
}
