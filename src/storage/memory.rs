use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::PersistenceError;

/// In-process slot map. Clones share the same slots, which lets a caller keep
/// a handle on what a store has persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn slot(&self, key: &str) -> Option<String> {
        self.slots.lock().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.slots.lock().insert(key.to_owned(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.slot(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::write(key, "memory store is read-only"));
        }
        self.slots.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_each_others_writes() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        store.write("notes", "[1]")?;
        assert_eq!(observer.slot("notes").as_deref(), Some("[1]"));
        assert_eq!(store.read("missing")?, None);
        Ok(())
    }

    #[test]
    fn failing_writes_leave_slot_untouched() {
        let mut store = MemoryStore::new();
        store.put_raw("notes", "old");
        store.set_fail_writes(true);
        assert!(store.write("notes", "new").is_err());
        assert_eq!(store.slot("notes").as_deref(), Some("old"));
        store.set_fail_writes(false);
        assert!(store.write("notes", "new").is_ok());
    }
}
