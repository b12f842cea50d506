use crate::persistence::{Persistence, PersistenceError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Keeps serialized state in memory; nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn poisoned() -> PersistenceError {
        PersistenceError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "memory store lock poisoned",
        ))
    }
}

impl Persistence for MemoryStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries
            .get(key)
            .map(|content| serde_json::from_str(content))
            .transpose()
            .map_err(PersistenceError::from)
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let content = serde_json::to_string(value)?;
        self.entries
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(key.to_string(), content);
        Ok(())
    }
}
