use crate::persistence::{Persistence, PersistenceError};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Persistence for FileStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        let path = self.path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {}", path.display());
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::ConnectionDescriptor;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.load::<Vec<String>>("views").unwrap(), None);

        store
            .save("views", &vec!["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(
            store.load::<Vec<String>>("views").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_connections_survive_new_store() {
        let dir = tempdir().unwrap();
        FileStore::new(dir.path())
            .remember_connection(ConnectionDescriptor::local("local"))
            .unwrap();

        let connections = FileStore::new(dir.path()).load_connections().unwrap();
        assert_eq!(connections, vec![ConnectionDescriptor::local("local")]);
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("views.json"), "not json").unwrap();

        let result = FileStore::new(dir.path()).load::<Vec<String>>("views");
        assert!(matches!(result, Err(PersistenceError::Serialization(_))));
    }
}
