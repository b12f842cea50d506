pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use crate::data_store::ConnectionDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const CONNECTIONS_KEY: &str = "connections";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Opaque load/save of serializable state under string keys.
pub trait Persistence: Send + Sync {
    /// `Ok(None)` when nothing was ever saved under `key`.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError>;

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistenceError>;

    fn load_connections(&self) -> Result<Vec<ConnectionDescriptor>, PersistenceError> {
        Ok(self.load(CONNECTIONS_KEY)?.unwrap_or_default())
    }

    fn save_connections(&self, connections: &[ConnectionDescriptor]) -> Result<(), PersistenceError> {
        self.save(CONNECTIONS_KEY, &connections)
    }

    /// Adds `connection` to the saved list, replacing one with the same name.
    fn remember_connection(&self, connection: ConnectionDescriptor) -> Result<(), PersistenceError> {
        let mut connections = self.load_connections()?;
        match connections.iter_mut().find(|c| c.name == connection.name) {
            Some(existing) => *existing = connection,
            None => connections.push(connection),
        }
        self.save_connections(&connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_connection_replaces_by_name() {
        let store = MemoryStore::new();
        store
            .remember_connection(ConnectionDescriptor::local("a"))
            .unwrap();
        store
            .remember_connection(ConnectionDescriptor::local("b"))
            .unwrap();

        let mut replacement = ConnectionDescriptor::local("a");
        replacement.host = "db.internal".to_string();
        store.remember_connection(replacement.clone()).unwrap();

        let connections = store.load_connections().unwrap();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0], replacement);
    }

    #[test]
    fn test_load_connections_defaults_to_empty() {
        assert!(MemoryStore::new().load_connections().unwrap().is_empty());
    }
}
