pub mod local;

pub use local::{LocalDataStore, LocalDocument};

use crate::graph::ResponseGraphs;
use crate::metadata::MetadataTree;
use crate::request::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Where to connect. Stored by the persistence layer as a named list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub user: Option<String>,
}

impl ConnectionDescriptor {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: "localhost".to_string(),
            port: None,
            database: String::new(),
            user: None,
        }
    }
}

/// How to initialise a fresh connection, e.g. where cube metadata lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitDescriptor {
    pub metadata: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataStoreError {
    #[error("Could not connect: {0}")]
    ConnectFailed(String),

    #[error("Malformed database: {0}")]
    Malformed(String),

    #[error("Unexpected connection behaviour: {0}")]
    BogusConnection(String),

    #[error("Request rejected: {0}")]
    ValidationFailed(String),

    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
}

/// Owns the database connection and executes requests.
#[async_trait]
pub trait ExecutionModel: Send + Sync {
    /// Opens a connection and extracts the metadata of every cube.
    async fn connect(
        &self,
        connection: &ConnectionDescriptor,
        init: &InitDescriptor,
    ) -> Result<MetadataTree, DataStoreError>;

    async fn execute(&self, request: &Request) -> Result<ResponseGraphs, DataStoreError>;

    async fn disconnect(&self);

    async fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataStoreError::Malformed("missing table 'edges'".to_string());
        assert_eq!(err.to_string(), "Malformed database: missing table 'edges'");

        let err = DataStoreError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Query timeout after 30s");
    }

    #[test]
    fn test_connection_descriptor_defaults() {
        let descriptor: ConnectionDescriptor = serde_json::from_str(
            r#"{"name": "prod", "host": "db.internal", "database": "graphs"}"#,
        )
        .unwrap();
        assert_eq!(descriptor.port, None);
        assert_eq!(descriptor.user, None);
    }
}
