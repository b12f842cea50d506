use crate::data_store::{ConnectionDescriptor, DataStoreError, ExecutionModel, InitDescriptor};
use crate::graph::ResponseGraphs;
use crate::metadata::{Cube, MetadataTree};
use crate::request::Request;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// JSON document served by [`LocalDataStore`]: cube metadata plus canned
/// response graphs per cube.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalDocument {
    pub cubes: MetadataTree,
    #[serde(default)]
    pub responses: HashMap<String, ResponseGraphs>,
}

struct Connected {
    connection: String,
    document: LocalDocument,
}

/// File backed execution model answering with canned graphs.
#[derive(Default)]
pub struct LocalDataStore {
    state: Mutex<Option<Connected>>,
}

impl LocalDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn respond(document: &LocalDocument, cube: &Cube, request: &Request) -> ResponseGraphs {
        let keys: Vec<&str> = request.measure_types().map(|m| m.key.as_str()).collect();
        document
            .responses
            .get(cube.name())
            .map(|graphs| graphs.iter().map(|g| g.retain_measures(&keys)).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExecutionModel for LocalDataStore {
    async fn connect(
        &self,
        connection: &ConnectionDescriptor,
        init: &InitDescriptor,
    ) -> Result<MetadataTree, DataStoreError> {
        info!(
            "Connecting '{}' using metadata {}",
            connection.name, init.metadata
        );

        let content = tokio::fs::read_to_string(&init.metadata)
            .await
            .map_err(|e| DataStoreError::ConnectFailed(format!("{}: {}", init.metadata, e)))?;

        let document: LocalDocument = serde_json::from_str(&content)
            .map_err(|e| DataStoreError::Malformed(format!("{}: {}", init.metadata, e)))?;

        let tree = document.cubes.clone();
        *self.state.lock().await = Some(Connected {
            connection: connection.name.clone(),
            document,
        });

        debug!("Loaded cubes {:?}", tree.cube_names());
        Ok(tree)
    }

    async fn execute(&self, request: &Request) -> Result<ResponseGraphs, DataStoreError> {
        let state = self.state.lock().await;
        let connected = state
            .as_ref()
            .ok_or_else(|| DataStoreError::BogusConnection("not connected".to_string()))?;

        let cube = connected
            .document
            .cubes
            .get_cube(request.cube())
            .ok_or_else(|| {
                DataStoreError::ValidationFailed(format!("unknown cube '{}'", request.cube()))
            })?;

        request
            .validate(cube)
            .map_err(|e| DataStoreError::ValidationFailed(e.to_string()))?;

        debug!(
            "Executing request on '{}' with {} constraint(s)",
            connected.connection,
            request.len()
        );
        Ok(Self::respond(&connected.document, cube, request))
    }

    async fn disconnect(&self) {
        match self.state.lock().await.take() {
            Some(connected) => info!("Disconnected '{}'", connected.connection),
            None => warn!("Disconnect requested without an open connection"),
        }
    }

    async fn is_connected(&self) -> bool {
        self.state.lock().await.is_some()
    }
}
