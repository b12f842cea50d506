use envconfig::Envconfig;
use log::debug;
use std::time::Duration;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "CUBE_QUERY_TIMEOUT_MS")]
    pub query_timeout_ms: Option<u64>,

    #[envconfig(from = "CUBE_STATE_DIR", default = ".cube-explorer")]
    pub state_dir: String,

    #[envconfig(from = "CUBE_METADATA_PATH", default = "cube_metadata.json")]
    pub metadata_path: String,

    #[envconfig(from = "CUBE_CONNECTION", default = "local")]
    pub connection: String,
}

impl Config {
    pub fn new() -> Result<Self, envconfig::Error> {
        let config = Self::init_from_env()?;
        debug!(
            "Config loaded: query_timeout_ms={:?}, state_dir={}, metadata_path={}, connection={}",
            config.query_timeout_ms, config.state_dir, config.metadata_path, config.connection
        );
        Ok(config)
    }

    /// Upper bound on a single query; `None` waits for the model indefinitely.
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_timeout_ms: None,
            state_dir: ".cube-explorer".to_string(),
            metadata_path: "cube_metadata.json".to_string(),
            connection: "local".to_string(),
        }
    }
}
