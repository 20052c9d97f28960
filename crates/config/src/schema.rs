/// Config schema: provider endpoints and HTTP limits, credential storage.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenolinkConfig {
    pub provider: ProviderSettings,
    pub storage: StorageConfig,
}

/// Where the genetic-data provider lives and how hard we lean on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL for accounts with real profile data.
    pub production_base: String,

    /// Base URL serving the provider's sample data.
    pub demo_base: String,

    /// Whole-request timeout for every outbound call.
    pub request_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Upper bound on concurrent genotype requests per query.
    pub max_in_flight: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            production_base: "https://api.23andme.com/1/".into(),
            demo_base: "https://api.23andme.com/1/demo/".into(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            max_in_flight: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// File for the json/sqlite backends. Defaults under the data dir.
    pub path: Option<PathBuf>,
}
