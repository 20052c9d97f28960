//! Service configuration: discovery, parsing and `${VAR}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        config_dir, data_dir, discover_and_load, load_config, set_config_dir,
    },
    schema::{GenolinkConfig, ProviderSettings, StorageBackend, StorageConfig},
};
