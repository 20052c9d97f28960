use std::sync::Arc;

use {
    anyhow::{Context, Result},
    genolink_config::{GenolinkConfig, StorageBackend, StorageConfig, data_dir},
    genolink_credentials::{
        CredentialStore, JsonFileCredentialStore, MemoryCredentialStore, SqliteCredentialStore,
    },
    genolink_genotypes::GenotypeService,
    genolink_oauth::{DEFAULT_PROVIDER, load_oauth_config},
    serde_json::{Value, json},
    tracing::{debug, warn},
};

pub async fn build_service(config: &GenolinkConfig) -> Result<GenotypeService> {
    let oauth = load_oauth_config(DEFAULT_PROVIDER)
        .with_context(|| format!("no OAuth configuration for {DEFAULT_PROVIDER}"))?;
    if oauth.client_id.is_empty() {
        warn!(
            provider = DEFAULT_PROVIDER,
            "OAuth client id is empty; token exchanges will be rejected"
        );
    }

    let store = open_store(&config.storage).await?;
    Ok(GenotypeService::from_settings(store, oauth, &config.provider)?)
}

pub async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match storage.backend {
        StorageBackend::Json => {
            let path = storage
                .path
                .clone()
                .unwrap_or_else(|| data_dir().join("credentials.json"));
            debug!(path = %path.display(), "using json credential store");
            Arc::new(JsonFileCredentialStore::new(path))
        },
        StorageBackend::Sqlite => {
            let path = storage
                .path
                .clone()
                .unwrap_or_else(|| data_dir().join("credentials.db"));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            debug!(path = %path.display(), "using sqlite credential store");
            let url = format!("sqlite://{}", path.display());
            Arc::new(SqliteCredentialStore::connect(&url).await?)
        },
        StorageBackend::Memory => {
            warn!("memory credential store does not outlive this process");
            Arc::new(MemoryCredentialStore::new())
        },
    };
    Ok(store)
}

pub async fn provision(service: &GenotypeService, user: &str, code: &str) -> Result<Value> {
    let record = service.provision(user, code).await?;
    Ok(json!({
        "user_id": record.user_id(),
        "api_base": record.api_base(),
        "expires_at": record.expires_at(),
        "profiles": record.profiles(),
    }))
}

pub async fn profiles(service: &GenotypeService, user: &str) -> Result<Value> {
    Ok(serde_json::to_value(service.list_profiles(user).await?)?)
}

pub async fn genotypes(
    service: &GenotypeService,
    user: &str,
    rsids: &[String],
    profiles: &[String],
) -> Result<Value> {
    let only = (!profiles.is_empty()).then_some(profiles);
    Ok(serde_json::to_value(
        service.query_genotypes(user, rsids, only).await?,
    )?)
}

pub async fn resync_profiles(service: &GenotypeService, user: &str) -> Result<Value> {
    let ids = service.resync_profiles(user).await?;
    Ok(json!({ "user_id": user, "profiles": ids }))
}

pub async fn status(service: &GenotypeService, user: &str) -> Result<Value> {
    Ok(serde_json::to_value(service.credential_status(user).await?)?)
}
