use std::{collections::HashMap, path::PathBuf};

use {
    async_trait::async_trait,
    tokio::{io::AsyncWriteExt, sync::Mutex},
    tracing::debug,
};

use crate::{record::CredentialRecord, store::CredentialStore};

/// JSON file store holding every record in one object keyed by user id.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl JsonFileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> anyhow::Result<HashMap<String, CredentialRecord>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) if data.trim().is_empty() => Ok(HashMap::new()),
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                anyhow::anyhow!("failed to parse {}: {e}", self.path.display())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", self.path.display())),
        }
    }

    /// Write `data` to a sibling temp file created owner-only, then rename it
    /// over the store file. Readers see either the old or the new contents.
    async fn replace_file(&self, data: &[u8]) -> anyhow::Result<()> {
        let tmp = self.temp_path();
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    #[cfg(test)]
    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut ids: Vec<String> = self.read_all().await?.into_keys().collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn get(&self, user_id: &str) -> anyhow::Result<Option<CredentialRecord>> {
        Ok(self.read_all().await?.remove(user_id))
    }

    async fn save(&self, record: &CredentialRecord) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut map = self.read_all().await?;
        map.insert(record.user_id().to_string(), record.clone());

        let data = serde_json::to_string_pretty(&map)?;
        self.replace_file(data.as_bytes()).await?;

        debug!(user_id = %record.user_id(), path = %self.path.display(), "saved credential");
        Ok(())
    }
}
