use std::collections::HashMap;

use {async_trait::async_trait, tokio::sync::RwLock};

use crate::{record::CredentialRecord, store::CredentialStore};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, user_id: &str) -> anyhow::Result<Option<CredentialRecord>> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn save(&self, record: &CredentialRecord) -> anyhow::Result<()> {
        self.records
            .write()
            .await
            .insert(record.user_id().to_string(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        genolink_oauth::OAuthTokens,
        secrecy::{ExposeSecret, Secret},
    };

    use {super::*, crate::record::ApiBase};

    #[tokio::test]
    async fn save_then_get() {
        let store = MemoryCredentialStore::new();
        assert!(store.get("alice").await.unwrap().is_none());

        let record = CredentialRecord::provisioned(
            "alice",
            OAuthTokens {
                access_token: Secret::new("A1".into()),
                refresh_token: Secret::new("R1".into()),
                expires_at: 10,
            },
            ApiBase::Production,
            vec!["p1".into()],
        );
        store.save(&record).await.unwrap();

        let loaded = store.get("alice").await.unwrap().unwrap();
        assert_eq!(loaded.access_token().expose_secret(), "A1");
        assert_eq!(store.len().await, 1);
    }
}
