/// Persistence contract for credential records, one per principal.
use async_trait::async_trait;

use crate::record::CredentialRecord;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the record owned by `user_id`.
    async fn get(&self, user_id: &str) -> anyhow::Result<Option<CredentialRecord>>;

    /// Insert or replace the record keyed by its `user_id`.
    async fn save(&self, record: &CredentialRecord) -> anyhow::Result<()>;
}
