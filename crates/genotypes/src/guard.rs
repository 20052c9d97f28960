//! Credential precondition and lazy, serialized token refresh.

use std::sync::Arc;

use {
    dashmap::DashMap,
    genolink_credentials::{CredentialRecord, CredentialStore},
    genolink_oauth::TokenExchanger,
    secrecy::ExposeSecret,
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::{debug, info, warn},
};

use crate::error::{Error, Result};

/// Resolves a principal's credential and keeps it fresh.
///
/// Refresh tokens are single-use at the provider, so refreshes for one
/// principal run under a per-principal lock and re-read the stored record
/// once the lock is held.
pub struct AccessGuard {
    store: Arc<dyn CredentialStore>,
    exchanger: Arc<TokenExchanger>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AccessGuard {
    pub fn new(store: Arc<dyn CredentialStore>, exchanger: Arc<TokenExchanger>) -> Self {
        Self {
            store,
            exchanger,
            locks: DashMap::new(),
        }
    }

    /// Look up the principal's record. Performs no network I/O.
    pub async fn resolve(&self, user_id: &str) -> Result<CredentialRecord> {
        match self.store.get(user_id).await? {
            Some(record) => Ok(record),
            None => {
                debug!(user_id, "no credential on file");
                Err(Error::MissingCredential {
                    user_id: user_id.to_string(),
                })
            },
        }
    }

    /// Return `record` if still valid, otherwise refresh it, persist it and
    /// return the refreshed copy. A failed exchange leaves the stored record
    /// untouched.
    pub async fn ensure_valid(&self, record: CredentialRecord) -> Result<CredentialRecord> {
        if !record.is_expired() {
            return Ok(record);
        }

        let _held = self.lock(record.user_id()).await;

        // Someone else may have refreshed while we waited.
        let mut current = self.resolve(record.user_id()).await?;
        if !current.is_expired() {
            debug!(user_id = %current.user_id(), "credential refreshed concurrently");
            return Ok(current);
        }

        info!(user_id = %current.user_id(), "access token expired, refreshing");
        let tokens = match self
            .exchanger
            .refresh(current.refresh_token().expose_secret())
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(user_id = %current.user_id(), error = %e, "token refresh failed");
                return Err(e.into());
            },
        };

        current.apply_tokens(tokens);
        self.store.save(&current).await?;
        Ok(current)
    }

    /// `resolve` followed by `ensure_valid`: the entry point for every
    /// provider-facing operation.
    pub async fn authorize(&self, user_id: &str) -> Result<CredentialRecord> {
        let record = self.resolve(user_id).await?;
        self.ensure_valid(record).await
    }

    /// Exclusive access to one principal's record for read-modify-write.
    pub(crate) async fn lock(&self, user_id: &str) -> PrincipalLock<'_> {
        let lock = Arc::clone(self.locks.entry(user_id.to_string()).or_default().value());
        PrincipalLock {
            held: Some(lock.lock_owned().await),
            locks: &self.locks,
            user_id: user_id.to_string(),
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }
}

/// Held per-principal lock. On release the map entry is dropped again unless
/// another task is holding or waiting on it.
pub(crate) struct PrincipalLock<'a> {
    held: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    user_id: String,
}

impl Drop for PrincipalLock<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        self.locks.remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
