use std::sync::Arc;

use {
    genolink_config::ProviderSettings,
    genolink_credentials::{ApiBase, CredentialRecord, CredentialStore},
    genolink_oauth::{OAuthConfig, TokenExchanger, now_secs},
    serde::Serialize,
    tracing::{info, warn},
};

use crate::{
    api::{ProviderApi, http_client},
    endpoints::ProviderEndpoints,
    error::{Error, Result},
    fanout::GenotypeMap,
    guard::AccessGuard,
    probe::detect_api_base,
    profiles::{Profile, profile_ids},
};

/// What is known about a principal's credential without asking the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub user_id: String,
    pub api_base: ApiBase,
    pub expires_at: u64,
    pub expired: bool,
    pub profile_count: usize,
}

/// Provisioning, profile listing and genotype queries for principals.
pub struct GenotypeService {
    guard: AccessGuard,
    api: ProviderApi,
    exchanger: Arc<TokenExchanger>,
}

impl GenotypeService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        exchanger: TokenExchanger,
        api: ProviderApi,
    ) -> Self {
        let exchanger = Arc::new(exchanger);
        Self {
            guard: AccessGuard::new(store, Arc::clone(&exchanger)),
            api,
            exchanger,
        }
    }

    /// Wire everything from settings, sharing one timeout-bounded HTTP client
    /// between the token endpoint and the data API.
    pub fn from_settings(
        store: Arc<dyn CredentialStore>,
        oauth: OAuthConfig,
        settings: &ProviderSettings,
    ) -> Result<Self> {
        let client = http_client(settings)?;
        let endpoints = ProviderEndpoints::from_settings(settings)?;
        let api = ProviderApi::new(client.clone(), endpoints)
            .with_max_in_flight(settings.max_in_flight);
        let exchanger = TokenExchanger::with_client(oauth, client);
        Ok(Self::new(store, exchanger, api))
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// Complete the authorization-code grant for `user_id`: exchange the code,
    /// pick the endpoint variant from the account's profiles and persist the
    /// new record. Re-provisioning replaces any existing record.
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn provision(&self, user_id: &str, code: &str) -> Result<CredentialRecord> {
        let tokens = self.exchanger.exchange_code(code).await?;
        let (api_base, profiles) = detect_api_base(&self.api, &tokens.access_token).await?;

        let record =
            CredentialRecord::provisioned(user_id, tokens, api_base, profile_ids(&profiles));
        {
            let _held = self.guard.lock(user_id).await;
            self.guard.store().save(&record).await?;
        }

        info!(
            user_id,
            %api_base,
            profiles = record.profiles().len(),
            "provisioned provider credential"
        );
        Ok(record)
    }

    /// Live profile listing for the principal's endpoint variant.
    pub async fn list_profiles(&self, user_id: &str) -> Result<Vec<Profile>> {
        let record = self.guard.authorize(user_id).await?;
        self.api
            .list_profiles(record.access_token(), record.api_base())
            .await
    }

    /// Genotypes for `variant_ids` across `profiles`, or across the cached
    /// profile snapshot when none are given.
    pub async fn query_genotypes(
        &self,
        user_id: &str,
        variant_ids: &[String],
        profiles: Option<&[String]>,
    ) -> Result<GenotypeMap> {
        let record = self.guard.resolve(user_id).await?;
        if variant_ids.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let record = self.guard.ensure_valid(record).await?;

        let profile_ids = profiles.unwrap_or_else(|| record.profiles());
        self.api
            .query_genotypes(
                record.access_token(),
                record.api_base(),
                variant_ids,
                profile_ids,
            )
            .await
    }

    /// Re-list profiles and overwrite the cached snapshot. The endpoint
    /// variant chosen at provisioning is kept even if the listing differs.
    pub async fn resync_profiles(&self, user_id: &str) -> Result<Vec<String>> {
        let record = self.guard.authorize(user_id).await?;
        let profiles = self
            .api
            .list_profiles(record.access_token(), record.api_base())
            .await?;
        let ids = profile_ids(&profiles);

        let _held = self.guard.lock(user_id).await;
        let mut current = self.guard.resolve(user_id).await?;
        if profiles.is_empty() && !current.profiles().is_empty() {
            warn!(user_id, "provider now lists no profiles");
        }
        current.replace_profiles(ids.clone());
        self.guard.store().save(&current).await?;

        info!(user_id, profiles = ids.len(), "resynced profile snapshot");
        Ok(ids)
    }

    /// Stored state of the principal's credential. Performs no network I/O
    /// and never refreshes.
    pub async fn credential_status(&self, user_id: &str) -> Result<CredentialStatus> {
        let record = self.guard.resolve(user_id).await?;
        Ok(CredentialStatus {
            user_id: record.user_id().to_string(),
            api_base: record.api_base(),
            expires_at: record.expires_at(),
            expired: record.is_expired_at(now_secs()),
            profile_count: record.profiles().len(),
        })
    }
}
