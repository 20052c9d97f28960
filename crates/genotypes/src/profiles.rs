use {
    genolink_credentials::ApiBase,
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{
    api::ProviderApi,
    error::{Error, Result},
};

/// A genotyped person on the grantor's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
struct ProfileListing {
    #[serde(default)]
    profiles: Vec<Profile>,
}

impl ProviderApi {
    /// List the profiles owned by whoever granted `access_token`, in the order
    /// the provider returns them.
    pub async fn list_profiles(
        &self,
        access_token: &Secret<String>,
        api_base: ApiBase,
    ) -> Result<Vec<Profile>> {
        let url = self.endpoints().profiles_url(api_base)?;
        let listing: ProfileListing = self
            .get_json(url, access_token)
            .await
            .map_err(Error::api_call)?;
        debug!(%api_base, count = listing.profiles.len(), "listed profiles");
        Ok(listing.profiles)
    }
}

pub fn profile_ids(profiles: &[Profile]) -> Vec<String> {
    profiles.iter().map(|p| p.id.clone()).collect()
}
