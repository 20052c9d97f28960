use std::{fmt, str::FromStr};

use {
    genolink_oauth::{OAuthTokens, now_secs, serialize_secret},
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Which of the provider's data endpoints a credential talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiBase {
    Production,
    /// The provider's sample data, used when the grantor has no profiles.
    Demo,
}

impl ApiBase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Demo => "demo",
        }
    }
}

impl fmt::Display for ApiBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiBase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Self::Production),
            "demo" => Ok(Self::Demo),
            other => anyhow::bail!("unknown api base: {other}"),
        }
    }
}

/// One principal's provider credential.
///
/// Fields are private so that the token pair can only change together
/// (`apply_tokens`) and `api_base` can only be chosen at provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    user_id: String,
    #[serde(serialize_with = "serialize_secret")]
    access_token: Secret<String>,
    #[serde(serialize_with = "serialize_secret")]
    refresh_token: Secret<String>,
    /// Unix seconds; the safety margin is already applied.
    expires_at: u64,
    api_base: ApiBase,
    #[serde(default)]
    profiles: Vec<String>,
}

impl CredentialRecord {
    /// Build the record at the end of provisioning, once the endpoint variant
    /// and the profile snapshot are known.
    pub fn provisioned(
        user_id: impl Into<String>,
        tokens: OAuthTokens,
        api_base: ApiBase,
        profiles: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            api_base,
            profiles,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn access_token(&self) -> &Secret<String> {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &Secret<String> {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn api_base(&self) -> ApiBase {
        self.api_base
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Whether the access token must be treated as invalid right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// Expired strictly after `expires_at`; the boundary second is still valid.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Replace the access token, refresh token and expiry as one unit.
    pub fn apply_tokens(&mut self, tokens: OAuthTokens) {
        self.access_token = tokens.access_token;
        self.refresh_token = tokens.refresh_token;
        self.expires_at = tokens.expires_at;
    }

    /// Replace the cached profile snapshot. Never called implicitly.
    pub fn replace_profiles(&mut self, profiles: Vec<String>) {
        self.profiles = profiles;
    }
}
