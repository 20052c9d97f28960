use std::time::{SystemTime, UNIX_EPOCH};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

/// Seconds shaved off the provider's stated lifetime to absorb clock skew and
/// requests still in flight when the token lapses.
pub const EXPIRY_MARGIN_SECS: u64 = 100;

/// Client registration used for both the authorization-code and the
/// refresh-token exchanges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(serialize_with = "serialize_secret")]
    pub client_secret: Secret<String>,
    pub token_url: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Scopes as the single space-delimited `scope` form field.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Successful body of the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// An access/refresh token pair together with the instant the access token
/// stops being usable. The pair is only ever produced as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,
    #[serde(serialize_with = "serialize_secret")]
    pub refresh_token: Secret<String>,
    /// Unix seconds, already reduced by [`EXPIRY_MARGIN_SECS`].
    pub expires_at: u64,
}

impl OAuthTokens {
    pub fn from_response(resp: TokenResponse, now: u64) -> Self {
        Self {
            access_token: Secret::new(resp.access_token),
            refresh_token: Secret::new(resp.refresh_token),
            expires_at: expiry_from(now, resp.expires_in),
        }
    }
}

/// `now + expires_in - EXPIRY_MARGIN_SECS`, clamped at zero.
pub fn expiry_from(now: u64, expires_in: u64) -> u64 {
    now.saturating_add(expires_in)
        .saturating_sub(EXPIRY_MARGIN_SECS)
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Serialize a `Secret<String>` by exposing it. Only used for persistence.
pub fn serialize_secret<S: Serializer>(secret: &Secret<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(secret.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_keeps_safety_margin() {
        assert_eq!(expiry_from(1_000, 3_600), 4_500);
        assert_eq!(expiry_from(0, 100), 0);
    }

    #[test]
    fn expiry_never_underflows() {
        assert_eq!(expiry_from(10, 20), 0);
        assert_eq!(expiry_from(u64::MAX, 10), u64::MAX - EXPIRY_MARGIN_SECS);
    }

    #[test]
    fn tokens_from_response() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"A1","refresh_token":"R1","expires_in":3600,"token_type":"bearer"}"#,
        )
        .unwrap();
        let tokens = OAuthTokens::from_response(resp, 50_000);
        assert_eq!(tokens.access_token.expose_secret(), "A1");
        assert_eq!(tokens.refresh_token.expose_secret(), "R1");
        assert_eq!(tokens.expires_at, 53_500);
    }

    #[test]
    fn token_response_requires_all_fields() {
        let missing_refresh = r#"{"access_token":"A1","expires_in":3600}"#;
        assert!(serde_json::from_str::<TokenResponse>(missing_refresh).is_err());
    }

    #[test]
    fn tokens_serialize_exposed_and_debug_redacted() {
        let tokens = OAuthTokens {
            access_token: Secret::new("A1".into()),
            refresh_token: Secret::new("R1".into()),
            expires_at: 7,
        };
        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json["access_token"], "A1");
        assert_eq!(json["refresh_token"], "R1");
        assert!(!format!("{tokens:?}").contains("R1"));
    }

    #[test]
    fn scope_is_space_joined() {
        let config = OAuthConfig {
            client_id: "id".into(),
            client_secret: Secret::new("secret".into()),
            token_url: "https://example.com/token/".into(),
            redirect_uri: "http://localhost/cb".into(),
            scopes: vec!["basic".into(), "genomes".into()],
        };
        assert_eq!(config.scope(), "basic genomes");
    }
}
