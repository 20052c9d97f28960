//! Authorization-code and refresh-token exchanges against the provider's
//! token endpoint.

use std::time::Duration;

use {
    secrecy::ExposeSecret,
    tracing::{debug, warn},
};

use crate::types::{OAuthConfig, OAuthTokens, TokenResponse, now_secs};

/// Used when the caller does not hand in a preconfigured client.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed token response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone, Copy)]
enum Grant<'a> {
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

impl Grant<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::AuthorizationCode(_) => "authorization_code",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

/// Performs the two token exchanges for a single client registration.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl TokenExchanger {
    pub fn new(config: OAuthConfig) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Reuse an existing client (and its timeouts) for token requests.
    pub fn with_client(config: OAuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Trade a one-time authorization code for the initial token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ExchangeError> {
        self.post(Grant::AuthorizationCode(code)).await
    }

    /// Spend `refresh_token` for a new token pair. The provider treats refresh
    /// tokens as single-use, so callers must not invoke this concurrently with
    /// the same value.
    pub async fn refresh(&self, refresh_token: &str) -> Result<OAuthTokens, ExchangeError> {
        self.post(Grant::RefreshToken(refresh_token)).await
    }

    async fn post(&self, grant: Grant<'_>) -> Result<OAuthTokens, ExchangeError> {
        let scope = self.config.scope();
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ("grant_type", grant.name()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
        ];
        match grant {
            Grant::AuthorizationCode(code) => form.push(("code", code)),
            Grant::RefreshToken(token) => form.push(("refresh_token", token)),
        }

        debug!(grant_type = grant.name(), url = %self.config.token_url, "requesting tokens");
        let resp = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != reqwest::StatusCode::OK {
            warn!(grant_type = grant.name(), status = status.as_u16(), "token exchange rejected");
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        Ok(OAuthTokens::from_response(parsed, now_secs()))
    }
}

#[cfg(test)]
mod tests {
    use {mockito::Matcher, secrecy::Secret};

    use super::*;

    fn config(token_url: String) -> OAuthConfig {
        OAuthConfig {
            client_id: "client-1".into(),
            client_secret: Secret::new("shh".into()),
            token_url,
            redirect_uri: "http://localhost:8000/callback".into(),
            scopes: vec!["basic".into(), "genomes".into()],
        }
    }

    #[tokio::test]
    async fn exchange_code_posts_form_and_applies_margin() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_id".into(), "client-1".into()),
                Matcher::UrlEncoded("client_secret".into(), "shh".into()),
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "http://localhost:8000/callback".into(),
                ),
                Matcher::UrlEncoded("scope".into(), "basic genomes".into()),
                Matcher::UrlEncoded("code".into(), "abc".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"A1","refresh_token":"R1","expires_in":3600}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(config(format!("{}/token/", server.url()))).unwrap();
        let before = now_secs();
        let tokens = exchanger.exchange_code("abc").await.unwrap();
        let after = now_secs();

        mock.assert_async().await;
        assert_eq!(tokens.access_token.expose_secret(), "A1");
        assert_eq!(tokens.refresh_token.expose_secret(), "R1");
        assert!(tokens.expires_at >= before + 3500 && tokens.expires_at <= after + 3500);
    }

    #[tokio::test]
    async fn refresh_sends_refresh_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "R1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"A2","refresh_token":"R2","expires_in":86400}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(config(format!("{}/token/", server.url()))).unwrap();
        let tokens = exchanger.refresh("R1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token.expose_secret(), "A2");
        assert_eq!(tokens.refresh_token.expose_secret(), "R2");
    }

    #[tokio::test]
    async fn non_200_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token/")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(config(format!("{}/token/", server.url()))).unwrap();
        let err = exchanger.refresh("stale").await.unwrap_err();
        match err {
            ExchangeError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn ok_status_with_incomplete_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token/")
            .with_status(200)
            .with_body(r#"{"access_token":"A1"}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(config(format!("{}/token/", server.url()))).unwrap();
        let err = exchanger.exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Malformed(_)));
    }
}
