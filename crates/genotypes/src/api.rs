//! Authenticated GETs against the provider's data API.

use std::time::Duration;

use {
    genolink_config::ProviderSettings,
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
    url::Url,
};

use crate::{
    endpoints::ProviderEndpoints,
    error::{ApiFailure, Result},
};

/// Header the provider reads the bearer token from.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Data-API client: endpoints plus a timeout-bounded HTTP client.
#[derive(Debug, Clone)]
pub struct ProviderApi {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
    max_in_flight: usize,
}

impl ProviderApi {
    pub fn new(client: reqwest::Client, endpoints: ProviderEndpoints) -> Self {
        Self {
            client,
            endpoints,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Build the HTTP client from settings; every request gets the configured
    /// overall and connect timeouts.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let client = http_client(settings)?;
        let endpoints = ProviderEndpoints::from_settings(settings)?;
        Ok(Self::new(client, endpoints).with_max_in_flight(settings.max_in_flight))
    }

    /// Cap on concurrent requests in a fan-out. Zero is treated as one.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// GET `url` and decode a JSON body. Non-200 statuses, transport errors
    /// and undecodable bodies all come back as an [`ApiFailure`].
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        access_token: &Secret<String>,
    ) -> std::result::Result<T, ApiFailure> {
        let target = url.to_string();
        let failure = |status: Option<u16>, body: String| ApiFailure {
            url: target.clone(),
            status,
            body,
        };

        debug!(url = %target, "provider request");
        let resp = self
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, access_token.expose_secret().as_str())
            .send()
            .await
            .map_err(|e| failure(None, e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| failure(Some(status.as_u16()), e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            warn!(url = %target, status = status.as_u16(), "provider call rejected");
            return Err(failure(Some(status.as_u16()), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| failure(Some(status.as_u16()), format!("malformed response: {e}")))
    }
}

pub fn http_client(settings: &ProviderSettings) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .build()?)
}

#[cfg(test)]
mod tests {
    use {mockito::Matcher, serde_json::Value};

    use super::*;

    fn api(server: &mockito::Server) -> ProviderApi {
        let endpoints = ProviderEndpoints::new(&server.url(), &format!("{}/demo", server.url()))
            .unwrap();
        ProviderApi::new(reqwest::Client::new(), endpoints)
    }

    #[tokio::test]
    async fn sends_access_token_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/thing")
            .match_header(ACCESS_TOKEN_HEADER, "A1")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let api = api(&server);
        let url = Url::parse(&format!("{}/thing", server.url())).unwrap();
        let v: Value = api
            .get_json(url, &Secret::new("A1".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(v["ok"], true);
    }

    #[tokio::test]
    async fn non_200_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(401)
            .with_body("bad token")
            .create_async()
            .await;

        let api = api(&server);
        let url = Url::parse(&format!("{}/thing", server.url())).unwrap();
        let failure = api
            .get_json::<Value>(url, &Secret::new("stale".to_string()))
            .await
            .unwrap_err();
        assert_eq!(failure.status, Some(401));
        assert_eq!(failure.body, "bad token");
    }

    #[tokio::test]
    async fn transport_error_has_no_status() {
        let api = ProviderApi::new(
            reqwest::Client::new(),
            ProviderEndpoints::new("http://127.0.0.1:1/", "http://127.0.0.1:1/demo/").unwrap(),
        );
        let url = Url::parse("http://127.0.0.1:1/names/").unwrap();
        let failure = api
            .get_json::<Value>(url, &Secret::new("A1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(failure.status, None);
        assert!(!failure.body.is_empty());
    }

    #[test]
    fn max_in_flight_floor_is_one() {
        let api = ProviderApi::new(
            reqwest::Client::new(),
            ProviderEndpoints::new("https://x/", "https://x/demo/").unwrap(),
        )
        .with_max_in_flight(0);
        assert_eq!(api.max_in_flight(), 1);
    }
}
