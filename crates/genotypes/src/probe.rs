use {genolink_credentials::ApiBase, secrecy::Secret, tracing::info};

use crate::{api::ProviderApi, error::Result, profiles::Profile};

/// Decide which endpoint a freshly authorized account should use.
///
/// Lists profiles on the production endpoint; an account without any is
/// switched to the demo endpoint, whose profiles are returned instead. Only
/// ever run during provisioning.
pub async fn detect_api_base(
    api: &ProviderApi,
    access_token: &Secret<String>,
) -> Result<(ApiBase, Vec<Profile>)> {
    let profiles = api.list_profiles(access_token, ApiBase::Production).await?;
    if !profiles.is_empty() {
        return Ok((ApiBase::Production, profiles));
    }

    info!("no production profiles, falling back to demo data");
    let demo_profiles = api.list_profiles(access_token, ApiBase::Demo).await?;
    Ok((ApiBase::Demo, demo_profiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::ProviderEndpoints;

    fn api(server: &mockito::Server) -> ProviderApi {
        let endpoints =
            ProviderEndpoints::new(&server.url(), &format!("{}/demo/", server.url())).unwrap();
        ProviderApi::new(reqwest::Client::new(), endpoints)
    }

    #[tokio::test]
    async fn production_when_profiles_exist() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/names/")
            .with_status(200)
            .with_body(r#"{"profiles":[{"id":"p1"}]}"#)
            .create_async()
            .await;
        let demo = server
            .mock("GET", "/demo/names/")
            .expect(0)
            .create_async()
            .await;

        let (base, profiles) = detect_api_base(&api(&server), &Secret::new("A1".into()))
            .await
            .unwrap();

        demo.assert_async().await;
        assert_eq!(base, ApiBase::Production);
        assert_eq!(profiles.len(), 1);
    }

    #[tokio::test]
    async fn demo_when_production_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/names/")
            .with_status(200)
            .with_body(r#"{"profiles":[]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/demo/names/")
            .with_status(200)
            .with_body(r#"{"profiles":[{"id":"demo_p1"},{"id":"demo_p2"}]}"#)
            .create_async()
            .await;

        let (base, profiles) = detect_api_base(&api(&server), &Secret::new("A1".into()))
            .await
            .unwrap();

        assert_eq!(base, ApiBase::Demo);
        assert_eq!(profiles[1].id, "demo_p2");
    }

    #[tokio::test]
    async fn listing_failure_aborts_probe() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/names/")
            .with_status(500)
            .create_async()
            .await;

        assert!(
            detect_api_base(&api(&server), &Secret::new("A1".into()))
                .await
                .is_err()
        );
    }
}
