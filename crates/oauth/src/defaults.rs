use std::{collections::HashMap, path::Path};

use {secrecy::Secret, tracing::warn};

use crate::{config_dir::genolink_config_dir, types::OAuthConfig};

/// The genetic-data provider this workspace talks to.
pub const DEFAULT_PROVIDER: &str = "23andme";

/// Default client registrations for known providers. Client credentials are
/// blank and come from the config file or the environment.
fn builtin_defaults() -> HashMap<String, OAuthConfig> {
    let mut m = HashMap::new();
    m.insert(DEFAULT_PROVIDER.into(), OAuthConfig {
        client_id: String::new(),
        client_secret: Secret::new(String::new()),
        token_url: "https://api.23andme.com/token/".into(),
        redirect_uri: "http://localhost:8000/oauth/23andme/callback".into(),
        scopes: vec!["basic".into(), "names".into(), "genomes".into()],
    });
    m
}

/// Path to the OAuth client config file.
fn config_path() -> std::path::PathBuf {
    genolink_config_dir().join("oauth.json")
}

/// Load the OAuth client config for a provider.
///
/// Priority (highest last):
/// 1. Built-in defaults
/// 2. Config file (`~/.config/genolink/oauth.json`, keyed by provider)
/// 3. Environment variables (`GENOLINK_OAUTH_{PROVIDER}_CLIENT_ID`, etc.)
pub fn load_oauth_config(provider: &str) -> Option<OAuthConfig> {
    let config = load_layers(provider, &config_path())?;
    Some(apply_env_overrides(config, provider, |key| std::env::var(key).ok()))
}

fn load_layers(provider: &str, file: &Path) -> Option<OAuthConfig> {
    let builtin = builtin_defaults().remove(provider);

    let from_file = std::fs::read_to_string(file).ok().and_then(|data| {
        match serde_json::from_str::<HashMap<String, OAuthConfig>>(&data) {
            Ok(mut configs) => configs.remove(provider),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "ignoring unreadable oauth config");
                None
            },
        }
    });

    from_file.or(builtin)
}

/// Override individual fields from `{prefix}CLIENT_ID`, `CLIENT_SECRET`,
/// `TOKEN_URL`, `REDIRECT_URI` and `SCOPE` (space-delimited).
fn apply_env_overrides(
    mut config: OAuthConfig,
    provider: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> OAuthConfig {
    let prefix = format!(
        "GENOLINK_OAUTH_{}_",
        provider.to_uppercase().replace('-', "_")
    );
    let var = |name: &str| lookup(&format!("{prefix}{name}"));

    if let Some(v) = var("CLIENT_ID") {
        config.client_id = v;
    }
    if let Some(v) = var("CLIENT_SECRET") {
        config.client_secret = Secret::new(v);
    }
    if let Some(v) = var("TOKEN_URL") {
        config.token_url = v;
    }
    if let Some(v) = var("REDIRECT_URI") {
        config.redirect_uri = v;
    }
    if let Some(v) = var("SCOPE") {
        config.scopes = v.split_whitespace().map(str::to_string).collect();
    }
    config
}
