mod config_dir;
pub mod defaults;
pub mod flow;
pub mod types;

pub use {
    config_dir::genolink_config_dir,
    defaults::{DEFAULT_PROVIDER, load_oauth_config},
    flow::{ExchangeError, TokenExchanger},
    types::{
        EXPIRY_MARGIN_SECS, OAuthConfig, OAuthTokens, TokenResponse, expiry_from, now_secs,
        serialize_secret,
    },
};
