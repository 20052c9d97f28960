use std::fmt;

use genolink_oauth::ExchangeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One failed provider call. Transport failures carry no status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub url: String,
    pub status: Option<u16>,
    pub body: String,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} returned HTTP {status}: {}", self.url, self.body),
            None => write!(f, "{} failed: {}", self.url, self.body),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no provider credential stored for {user_id}")]
    MissingCredential { user_id: String },

    #[error("token exchange failed: {0}")]
    TokenExchange(#[from] ExchangeError),

    /// Every failing response of the call; a fan-out query reports all of
    /// them, never a partial result.
    #[error("provider API call failed: {}", join_failures(.failures))]
    ApiCall { failures: Vec<ApiFailure> },

    #[error("at least one variant id is required")]
    EmptyQuery,

    #[error("credential store: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

fn join_failures(failures: &[ApiFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub(crate) fn api_call(failure: ApiFailure) -> Self {
        Self::ApiCall {
            failures: vec![failure],
        }
    }

    /// Suggested HTTP status for the outer request router.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingCredential { .. } => 401,
            Self::EmptyQuery => 400,
            Self::TokenExchange(_) | Self::ApiCall { .. } => 502,
            Self::Store(_) | Self::Url(_) | Self::Client(_) => 500,
        }
    }
}
