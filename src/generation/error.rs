use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the generation backend. Detail stays server-side.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("generation backend API key is not configured")]
    MissingApiKey,

    #[error("generation request timed out after {0} ms")]
    Timeout(u128),

    #[error("failed to reach generation backend: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("generation backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Transport(err) => err.is_connect() || err.is_timeout(),
            ProviderError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ProviderError::MissingApiKey => false,
        }
    }
}
