use pfptmeta_core::provider::ProviderError;
use thiserror::Error;

/// Failure of a single exchange with the Meta API.
///
/// The only distinction callers act on is "the object does not exist"
/// ([`ApiError::is_not_found`]); everything else is reported as is.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, TLS error, ...
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The token endpoint rejected the API key and secret.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Non-2xx response, with the API's own message when it sent one.
    #[error("API error (HTTP {status}): {message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },

    /// 2xx response whose body did not have the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        let base = if err.is_not_found() {
            ProviderError::not_found(err.to_string())
        } else {
            ProviderError::new(err.to_string())
        };
        base.with_cause(err)
    }
}
