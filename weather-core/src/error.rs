use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single outbound API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a 4xx/5xx status.
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The server could not be reached (refused, DNS, TLS handshake).
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// Any other transport-level failure.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The body arrived but was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The URL built from the configured template does not parse.
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// Sort a `reqwest` failure into timeout / connect / generic transport.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Transport(err)
        }
    }

    /// HTTP status of a status failure, `None` for every other kind.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the retry policy should try the call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Timeout(_) | Self::Connect(_) | Self::Transport(_)
        )
    }

    /// Connection and timeout failures, reported to users as network trouble.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}
