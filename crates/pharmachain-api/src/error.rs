use thiserror::Error;

/// Failures talking to the prescription backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset mid-body, ...
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Any other non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Body arrived but did not match the expected record shape.
    #[error("cannot decode response: {0}")]
    Decode(String),

    /// Configured base URL is not an absolute http(s) URL.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// A verification for this client is already running.
    #[error("verification already in flight")]
    InFlight,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Status { .. } => "BAD_STATUS",
            Self::Decode(_) => "DECODE_ERROR",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InFlight => "IN_FLIGHT",
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
