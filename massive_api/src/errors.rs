//! Error types for the API client.

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The configured base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
    /// The request never produced a response (connect failure, timeout, TLS).
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// The API answered with a status worth retrying (rate limit or edge outage).
    #[error("HTTP {status}: {body}")]
    Transient { status: u16, body: String },
    /// The API answered with a non-success status that will not improve on retry.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// The body of a successful response was not the expected JSON shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl Error {
    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } | Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry loop should try the request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
