use thiserror::Error;

/// Failures to complete a round trip with the auth server. A structured
/// `{success: false}` reply is not an `ApiError`; it comes back as an
/// `ApiResponse` so callers can tell "rejected" from "unreachable".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error sending request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected response format (status {status})")]
    UnexpectedFormat { status: u16 },
    #[error("Error parsing JSON: {0}")]
    Decode(String),
}

impl ApiError {
    /// Short stable name for the failure class, used as a log key.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Request(_) => "request",
            ApiError::UnexpectedFormat { .. } => "format",
            ApiError::Decode(_) => "decode",
        }
    }
}
