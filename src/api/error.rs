use crate::session::TokenError;

/// Failure talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not logged in or session expired")]
    Unauthorized,
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ApiError {
    /// HTTP status when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::Token(_) => None,
        }
    }
}
