use thiserror::Error;

/// A failure reported by a backend. The user-facing APIs translate these into [`crate::CartError`]s.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("The session token is missing or has expired")]
    Unauthorized,
    #[error("The server rejected the request (HTTP {status}). {}", .message.as_deref().unwrap_or("No reason given"))]
    Rejected { status: u16, message: Option<String> },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response from the server: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn rejected<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Rejected { status, message: Some(message.into()) }
    }
}
