use thiserror::Error;

use crate::{
    cart_api::checkout_objects::Navigation,
    cart_types::BlankCouponCode,
    traits::{BackendError, StorageError},
};

/// The errors the cart, checkout and payment APIs report to the front end.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    /// Caught locally. No request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("Another cart operation is still in progress")]
    Busy,
    /// A newer load or an invalidation overtook this request. Its response was discarded.
    #[error("The cart changed while this request was in flight")]
    Superseded,
    /// The server refused the operation. The message is shown to the customer as is.
    #[error("{0}")]
    Rejected(String),
    #[error("Authentication required. Please log in again")]
    AuthRequired,
    #[error("An error occurred. {0}")]
    Failed(String),
}

impl CartError {
    /// Translate a backend failure. A server rejection keeps the server's message if it sent one, and uses
    /// `fallback` otherwise.
    pub fn from_backend(err: BackendError, fallback: &str) -> Self {
        match err {
            BackendError::Unauthorized => Self::AuthRequired,
            BackendError::Rejected { message: Some(message), .. } if !message.trim().is_empty() => {
                Self::Rejected(message)
            },
            BackendError::Rejected { .. } => Self::Rejected(fallback.to_string()),
            BackendError::NotFound(what) => Self::Failed(format!("{what} was not found")),
            BackendError::Network(e) => Self::Failed(format!("Could not reach the server. {e}")),
            BackendError::InvalidResponse(e) => Self::Failed(format!("The server sent an unexpected response. {e}")),
        }
    }

    /// Where the front end should go after this error, if anywhere.
    pub fn navigation(&self) -> Option<Navigation> {
        match self {
            Self::AuthRequired => Some(Navigation::Login),
            _ => None,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}

impl From<BlankCouponCode> for CartError {
    fn from(e: BlankCouponCode) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<StorageError> for CartError {
    fn from(e: StorageError) -> Self {
        Self::Failed(e.to_string())
    }
}
