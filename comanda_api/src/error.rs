use comanda_engine::traits::BackendError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RestaurantApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request failed: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Unauthorized. The session token is missing or has expired")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Query failed. Error {status}. {}", .message.as_deref().unwrap_or("No message"))]
    QueryError { status: u16, message: Option<String> },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<RestaurantApiError> for BackendError {
    fn from(e: RestaurantApiError) -> Self {
        match e {
            RestaurantApiError::Unauthorized => BackendError::Unauthorized,
            RestaurantApiError::NotFound(what) => BackendError::NotFound(what),
            RestaurantApiError::QueryError { status, message } => BackendError::Rejected { status, message },
            RestaurantApiError::RequestError(e) | RestaurantApiError::Initialization(e) => BackendError::Network(e),
            RestaurantApiError::JsonError(e) | RestaurantApiError::InvalidResponse(e) => {
                BackendError::InvalidResponse(e)
            },
        }
    }
}
