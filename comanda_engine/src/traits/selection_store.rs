use thiserror::Error;

use crate::cart_api::payment_objects::PaymentMethod;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Could not read local storage: {0}")]
    Read(String),
    #[error("Could not write local storage: {0}")]
    Write(String),
}

/// The single local slot that remembers the customer's chosen payment method between sessions.
///
/// There is only ever one selection. Saving overwrites whatever was there; nothing is merged.
pub trait SelectionStore {
    fn load_selection(&self) -> Result<Option<PaymentMethod>, StorageError>;
    fn save_selection(&self, selection: &PaymentMethod) -> Result<(), StorageError>;
    fn clear_selection(&self) -> Result<(), StorageError>;
}
