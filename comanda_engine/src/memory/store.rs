use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    cart_api::payment_objects::PaymentMethod,
    traits::{SelectionStore, StorageError},
};

/// A [`SelectionStore`] that lives as long as the process. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySelectionStore {
    slot: Arc<Mutex<Option<PaymentMethod>>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(selection: PaymentMethod) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(selection))) }
    }

    pub fn current(&self) -> Option<PaymentMethod> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load_selection(&self) -> Result<Option<PaymentMethod>, StorageError> {
        Ok(self.current())
    }

    fn save_selection(&self, selection: &PaymentMethod) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(selection.clone());
        Ok(())
    }

    fn clear_selection(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
