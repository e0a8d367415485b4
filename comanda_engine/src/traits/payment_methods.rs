use crate::{
    cart_api::payment_objects::StoredCard,
    cart_types::CardId,
    traits::BackendError,
};

#[allow(async_fn_in_trait)]
pub trait PaymentMethodManagement {
    /// The customer's stored cards. Cash is not included; it is always available.
    async fn fetch_cards(&self) -> Result<Vec<StoredCard>, BackendError>;
    async fn delete_card(&self, card_id: CardId) -> Result<(), BackendError>;
}
