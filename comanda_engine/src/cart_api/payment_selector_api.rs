use std::fmt::Debug;

use log::*;
use tokio::sync::RwLock;

use crate::{
    cart_api::{
        errors::CartError,
        payment_objects::{PaymentMethod, PaymentMethodId},
    },
    helpers::SingleFlight,
    traits::{CartManagement, PaymentMethodManagement, SelectionStore, UserPrompt},
};

#[derive(Debug, Clone, Default)]
struct SelectorState {
    methods: Vec<PaymentMethod>,
    selected: Option<PaymentMethod>,
    confirmed: bool,
}

/// `PaymentSelectorApi` lets the customer choose how to pay: cash, or one of the cards the server has on file.
///
/// Choosing is local. Only [`Self::confirm`] tells the server and saves the choice in the [`SelectionStore`].
pub struct PaymentSelectorApi<B, S> {
    backend: B,
    store: S,
    state: RwLock<SelectorState>,
    in_flight: SingleFlight,
}

impl<B, S> Debug for PaymentSelectorApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentSelectorApi")
    }
}

impl<B, S> PaymentSelectorApi<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self { backend, store, state: RwLock::new(SelectorState::default()), in_flight: SingleFlight::new() }
    }

    /// The methods on offer. Cash always comes first.
    pub async fn methods(&self) -> Vec<PaymentMethod> {
        self.state.read().await.methods.clone()
    }

    pub async fn selected(&self) -> Option<PaymentMethod> {
        self.state.read().await.selected.clone()
    }

    /// True once the current selection has been sent to the server and saved.
    pub async fn is_confirmed(&self) -> bool {
        self.state.read().await.confirmed
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Change the selection locally. Nothing is sent or saved until [`Self::confirm`].
    pub async fn select(&self, id: PaymentMethodId) -> Result<PaymentMethod, CartError> {
        let mut state = self.state.write().await;
        let method = state
            .methods
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| CartError::Validation(format!("Payment method {id} is not available")))?;
        if state.selected.as_ref() != Some(&method) {
            state.confirmed = false;
        }
        state.selected = Some(method.clone());
        trace!("💳️ Selected {method}");
        Ok(method)
    }
}

impl<B, S> PaymentSelectorApi<B, S>
where
    B: PaymentMethodManagement + CartManagement,
    S: SelectionStore,
{
    /// Fetch the stored cards and pick a default.
    ///
    /// The default is the saved selection if it is still on offer, then the card the server marks as principal,
    /// then cash.
    pub async fn load(&self) -> Result<Vec<PaymentMethod>, CartError> {
        let cards = self.backend.fetch_cards().await.map_err(|e| {
            warn!("💳️ Could not fetch stored cards. {e}");
            CartError::from_backend(e, "Could not load your payment methods")
        })?;
        let mut methods = Vec::with_capacity(cards.len() + 1);
        methods.push(PaymentMethod::cash());
        methods.extend(cards.iter().map(PaymentMethod::from));

        let saved = match self.store.load_selection() {
            Ok(saved) => saved,
            Err(e) => {
                warn!("💳️ Could not read the saved payment method. {e}");
                None
            },
        };
        let saved = saved.and_then(|s| methods.iter().find(|m| m.id == s.id).cloned());
        let principal = cards.iter().find(|c| c.principal).map(PaymentMethod::from);
        let selected = saved.clone().or(principal).unwrap_or_else(PaymentMethod::cash);
        debug!("💳️ {} payment methods on offer. Defaulting to {selected}", methods.len());

        let mut state = self.state.write().await;
        state.confirmed = saved.as_ref() == Some(&selected);
        state.methods = methods.clone();
        state.selected = Some(selected);
        Ok(methods)
    }

    /// Send the selection to the server and save it locally.
    ///
    /// The server is told first. If it refuses, nothing is saved and the selection stays unconfirmed.
    pub async fn confirm(&self) -> Result<PaymentMethod, CartError> {
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        let selected = self
            .state
            .read()
            .await
            .selected
            .clone()
            .ok_or_else(|| CartError::Validation("Choose a payment method first".into()))?;
        debug!("💳️ Confirming {selected}");
        self.backend.set_payment_method(&selected.id).await.map_err(|e| {
            warn!("💳️ The server did not accept {selected}. {e}");
            CartError::from_backend(e, "Could not set the payment method")
        })?;
        self.store.save_selection(&selected)?;
        let mut state = self.state.write().await;
        if state.selected.as_ref() == Some(&selected) {
            state.confirmed = true;
        }
        info!("💳️ Payment method set to {selected}");
        Ok(selected)
    }

    /// Delete a stored card after the customer confirms. Returns `false` if the customer declined.
    ///
    /// Cash cannot be deleted. If the deleted card was selected, the selection falls back to cash.
    pub async fn delete<P: UserPrompt>(&self, id: PaymentMethodId, prompt: &P) -> Result<bool, CartError> {
        let card_id = match id {
            PaymentMethodId::Cash => return Err(CartError::Validation("Cash cannot be removed".into())),
            PaymentMethodId::Card(card_id) => card_id,
        };
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        let method = self
            .state
            .read()
            .await
            .methods
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| CartError::Validation(format!("Payment method {id} is not available")))?;
        if !prompt.confirm(&format!("Remove {method}?")) {
            return Ok(false);
        }
        self.backend.delete_card(card_id).await.map_err(|e| {
            warn!("💳️ Could not delete card {card_id}. {e}");
            CartError::from_backend(e, "Could not remove the card")
        })?;
        info!("💳️ Card {card_id} removed");

        match self.store.load_selection() {
            Ok(Some(saved)) if saved.id == id => {
                if let Err(e) = self.store.clear_selection() {
                    warn!("💳️ Could not clear the saved payment method. {e}");
                }
            },
            Ok(_) => {},
            Err(e) => warn!("💳️ Could not read the saved payment method. {e}"),
        }
        let mut state = self.state.write().await;
        state.methods.retain(|m| m.id != id);
        if state.selected.as_ref().map(|m| m.id) == Some(id) {
            debug!("💳️ The removed card was selected. Falling back to cash.");
            state.selected = Some(PaymentMethod::cash());
            state.confirmed = false;
        }
        Ok(true)
    }
}
