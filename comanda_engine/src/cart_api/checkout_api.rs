use std::fmt::Debug;

use log::*;
use tokio::sync::RwLock;

use crate::{
    cart_api::{
        cart_session_api::fetch_cart_session,
        checkout_objects::{CheckoutState, CheckoutStep, CheckoutSummary, Navigation},
        errors::CartError,
    },
    cart_types::CheckoutBlocker,
    helpers::SingleFlight,
    traits::{BackendError, CartManagement, OrderManagement, SelectionStore, UserPrompt},
};

const ORDER_FAILED: &str = "Could not create your order. Please try again.";

/// `CheckoutApi` drives the checkout screen: it checks that the cart can be ordered, asks the customer to confirm,
/// and creates the order.
///
/// An instance covers a single visit to the checkout screen. Once it has aborted or completed it stays that way;
/// create a new one for the next visit.
pub struct CheckoutApi<B, S> {
    backend: B,
    store: S,
    state: RwLock<CheckoutState>,
    in_flight: SingleFlight,
}

impl<B, S> Debug for CheckoutApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B, S> CheckoutApi<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self { backend, store, state: RwLock::new(CheckoutState::Entering), in_flight: SingleFlight::new() }
    }

    pub async fn state(&self) -> CheckoutState {
        self.state.read().await.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_busy()
    }
}

impl<B, S> CheckoutApi<B, S>
where
    B: CartManagement + OrderManagement,
    S: SelectionStore,
{
    /// Load the cart and the saved payment method, and decide whether checkout can go ahead.
    ///
    /// A cart without a branch sends the customer back to the cart screen, even when it is also empty. An empty
    /// cart with a branch sends them home. Both are final for this instance.
    pub async fn enter(&self) -> Result<CheckoutStep, CartError> {
        {
            let state = self.state.read().await;
            match &*state {
                CheckoutState::Entering => {},
                CheckoutState::Ready(summary) => return Ok(CheckoutStep::Ready(summary.clone())),
                CheckoutState::Aborted(nav) => return Ok(CheckoutStep::Redirect(nav.clone())),
                CheckoutState::Completed(id) => return Ok(CheckoutStep::Redirect(Navigation::OrderTracking(*id))),
                CheckoutState::Confirming => return Err(CartError::Busy),
            }
        }
        let cart = match fetch_cart_session(&self.backend).await {
            Ok(cart) => cart,
            Err(BackendError::Unauthorized) => return Err(CartError::AuthRequired),
            Err(e) => {
                warn!("🧾️ Could not load the cart for checkout. {e}");
                return Err(CartError::from_backend(e, "Could not load your cart"));
            },
        };
        let payment = match self.store.load_selection() {
            Ok(payment) => payment,
            Err(e) => {
                warn!("🧾️ Could not read the saved payment method. {e}");
                None
            },
        };
        let next = match cart.checkout_blocker() {
            Some(blocker @ CheckoutBlocker::NoBranch) => {
                info!("🧾️ Checkout aborted: no branch selected");
                CheckoutState::Aborted(Navigation::Cart { message: blocker.to_string() })
            },
            Some(blocker @ CheckoutBlocker::EmptyCart) => {
                info!("🧾️ Checkout aborted: the cart is empty");
                CheckoutState::Aborted(Navigation::Home { message: blocker.to_string() })
            },
            None => {
                debug!("🧾️ Checkout ready. Total {}", cart.totals.total);
                CheckoutState::Ready(CheckoutSummary { cart, payment })
            },
        };
        let mut state = self.state.write().await;
        // Another enter() may have finished first. The first one wins.
        if *state == CheckoutState::Entering {
            *state = next;
        }
        Ok(step_for(&state))
    }

    /// Ask the customer to confirm, then create the order.
    ///
    /// On success the saved payment method is cleared and the customer is sent to the tracking screen. On failure
    /// the checkout stays ready so that the customer can try again. Nothing is retried automatically.
    pub async fn confirm<P: UserPrompt>(&self, prompt: &P) -> Result<CheckoutStep, CartError> {
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        let summary = match &*self.state.read().await {
            CheckoutState::Ready(summary) => summary.clone(),
            CheckoutState::Aborted(nav) => return Ok(CheckoutStep::Redirect(nav.clone())),
            CheckoutState::Completed(id) => return Ok(CheckoutStep::Redirect(Navigation::OrderTracking(*id))),
            CheckoutState::Entering | CheckoutState::Confirming => {
                return Err(CartError::Validation("Checkout is not ready yet".into()));
            },
        };
        let question = format!("Confirm your order for {}?", summary.cart.totals.total);
        if !prompt.confirm(&question) {
            debug!("🧾️ Order confirmation declined");
            return Ok(CheckoutStep::Ready(summary));
        }
        *self.state.write().await = CheckoutState::Confirming;
        info!("🧾️ Creating order for {}", summary.cart.totals.total);
        match self.backend.create_order().await {
            Ok(order) => {
                info!("🧾️ Order {} created", order.id);
                if let Err(e) = self.store.clear_selection() {
                    warn!("🧾️ Could not clear the saved payment method. {e}");
                }
                *self.state.write().await = CheckoutState::Completed(order.id);
                Ok(CheckoutStep::Redirect(Navigation::OrderTracking(order.id)))
            },
            Err(e) => {
                warn!("🧾️ Order creation failed. {e}");
                *self.state.write().await = CheckoutState::Ready(summary);
                match e {
                    BackendError::Unauthorized => Err(CartError::AuthRequired),
                    _ => Err(CartError::Failed(ORDER_FAILED.into())),
                }
            },
        }
    }
}

fn step_for(state: &CheckoutState) -> CheckoutStep {
    match state {
        CheckoutState::Ready(summary) => CheckoutStep::Ready(summary.clone()),
        CheckoutState::Aborted(nav) => CheckoutStep::Redirect(nav.clone()),
        CheckoutState::Completed(id) => CheckoutStep::Redirect(Navigation::OrderTracking(*id)),
        CheckoutState::Entering | CheckoutState::Confirming => {
            CheckoutStep::Redirect(Navigation::Cart { message: "Checkout was interrupted".into() })
        },
    }
}

#[cfg(test)]
mod test {
    use comanda_common::Colones;

    use super::*;
    use crate::{
        cart_api::payment_objects::PaymentMethod,
        cart_types::{Branch, BranchId, OrderId, ProductId},
        memory::{BackendCall, Endpoint, MemoryBackend, MemorySelectionStore, ScriptedPrompt},
    };

    fn backend_with_cart(branch: bool) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.add_menu_item(ProductId(1), "Casado", Colones::from(4_500));
        backend.add_branch(Branch {
            id: BranchId(1),
            name: "Sabana".into(),
            address: "Parque La Sabana".into(),
            province: "San José".into(),
        });
        backend.put_line(ProductId(1), 2);
        if branch {
            backend.set_cart_branch(Some(BranchId(1)));
        }
        backend
    }

    #[tokio::test]
    async fn no_branch_redirects_to_the_cart() {
        let backend = backend_with_cart(false);
        let api = CheckoutApi::new(backend.clone(), MemorySelectionStore::new());
        let step = api.enter().await.unwrap();
        assert!(matches!(step, CheckoutStep::Redirect(Navigation::Cart { .. })));
        assert!(matches!(api.state().await, CheckoutState::Aborted(_)));
        // The abort is final, even once a branch is chosen
        backend.set_cart_branch(Some(BranchId(1)));
        let step = api.enter().await.unwrap();
        assert!(matches!(step, CheckoutStep::Redirect(Navigation::Cart { .. })));
        let step = api.confirm(&ScriptedPrompt::answering([true])).await.unwrap();
        assert!(matches!(step, CheckoutStep::Redirect(Navigation::Cart { .. })));
        assert!(!backend.calls().contains(&BackendCall::CreateOrder));
    }

    #[tokio::test]
    async fn empty_cart_redirects_home() {
        let backend = MemoryBackend::new();
        backend.add_branch(Branch {
            id: BranchId(1),
            name: "Sabana".into(),
            address: "Parque La Sabana".into(),
            province: "San José".into(),
        });
        backend.set_cart_branch(Some(BranchId(1)));
        let api = CheckoutApi::new(backend, MemorySelectionStore::new());
        let step = api.enter().await.unwrap();
        assert_eq!(
            step,
            CheckoutStep::Redirect(Navigation::Home { message: CheckoutBlocker::EmptyCart.to_string() })
        );
    }

    #[tokio::test]
    async fn empty_cart_without_a_branch_redirects_to_the_cart() {
        let api = CheckoutApi::new(MemoryBackend::new(), MemorySelectionStore::new());
        let step = api.enter().await.unwrap();
        assert_eq!(
            step,
            CheckoutStep::Redirect(Navigation::Cart { message: CheckoutBlocker::NoBranch.to_string() })
        );
    }

    #[tokio::test]
    async fn confirmed_checkout_creates_the_order_and_clears_the_selection() {
        let backend = backend_with_cart(true);
        let store = MemorySelectionStore::with_selection(PaymentMethod::cash());
        let api = CheckoutApi::new(backend.clone(), store.clone());
        let step = api.enter().await.unwrap();
        let CheckoutStep::Ready(summary) = step else { panic!("Checkout should be ready") };
        assert_eq!(summary.payment, Some(PaymentMethod::cash()));
        assert_eq!(summary.cart.totals.total, Colones::from(10_170));

        let prompt = ScriptedPrompt::answering([true]);
        let step = api.confirm(&prompt).await.unwrap();
        assert_eq!(step, CheckoutStep::Redirect(Navigation::OrderTracking(OrderId(1001))));
        assert_eq!(prompt.questions(), vec!["Confirm your order for ₡10,170?".to_string()]);
        assert_eq!(api.state().await, CheckoutState::Completed(OrderId(1001)));
        assert!(store.current().is_none());
        assert!(backend.server_cart().lines.is_empty());
    }

    #[tokio::test]
    async fn declining_stays_ready() {
        let backend = backend_with_cart(true);
        let api = CheckoutApi::new(backend.clone(), MemorySelectionStore::new());
        api.enter().await.unwrap();
        let step = api.confirm(&ScriptedPrompt::answering([false])).await.unwrap();
        assert!(matches!(step, CheckoutStep::Ready(_)));
        assert!(!backend.calls().contains(&BackendCall::CreateOrder));
    }

    #[tokio::test]
    async fn failed_order_stays_ready_with_a_generic_error() {
        let backend = backend_with_cart(true);
        let store = MemorySelectionStore::with_selection(PaymentMethod::cash());
        let api = CheckoutApi::new(backend.clone(), store.clone());
        api.enter().await.unwrap();
        backend.fail(Endpoint::CreateOrder, BackendError::rejected(500, "stack trace"));
        let err = api.confirm(&ScriptedPrompt::answering([true])).await.unwrap_err();
        assert_eq!(err, CartError::Failed(ORDER_FAILED.into()));
        assert!(matches!(api.state().await, CheckoutState::Ready(_)));
        assert_eq!(store.current(), Some(PaymentMethod::cash()));
        assert!(!api.is_processing());
    }

    #[tokio::test]
    async fn confirm_before_enter_is_refused() {
        let api = CheckoutApi::new(backend_with_cart(true), MemorySelectionStore::new());
        let err = api.confirm(&ScriptedPrompt::answering([true])).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }
}
