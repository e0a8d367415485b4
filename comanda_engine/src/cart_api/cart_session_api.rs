use std::fmt::Debug;

use log::*;
use tokio::sync::RwLock;

use crate::{
    cart_api::{checkout_objects::CartUpdate, errors::CartError, policy::CartPolicy},
    cart_types::{BranchId, BranchRef, CartSession, CouponCode, LineId, ProductId},
    helpers::{Epoch, SingleFlight},
    traits::{BackendError, CartManagement, UserPrompt},
};

const LOAD_FAILED: &str = "Could not load your cart";

/// Fetch the cart and resolve its branch. If the server only sent the branch id, the branch is fetched separately.
pub(crate) async fn fetch_cart_session<B: CartManagement>(backend: &B) -> Result<CartSession, BackendError> {
    let snapshot = backend.fetch_cart().await?;
    let branch = match snapshot.branch {
        BranchRef::None => None,
        BranchRef::Embedded(branch) => Some(branch),
        BranchRef::Id(id) => {
            trace!("🛒️ Cart only carries branch {id}. Fetching it.");
            Some(backend.fetch_branch(id).await?)
        },
    };
    Ok(CartSession {
        lines: snapshot.lines,
        branch,
        coupon: snapshot.coupon,
        totals: snapshot.totals,
        estimated_prep_minutes: snapshot.estimated_prep_minutes,
    })
}

/// `CartSessionApi` keeps a local copy of the server-side cart and funnels every change through the server.
///
/// Every mutation is one request followed by a full reload, so the local copy is only ever a cart the server
/// produced. Only one mutation may be in flight at a time; a second one is rejected with [`CartError::Busy`]
/// instead of being queued. Loads are tagged with a generation, and a response that arrives after a newer load
/// or an [`Self::invalidate`] is thrown away.
pub struct CartSessionApi<B> {
    backend: B,
    policy: CartPolicy,
    cart: RwLock<Option<CartSession>>,
    in_flight: SingleFlight,
    epoch: Epoch,
}

impl<B> Debug for CartSessionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartSessionApi")
    }
}

impl<B> CartSessionApi<B> {
    pub fn new(backend: B) -> Self {
        Self::with_policy(backend, CartPolicy::default())
    }

    pub fn with_policy(backend: B, policy: CartPolicy) -> Self {
        Self { backend, policy, cart: RwLock::new(None), in_flight: SingleFlight::new(), epoch: Epoch::new() }
    }

    pub fn policy(&self) -> &CartPolicy {
        &self.policy
    }

    /// True while a mutation is waiting on the server.
    pub fn is_processing(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// The last cart loaded, if any.
    pub async fn snapshot(&self) -> Option<CartSession> {
        self.cart.read().await.clone()
    }

    /// Forget the local cart and discard every response still in flight. Call this when leaving the cart screen or
    /// logging out.
    pub async fn invalidate(&self) {
        self.epoch.advance();
        *self.cart.write().await = None;
        debug!("🛒️ Cart session invalidated");
    }
}

impl<B> CartSessionApi<B>
where B: CartManagement
{
    /// Fetch the cart from the server and make it the local copy.
    pub async fn load(&self) -> Result<CartSession, CartError> {
        self.reload(LOAD_FAILED).await
    }

    /// Add `quantity` units of a product. The server merges them into an existing line for the same product.
    pub async fn add_product(&self, product_id: ProductId, quantity: u32) -> Result<CartSession, CartError> {
        if quantity == 0 {
            return Err(CartError::Validation("Quantity must be at least 1".into()));
        }
        let already_in_cart = self
            .cart
            .read()
            .await
            .as_ref()
            .and_then(|c| c.lines.iter().find(|l| l.product_id == product_id).map(|l| l.quantity))
            .unwrap_or(0);
        self.check_line_cap(already_in_cart.saturating_add(quantity))?;
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        debug!("🛒️ Adding {quantity} x product {product_id}");
        let result = self.backend.add_product(product_id, quantity).await;
        self.after_mutation(result, "Could not add the product to your cart").await
    }

    /// Add one unit to a line, using the quantity from the last load.
    pub async fn increment_line(&self, line_id: LineId) -> Result<CartSession, CartError> {
        let current = self.cached_quantity(line_id).await?;
        let quantity = current.saturating_add(1);
        self.check_line_cap(quantity)?;
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        debug!("🛒️ Line {line_id}: {current} -> {quantity}");
        let result = self.backend.update_line_quantity(line_id, quantity).await;
        self.after_mutation(result, "Could not update the quantity").await
    }

    /// Take one unit off a line. A line with a single unit is left alone and no request is sent: lines are only
    /// removed through [`Self::remove_line`], which asks first.
    pub async fn decrement_line(&self, line_id: LineId, current_quantity: u32) -> Result<CartUpdate, CartError> {
        if current_quantity <= 1 {
            trace!("🛒️ Line {line_id} is already at {current_quantity}. Not decrementing.");
            return Ok(CartUpdate::Unchanged);
        }
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        let quantity = current_quantity - 1;
        debug!("🛒️ Line {line_id}: {current_quantity} -> {quantity}");
        let result = self.backend.update_line_quantity(line_id, quantity).await;
        self.after_mutation(result, "Could not update the quantity").await.map(CartUpdate::Updated)
    }

    /// Remove a line after the customer confirms.
    pub async fn remove_line<P: UserPrompt>(&self, line_id: LineId, prompt: &P) -> Result<CartUpdate, CartError> {
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        let name = self.cart.read().await.as_ref().and_then(|c| c.line(line_id).map(|l| l.name.clone()));
        let question = match name {
            Some(name) => format!("Remove {name} from your cart?"),
            None => "Remove this item from your cart?".to_string(),
        };
        if !prompt.confirm(&question) {
            debug!("🛒️ Removal of line {line_id} declined");
            return Ok(CartUpdate::Declined);
        }
        info!("🛒️ Removing line {line_id}");
        let result = self.backend.remove_line(line_id).await;
        self.after_mutation(result, "Could not remove the item").await.map(CartUpdate::Updated)
    }

    /// Apply a coupon code. The code is trimmed and upper-cased, and a blank code is refused without a request.
    pub async fn apply_coupon(&self, raw_code: &str) -> Result<CartSession, CartError> {
        let code = CouponCode::parse(raw_code)?;
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        debug!("🛒️ Applying coupon {code}");
        let coupon = match self.backend.apply_coupon(&code).await {
            Ok(coupon) => coupon,
            Err(e) => {
                info!("🛒️ Coupon {code} was not applied. {e}");
                return Err(self.fail(CartError::from_backend(e, "invalid or expired coupon")).await);
            },
        };
        info!("🛒️ Coupon {} applied. Discount: {}", coupon.code, coupon.discount);
        let mut cart = self.reload("Could not refresh your cart").await?;
        if cart.coupon.is_none() {
            cart.coupon = Some(coupon);
            if let Some(local) = self.cart.write().await.as_mut() {
                local.coupon = cart.coupon.clone();
            }
        }
        Ok(cart)
    }

    /// Remove the applied coupon after the customer confirms.
    pub async fn remove_coupon<P: UserPrompt>(&self, prompt: &P) -> Result<CartUpdate, CartError> {
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        let code = self.cart.read().await.as_ref().and_then(|c| c.coupon.as_ref().map(|c| c.code.to_string()));
        let question = match code {
            Some(code) => format!("Remove coupon {code}?"),
            None => "Remove the coupon?".to_string(),
        };
        if !prompt.confirm(&question) {
            return Ok(CartUpdate::Declined);
        }
        info!("🛒️ Removing the coupon");
        let result = self.backend.remove_coupon().await;
        self.after_mutation(result, "Could not remove the coupon").await.map(CartUpdate::Updated)
    }

    /// Choose the branch the order will be picked up from.
    pub async fn select_branch(&self, branch_id: BranchId) -> Result<CartSession, CartError> {
        let _guard = self.in_flight.try_acquire().ok_or(CartError::Busy)?;
        debug!("🛒️ Selecting branch {branch_id}");
        let result = self.backend.select_branch(branch_id).await;
        self.after_mutation(result, "Could not select that branch").await
    }

    async fn reload(&self, fallback: &str) -> Result<CartSession, CartError> {
        let ticket = self.epoch.advance();
        let fetched = fetch_cart_session(&self.backend).await;
        if !self.epoch.is_current(ticket) {
            debug!("🛒️ Discarding a stale cart response");
            return Err(CartError::Superseded);
        }
        match fetched {
            Ok(cart) => {
                trace!("🛒️ Cart loaded. {} lines, total {}", cart.lines.len(), cart.totals.total);
                *self.cart.write().await = Some(cart.clone());
                Ok(cart)
            },
            Err(e) => {
                warn!("🛒️ Could not load the cart. {e}");
                Err(self.fail(CartError::from_backend(e, fallback)).await)
            },
        }
    }

    async fn after_mutation(
        &self,
        result: Result<(), BackendError>,
        fallback: &str,
    ) -> Result<CartSession, CartError> {
        match result {
            Ok(()) => self.reload("Your change was saved but the cart could not be refreshed").await,
            Err(e) => {
                info!("🛒️ Cart change refused. {e}");
                Err(self.fail(CartError::from_backend(e, fallback)).await)
            },
        }
    }

    async fn fail(&self, err: CartError) -> CartError {
        if err.is_auth_required() {
            self.invalidate().await;
        }
        err
    }

    async fn cached_quantity(&self, line_id: LineId) -> Result<u32, CartError> {
        self.cart
            .read()
            .await
            .as_ref()
            .and_then(|c| c.line(line_id))
            .map(|l| l.quantity)
            .ok_or_else(|| CartError::Validation("That item is no longer in your cart".into()))
    }

    fn check_line_cap(&self, quantity: u32) -> Result<(), CartError> {
        match self.policy.max_line_quantity {
            Some(max) if quantity > max => {
                Err(CartError::Validation(format!("You can order at most {max} of each item")))
            },
            _ => Ok(()),
        }
    }
}
