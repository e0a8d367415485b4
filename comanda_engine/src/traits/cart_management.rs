use crate::{
    cart_api::payment_objects::PaymentMethodId,
    cart_types::{Branch, BranchId, CartSnapshot, Coupon, CouponCode, LineId, ProductId},
    traits::BackendError,
};

/// The server-side cart. Every mutation is a single request; callers re-fetch the cart afterwards to pick up the
/// recomputed totals.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Fetch the current cart. The server creates it implicitly, so an unused cart comes back empty.
    async fn fetch_cart(&self) -> Result<CartSnapshot, BackendError>;
    /// Fetch a single branch, for carts that only carry the branch id.
    async fn fetch_branch(&self, branch_id: BranchId) -> Result<Branch, BackendError>;
    async fn add_product(&self, product_id: ProductId, quantity: u32) -> Result<(), BackendError>;
    /// Set the quantity of a line. Callers never send a quantity of zero; lines are removed with
    /// [`Self::remove_line`].
    async fn update_line_quantity(&self, line_id: LineId, quantity: u32) -> Result<(), BackendError>;
    async fn remove_line(&self, line_id: LineId) -> Result<(), BackendError>;
    async fn select_branch(&self, branch_id: BranchId) -> Result<(), BackendError>;
    /// Bind a payment method to the cart. Cash is sent as the `efectivo` sentinel, never as a numeric id.
    async fn set_payment_method(&self, method: &PaymentMethodId) -> Result<(), BackendError>;
    /// Apply a coupon. On success the server returns the coupon with its discount.
    async fn apply_coupon(&self, code: &CouponCode) -> Result<Coupon, BackendError>;
    async fn remove_coupon(&self) -> Result<(), BackendError>;
}
