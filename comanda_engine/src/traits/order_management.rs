use crate::{
    cart_types::{Order, OrderId},
    traits::BackendError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Turn the current cart into an order. The server empties the cart when this succeeds.
    async fn create_order(&self) -> Result<Order, BackendError>;
    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, BackendError>;
    /// All orders placed by the authenticated customer, most recent first.
    async fn fetch_my_orders(&self) -> Result<Vec<Order>, BackendError>;
}
