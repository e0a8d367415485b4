use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    cart_api::{errors::CartError, policy::TrackerConfig},
    cart_types::{Order, OrderId, OrderStatus},
    traits::{BackendError, OrderManagement},
};

/// `OrderTrackerApi` reads orders, and follows one order until the restaurant is done with it.
pub struct OrderTrackerApi<B> {
    backend: B,
    config: TrackerConfig,
}

impl<B> Debug for OrderTrackerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderTrackerApi")
    }
}

impl<B> OrderTrackerApi<B>
where B: OrderManagement
{
    pub fn new(backend: B, config: TrackerConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub async fn fetch(&self, order_id: OrderId) -> Result<Order, CartError> {
        self.backend.fetch_order(order_id).await.map_err(|e| tracking_error(order_id, e))
    }

    pub async fn my_orders(&self) -> Result<Vec<Order>, CartError> {
        self.backend.fetch_my_orders().await.map_err(|e| {
            warn!("🕰️ Could not fetch order history. {e}");
            CartError::from_backend(e, "Could not load your orders")
        })
    }

    /// Poll an order until it is delivered or cancelled, and return it in that final state.
    ///
    /// `on_update` is called with the first status seen and again every time the status changes. A failed fetch
    /// doubles the wait before the next one, up to [`TrackerConfig::max_backoff`]; the first successful fetch
    /// restores the normal interval. Unauthorized and not-found responses end tracking immediately.
    ///
    /// The future runs until the order is final. Drop it (for example, in a `tokio::select!`) to stop early.
    pub async fn track<F>(&self, order_id: OrderId, mut on_update: F) -> Result<Order, CartError>
    where F: FnMut(&Order) {
        let mut delay = self.config.interval;
        let mut last_status: Option<OrderStatus> = None;
        info!("🕰️ Tracking order {order_id}");
        loop {
            match self.backend.fetch_order(order_id).await {
                Ok(order) => {
                    delay = self.config.interval;
                    if last_status.as_ref() != Some(&order.status) {
                        debug!("🕰️ Order {order_id} is now {}", order.status);
                        on_update(&order);
                        last_status = Some(order.status.clone());
                    }
                    if order.status.is_terminal() {
                        info!("🕰️ Order {order_id} finished: {}", order.status);
                        return Ok(order);
                    }
                },
                Err(e @ (BackendError::Unauthorized | BackendError::NotFound(_))) => {
                    return Err(tracking_error(order_id, e));
                },
                Err(e) => {
                    delay = backoff(delay, self.config.max_backoff);
                    warn!("🕰️ Could not fetch order {order_id}. {e}. Retrying in {}s", delay.as_secs());
                },
            }
            tokio::time::sleep(delay).await;
        }
    }
}

/// The delay after another failed fetch: double the last one, up to `max`.
fn backoff(delay: Duration, max: Duration) -> Duration {
    delay.saturating_mul(2).min(max)
}

fn tracking_error(order_id: OrderId, e: BackendError) -> CartError {
    match e {
        BackendError::NotFound(_) => CartError::Rejected(format!("Order {order_id} was not found")),
        e => CartError::from_backend(e, "Could not load the order"),
    }
}

#[cfg(test)]
mod test {

    use comanda_common::Colones;
    use tokio::time::Instant;

    use super::*;
    use crate::memory::{BackendCall, Endpoint, MemoryBackend};

    fn config() -> TrackerConfig {
        TrackerConfig { interval: Duration::from_secs(10), max_backoff: Duration::from_secs(30) }
    }

    fn backend_with_order() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.insert_order(Order::new(OrderId(42), OrderStatus::Pending, Colones::from(9_300)));
        backend
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_stops_at_a_terminal_status() {
        let backend = backend_with_order();
        backend.script_statuses([
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ]);
        let api = OrderTrackerApi::new(backend.clone(), config());
        let start = Instant::now();
        let mut seen = Vec::new();
        let order = api.track(OrderId(42), |o| seen.push(o.status.clone())).await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(seen, vec![
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered
        ]);
        assert_eq!(backend.calls().len(), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_back_off_and_success_resets_the_interval() {
        let backend = backend_with_order();
        backend.fail(Endpoint::FetchOrder, BackendError::Network("timeout".into()));
        let api = OrderTrackerApi::new(backend.clone(), config());
        let start = Instant::now();
        let healer = backend.clone();
        let tracking = api.track(OrderId(42), |_| {});
        tokio::pin!(tracking);
        // Fetches at t=0 (fail, wait 20), t=20 (fail, wait 30), t=50 (fail, wait 30 again: capped)
        tokio::select! {
            _ = &mut tracking => panic!("Tracking should still be running"),
            _ = tokio::time::sleep(Duration::from_secs(55)) => {},
        }
        assert_eq!(backend.calls().len(), 3);
        healer.heal(Endpoint::FetchOrder);
        healer.script_statuses([OrderStatus::Preparing, OrderStatus::Cancelled]);
        // t=80 succeeds (Preparing, wait 10), t=90 succeeds (Cancelled)
        let order = tracking.await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(start.elapsed(), Duration::from_secs(90));
        assert!(backend.calls().iter().all(|c| *c == BackendCall::FetchOrder(OrderId(42))));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let max = Duration::from_secs(60);
        assert_eq!(backoff(Duration::from_secs(10), max), Duration::from_secs(20));
        assert_eq!(backoff(Duration::from_secs(40), max), max);
        let huge = Duration::from_secs(u64::MAX);
        assert_eq!(backoff(huge, huge), huge);
        assert_eq!(backoff(Duration::MAX, Duration::MAX), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_orders_end_tracking() {
        let api = OrderTrackerApi::new(MemoryBackend::new(), config());
        let err = api.track(OrderId(7), |_| {}).await.unwrap_err();
        assert_eq!(err, CartError::Rejected("Order #7 was not found".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_ends_tracking() {
        let backend = backend_with_order();
        backend.fail(Endpoint::FetchOrder, BackendError::Unauthorized);
        let api = OrderTrackerApi::new(backend, config());
        let err = api.track(OrderId(42), |_| {}).await.unwrap_err();
        assert_eq!(err, CartError::AuthRequired);
    }

    #[tokio::test]
    async fn my_orders_are_most_recent_first() {
        let backend = backend_with_order();
        backend.insert_order(Order::new(OrderId(43), OrderStatus::Ready, Colones::from(1_130)));
        let api = OrderTrackerApi::new(backend, config());
        let ids = api.my_orders().await.unwrap().into_iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![OrderId(43), OrderId(42)]);
    }
}
