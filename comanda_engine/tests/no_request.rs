//! Operations that must be settled locally, checked against mocks that fail the test on any unexpected call.
use comanda_engine::{
    cart_types::{
        Branch,
        BranchId,
        BranchRef,
        CartLine,
        CartSnapshot,
        CartTotals,
        Coupon,
        CouponCode,
        LineId,
        Order,
        OrderId,
        ProductId,
    },
    checkout_objects::{CartUpdate, CheckoutStep, Navigation},
    memory::{MemorySelectionStore, ScriptedPrompt},
    payment_objects::PaymentMethodId,
    traits::{BackendError, CartManagement, OrderManagement},
    CartError,
    CartSessionApi,
    CheckoutApi,
};
use comanda_common::Colones;
use mockall::mock;

mock! {
    pub Restaurant {}
    impl CartManagement for Restaurant {
        async fn fetch_cart(&self) -> Result<CartSnapshot, BackendError>;
        async fn fetch_branch(&self, branch_id: BranchId) -> Result<Branch, BackendError>;
        async fn add_product(&self, product_id: ProductId, quantity: u32) -> Result<(), BackendError>;
        async fn update_line_quantity(&self, line_id: LineId, quantity: u32) -> Result<(), BackendError>;
        async fn remove_line(&self, line_id: LineId) -> Result<(), BackendError>;
        async fn select_branch(&self, branch_id: BranchId) -> Result<(), BackendError>;
        async fn set_payment_method(&self, method: &PaymentMethodId) -> Result<(), BackendError>;
        async fn apply_coupon(&self, code: &CouponCode) -> Result<Coupon, BackendError>;
        async fn remove_coupon(&self) -> Result<(), BackendError>;
    }
    impl OrderManagement for Restaurant {
        async fn create_order(&self) -> Result<Order, BackendError>;
        async fn fetch_order(&self, order_id: OrderId) -> Result<Order, BackendError>;
        async fn fetch_my_orders(&self) -> Result<Vec<Order>, BackendError>;
    }
}

fn single_line_cart(branch: BranchRef) -> CartSnapshot {
    let line = CartLine {
        id: LineId(11),
        product_id: ProductId(3),
        name: "Batido de cas".into(),
        quantity: 1,
        unit_price: Colones::from(1_500),
        image_url: None,
    };
    CartSnapshot {
        lines: vec![line],
        branch,
        coupon: None,
        totals: CartTotals::compute(Colones::from(1_500), Colones::ZERO),
        estimated_prep_minutes: 5,
    }
}

#[tokio::test]
async fn decrementing_a_single_unit_makes_no_request() {
    let mut backend = MockRestaurant::new();
    backend.expect_fetch_cart().times(1).returning(|| Ok(single_line_cart(BranchRef::None)));
    backend.expect_update_line_quantity().never();
    backend.expect_remove_line().never();
    let api = CartSessionApi::new(backend);
    let before = api.load().await.unwrap();
    let update = api.decrement_line(LineId(11), 1).await.unwrap();
    assert_eq!(update, CartUpdate::Unchanged);
    assert_eq!(api.snapshot().await, Some(before));
}

#[tokio::test]
async fn blank_coupon_makes_no_request() {
    let mut backend = MockRestaurant::new();
    backend.expect_apply_coupon().never();
    backend.expect_fetch_cart().never();
    let api = CartSessionApi::new(backend);
    for code in ["", "   ", "\t\n"] {
        let err = api.apply_coupon(code).await.unwrap_err();
        assert_eq!(err, CartError::Validation("Please enter a coupon code".into()));
    }
}

#[tokio::test]
async fn coupon_is_sent_upper_cased() {
    let mut backend = MockRestaurant::new();
    backend
        .expect_apply_coupon()
        .withf(|code| code.as_str() == "DESCUENTO20")
        .times(1)
        .returning(|code| Ok(Coupon { code: code.clone(), discount: Colones::from(500) }));
    backend.expect_fetch_cart().times(1).returning(|| Ok(single_line_cart(BranchRef::None)));
    let api = CartSessionApi::new(backend);
    let cart = api.apply_coupon(" descuento20").await.unwrap();
    // This server does not echo the coupon in the cart, so the applied one is kept
    assert_eq!(cart.coupon.map(|c| c.code.to_string()), Some("DESCUENTO20".to_string()));
}

#[tokio::test]
async fn checkout_without_a_branch_never_creates_an_order() {
    let mut backend = MockRestaurant::new();
    backend.expect_fetch_cart().times(1).returning(|| Ok(single_line_cart(BranchRef::None)));
    backend.expect_create_order().never();
    let api = CheckoutApi::new(backend, MemorySelectionStore::new());
    let step = api.enter().await.unwrap();
    assert!(matches!(step, CheckoutStep::Redirect(Navigation::Cart { .. })));
    let step = api.confirm(&ScriptedPrompt::answering([true])).await.unwrap();
    assert!(matches!(step, CheckoutStep::Redirect(Navigation::Cart { .. })));
}

#[tokio::test]
async fn branch_id_is_resolved_before_checkout() {
    let mut backend = MockRestaurant::new();
    backend.expect_fetch_cart().times(1).returning(|| Ok(single_line_cart(BranchRef::Id(BranchId(2)))));
    backend.expect_fetch_branch().withf(|id| *id == BranchId(2)).times(1).returning(|id| {
        Ok(Branch { id, name: "Liberia".into(), address: "Frente al parque".into(), province: "Guanacaste".into() })
    });
    let api = CheckoutApi::new(backend, MemorySelectionStore::new());
    let step = api.enter().await.unwrap();
    let CheckoutStep::Ready(summary) = step else { panic!("Checkout should be ready") };
    assert_eq!(summary.cart.branch.map(|b| b.name), Some("Liberia".to_string()));
}
