use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use comanda_common::Colones;
use log::*;

use crate::{
    cart_api::{
        exchange_objects::{ExchangeRate, RateSource},
        payment_objects::{PaymentMethodId, ServerPaymentRef, StoredCard},
    },
    cart_types::{
        Branch,
        BranchId,
        BranchRef,
        CardId,
        CartLine,
        CartSnapshot,
        CartTotals,
        Coupon,
        CouponCode,
        LineId,
        Order,
        OrderId,
        OrderStatus,
        ProductId,
    },
    traits::{
        BackendError,
        CartManagement,
        ExchangeRateError,
        ExchangeRateSource,
        OrderManagement,
        PaymentMethodManagement,
    },
};

/// A request as the in-memory server received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchCart,
    FetchBranch(BranchId),
    AddProduct { product_id: ProductId, quantity: u32 },
    UpdateLineQuantity { line_id: LineId, quantity: u32 },
    RemoveLine(LineId),
    SelectBranch(BranchId),
    /// Recorded in the form that would go over the wire.
    SetPaymentMethod(ServerPaymentRef),
    /// The code exactly as it was sent.
    ApplyCoupon(String),
    RemoveCoupon,
    CreateOrder,
    FetchOrder(OrderId),
    FetchMyOrders,
    FetchCards,
    DeleteCard(CardId),
    FetchLiveRate,
    FetchCachedRate,
}

impl BackendCall {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::FetchCart => Endpoint::FetchCart,
            Self::FetchBranch(_) => Endpoint::FetchBranch,
            Self::AddProduct { .. } => Endpoint::AddProduct,
            Self::UpdateLineQuantity { .. } => Endpoint::UpdateLineQuantity,
            Self::RemoveLine(_) => Endpoint::RemoveLine,
            Self::SelectBranch(_) => Endpoint::SelectBranch,
            Self::SetPaymentMethod(_) => Endpoint::SetPaymentMethod,
            Self::ApplyCoupon(_) => Endpoint::ApplyCoupon,
            Self::RemoveCoupon => Endpoint::RemoveCoupon,
            Self::CreateOrder => Endpoint::CreateOrder,
            Self::FetchOrder(_) => Endpoint::FetchOrder,
            Self::FetchMyOrders => Endpoint::FetchMyOrders,
            Self::FetchCards => Endpoint::FetchCards,
            Self::DeleteCard(_) => Endpoint::DeleteCard,
            Self::FetchLiveRate => Endpoint::FetchLiveRate,
            Self::FetchCachedRate => Endpoint::FetchCachedRate,
        }
    }

    /// Whether this call changes anything on the server.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::AddProduct { .. } |
                Self::UpdateLineQuantity { .. } |
                Self::RemoveLine(_) |
                Self::SelectBranch(_) |
                Self::SetPaymentMethod(_) |
                Self::ApplyCoupon(_) |
                Self::RemoveCoupon |
                Self::CreateOrder |
                Self::DeleteCard(_)
        )
    }
}

/// The endpoints a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FetchCart,
    FetchBranch,
    AddProduct,
    UpdateLineQuantity,
    RemoveLine,
    SelectBranch,
    SetPaymentMethod,
    ApplyCoupon,
    RemoveCoupon,
    CreateOrder,
    FetchOrder,
    FetchMyOrders,
    FetchCards,
    DeleteCard,
    FetchLiveRate,
    FetchCachedRate,
}

#[derive(Debug)]
struct MemoryState {
    menu: BTreeMap<ProductId, (String, Colones)>,
    lines: Vec<CartLine>,
    next_line_id: i64,
    branches: Vec<Branch>,
    cart_branch: Option<BranchId>,
    embed_branch: bool,
    coupons: HashMap<String, Colones>,
    coupon_rejection: Option<String>,
    applied_coupon: Option<Coupon>,
    payment: Option<ServerPaymentRef>,
    cards: Vec<StoredCard>,
    orders: Vec<Order>,
    next_order_id: i64,
    status_script: VecDeque<OrderStatus>,
    live_rate: Option<ExchangeRate>,
    cached_rate: Option<ExchangeRate>,
    prep_minutes_per_item: u32,
    failures: HashMap<Endpoint, BackendError>,
    calls: Vec<BackendCall>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            menu: BTreeMap::new(),
            lines: Vec::new(),
            next_line_id: 1,
            branches: Vec::new(),
            cart_branch: None,
            embed_branch: true,
            coupons: HashMap::new(),
            coupon_rejection: None,
            applied_coupon: None,
            payment: None,
            cards: Vec::new(),
            orders: Vec::new(),
            next_order_id: 1001,
            status_script: VecDeque::new(),
            live_rate: None,
            cached_rate: None,
            prep_minutes_per_item: 5,
            failures: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

impl MemoryState {
    /// Record the call, then fail it if a failure was injected for its endpoint.
    fn receive(&mut self, call: BackendCall) -> Result<(), BackendError> {
        let endpoint = call.endpoint();
        trace!("🧪️ {call:?}");
        self.calls.push(call);
        match self.failures.get(&endpoint) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> CartSnapshot {
        let subtotal: Colones = self.lines.iter().map(CartLine::line_total).sum();
        let discount = self.applied_coupon.as_ref().map(|c| c.discount).unwrap_or_default();
        let branch = match (self.cart_branch, self.embed_branch) {
            (None, _) => BranchRef::None,
            (Some(id), false) => BranchRef::Id(id),
            (Some(id), true) => match self.branches.iter().find(|b| b.id == id) {
                Some(branch) => BranchRef::Embedded(branch.clone()),
                None => BranchRef::Id(id),
            },
        };
        let items = self.lines.iter().map(|l| l.quantity).sum::<u32>();
        CartSnapshot {
            lines: self.lines.clone(),
            branch,
            coupon: self.applied_coupon.clone(),
            totals: CartTotals::compute(subtotal, discount),
            estimated_prep_minutes: items * self.prep_minutes_per_item,
        }
    }

    fn branch(&self, id: BranchId) -> Option<Branch> {
        self.branches.iter().find(|b| b.id == id).cloned()
    }
}

/// An in-memory restaurant server.
///
/// Implements every backend trait, keeps a log of the calls it receives, and can be told to fail any endpoint.
/// Clones share the same state, so one clone can be handed to an API while the test keeps another to inspect it.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small restaurant with a menu, two branches, a coupon, a stored card and exchange rates. The cart starts
    /// empty.
    pub fn demo() -> Self {
        let backend = Self::new();
        backend.add_menu_item(ProductId(1), "Casado con pollo", Colones::from(4_500));
        backend.add_menu_item(ProductId(2), "Gallo pinto", Colones::from(2_800));
        backend.add_menu_item(ProductId(3), "Batido de cas", Colones::from(1_500));
        backend.add_menu_item(ProductId(4), "Arroz con leche", Colones::from(1_200));
        backend.add_branch(Branch {
            id: BranchId(1),
            name: "Sabana".into(),
            address: "Costado oeste del Parque La Sabana".into(),
            province: "San José".into(),
        });
        backend.add_branch(Branch {
            id: BranchId(2),
            name: "Heredia Centro".into(),
            address: "100 m norte del Parque Central".into(),
            province: "Heredia".into(),
        });
        backend.add_coupon("DESCUENTO20", Colones::from(2_000));
        backend.add_card(StoredCard {
            id: CardId(7),
            brand: "Visa".into(),
            last_four_digits: "4242".into(),
            alias: Some("Personal".into()),
            principal: true,
        });
        backend.add_card(StoredCard {
            id: CardId(8),
            brand: "Mastercard".into(),
            last_four_digits: "5100".into(),
            alias: None,
            principal: false,
        });
        let date = Utc::now().date_naive();
        backend.set_live_rate(ExchangeRate::new(505.10, 512.25, date, RateSource::Primary).ok());
        backend.set_cached_rate(ExchangeRate::new(504.00, 511.80, date, RateSource::Cached).ok());
        backend
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    //------------------------------------------   Setup   ------------------------------------------------------------
    pub fn add_menu_item(&self, id: ProductId, name: &str, price: Colones) {
        self.state().menu.insert(id, (name.to_string(), price));
    }

    /// Put a line straight into the cart, bypassing the call log. Returns the new line's id.
    pub fn put_line(&self, product_id: ProductId, quantity: u32) -> LineId {
        let mut state = self.state();
        let (name, unit_price) =
            state.menu.get(&product_id).cloned().unwrap_or_else(|| (format!("Producto {product_id}"), Colones::ZERO));
        let id = LineId(state.next_line_id);
        state.next_line_id += 1;
        state.lines.push(CartLine { id, product_id, name, quantity, unit_price, image_url: None });
        id
    }

    pub fn add_branch(&self, branch: Branch) {
        self.state().branches.push(branch);
    }

    /// Set the cart's branch directly, bypassing the call log.
    pub fn set_cart_branch(&self, branch: Option<BranchId>) {
        self.state().cart_branch = branch;
    }

    /// When false, carts report only the branch id and the client has to fetch the branch separately.
    pub fn embed_branch(&self, embed: bool) {
        self.state().embed_branch = embed;
    }

    pub fn add_coupon(&self, code: &str, discount: Colones) {
        self.state().coupons.insert(code.to_string(), discount);
    }

    /// The message sent when an unknown coupon is applied. `None` sends a rejection with no message.
    pub fn set_coupon_rejection(&self, message: Option<&str>) {
        self.state().coupon_rejection = message.map(String::from);
    }

    pub fn add_card(&self, card: StoredCard) {
        self.state().cards.push(card);
    }

    pub fn insert_order(&self, order: Order) {
        self.state().orders.push(order);
    }

    /// Statuses handed out, one per fetch, to whichever order is fetched next.
    pub fn script_statuses<I: IntoIterator<Item = OrderStatus>>(&self, statuses: I) {
        self.state().status_script.extend(statuses);
    }

    pub fn set_live_rate(&self, rate: Option<ExchangeRate>) {
        self.state().live_rate = rate;
    }

    pub fn set_cached_rate(&self, rate: Option<ExchangeRate>) {
        self.state().cached_rate = rate;
    }

    /// The cart as the server currently holds it.
    pub fn server_cart(&self) -> CartSnapshot {
        self.state().snapshot()
    }

    /// The payment method bound to the cart, as it was sent.
    pub fn cart_payment(&self) -> Option<ServerPaymentRef> {
        self.state().payment
    }

    pub fn cards(&self) -> Vec<StoredCard> {
        self.state().cards.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.clone()
    }
}

#[cfg(any(feature = "test_utils", test))]
impl MemoryBackend {
    /// Make every call to `endpoint` fail with `err` until [`Self::heal`] is called.
    pub fn fail(&self, endpoint: Endpoint, err: BackendError) {
        self.state().failures.insert(endpoint, err);
    }

    pub fn heal(&self, endpoint: Endpoint) {
        self.state().failures.remove(&endpoint);
    }

    //------------------------------------------  Inspection  ---------------------------------------------------------
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_mutation()).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

impl CartManagement for MemoryBackend {
    async fn fetch_cart(&self) -> Result<CartSnapshot, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchCart)?;
        Ok(state.snapshot())
    }

    async fn fetch_branch(&self, branch_id: BranchId) -> Result<Branch, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchBranch(branch_id))?;
        state.branch(branch_id).ok_or_else(|| BackendError::NotFound(format!("Branch {branch_id}")))
    }

    async fn add_product(&self, product_id: ProductId, quantity: u32) -> Result<(), BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::AddProduct { product_id, quantity })?;
        if quantity == 0 {
            return Err(BackendError::rejected(400, "La cantidad debe ser mayor a cero"));
        }
        let (name, unit_price) =
            state.menu.get(&product_id).cloned().ok_or_else(|| BackendError::NotFound(format!("Product {product_id}")))?;
        if let Some(line) = state.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += quantity;
            return Ok(());
        }
        let id = LineId(state.next_line_id);
        state.next_line_id += 1;
        state.lines.push(CartLine { id, product_id, name, quantity, unit_price, image_url: None });
        Ok(())
    }

    async fn update_line_quantity(&self, line_id: LineId, quantity: u32) -> Result<(), BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::UpdateLineQuantity { line_id, quantity })?;
        if quantity == 0 {
            return Err(BackendError::rejected(400, "La cantidad debe ser mayor a cero"));
        }
        let line = state
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| BackendError::NotFound(format!("Cart line {line_id}")))?;
        line.quantity = quantity;
        Ok(())
    }

    async fn remove_line(&self, line_id: LineId) -> Result<(), BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::RemoveLine(line_id))?;
        let before = state.lines.len();
        state.lines.retain(|l| l.id != line_id);
        if state.lines.len() == before {
            return Err(BackendError::NotFound(format!("Cart line {line_id}")));
        }
        Ok(())
    }

    async fn select_branch(&self, branch_id: BranchId) -> Result<(), BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::SelectBranch(branch_id))?;
        if state.branch(branch_id).is_none() {
            return Err(BackendError::NotFound(format!("Branch {branch_id}")));
        }
        state.cart_branch = Some(branch_id);
        Ok(())
    }

    async fn set_payment_method(&self, method: &PaymentMethodId) -> Result<(), BackendError> {
        let mut state = self.state();
        let value = method.server_value();
        state.receive(BackendCall::SetPaymentMethod(value))?;
        if let PaymentMethodId::Card(id) = method {
            if !state.cards.iter().any(|c| c.id == *id) {
                return Err(BackendError::rejected(400, "Método de pago no encontrado"));
            }
        }
        state.payment = Some(value);
        Ok(())
    }

    async fn apply_coupon(&self, code: &CouponCode) -> Result<Coupon, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::ApplyCoupon(code.as_str().to_string()))?;
        let Some(discount) = state.coupons.get(code.as_str()).copied() else {
            return Err(BackendError::Rejected { status: 400, message: state.coupon_rejection.clone() });
        };
        let coupon = Coupon { code: code.clone(), discount };
        state.applied_coupon = Some(coupon.clone());
        Ok(coupon)
    }

    async fn remove_coupon(&self) -> Result<(), BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::RemoveCoupon)?;
        state.applied_coupon = None;
        Ok(())
    }
}

impl OrderManagement for MemoryBackend {
    async fn create_order(&self) -> Result<Order, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::CreateOrder)?;
        if state.lines.is_empty() {
            return Err(BackendError::rejected(400, "El carrito está vacío"));
        }
        let Some(branch) = state.cart_branch.and_then(|id| state.branch(id)) else {
            return Err(BackendError::rejected(400, "Debe seleccionar una sucursal"));
        };
        let cart = state.snapshot();
        let order = Order {
            id: OrderId(state.next_order_id),
            status: OrderStatus::Pending,
            total: cart.totals.total,
            branch: Some(branch),
            created_at: Some(Utc::now()),
            estimated_prep_minutes: Some(cart.estimated_prep_minutes),
        };
        state.next_order_id += 1;
        state.lines.clear();
        state.applied_coupon = None;
        state.payment = None;
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchOrder(order_id))?;
        let next_status = state.status_script.pop_front();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| BackendError::NotFound(format!("Order {order_id}")))?;
        if let Some(status) = next_status {
            order.status = status;
        }
        Ok(order.clone())
    }

    async fn fetch_my_orders(&self) -> Result<Vec<Order>, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchMyOrders)?;
        Ok(state.orders.iter().rev().cloned().collect())
    }
}

impl PaymentMethodManagement for MemoryBackend {
    async fn fetch_cards(&self) -> Result<Vec<StoredCard>, BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchCards)?;
        Ok(state.cards.clone())
    }

    async fn delete_card(&self, card_id: CardId) -> Result<(), BackendError> {
        let mut state = self.state();
        state.receive(BackendCall::DeleteCard(card_id))?;
        let before = state.cards.len();
        state.cards.retain(|c| c.id != card_id);
        if state.cards.len() == before {
            return Err(BackendError::NotFound(format!("Card {card_id}")));
        }
        Ok(())
    }
}

impl ExchangeRateSource for MemoryBackend {
    async fn fetch_live_rate(&self) -> Result<ExchangeRate, ExchangeRateError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchLiveRate).map_err(|e| ExchangeRateError::Unavailable(e.to_string()))?;
        state.live_rate.clone().ok_or_else(|| ExchangeRateError::Unavailable("no live rate".into()))
    }

    async fn fetch_cached_rate(&self) -> Result<ExchangeRate, ExchangeRateError> {
        let mut state = self.state();
        state.receive(BackendCall::FetchCachedRate).map_err(|e| ExchangeRateError::Unavailable(e.to_string()))?;
        state.cached_rate.clone().ok_or_else(|| ExchangeRateError::Unavailable("no cached rate".into()))
    }
}
