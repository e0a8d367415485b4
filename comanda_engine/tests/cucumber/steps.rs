use chrono::NaiveDate;
use comanda_common::Colones;
use comanda_engine::{
    cart_types::{CardId, CouponCode, OrderId},
    checkout_objects::{CheckoutStep, Navigation},
    exchange_objects::{ExchangeRate, RateSource},
    memory::{BackendCall, ScriptedPrompt},
    payment_objects::{PaymentMethod, PaymentMethodId, ServerPaymentRef, StoredCard},
    traits::SelectionStore,
    CheckoutApi,
    ExchangeRateApi,
};
use cucumber::{given, then, when};
use serde_json::json;

use crate::cucumber::ComandaWorld;

//------------------------------------------   Given   ----------------------------------------------------------------
#[given(expr = "a menu with {string} at {int} colones and {string} at {int} colones")]
async fn menu(world: &mut ComandaWorld, first: String, first_price: i64, second: String, second_price: i64) {
    world.add_product(&first, first_price);
    world.add_product(&second, second_price);
}

#[given(expr = "the pickup branch {string} in {string}")]
async fn pickup_branch(world: &mut ComandaWorld, name: String, province: String) {
    world.add_branch(&name, &province);
}

#[given(expr = "my cart has {int} {string}")]
async fn cart_has(world: &mut ComandaWorld, quantity: u32, name: String) {
    let id = world.product(&name);
    world.backend.put_line(id, quantity);
}

#[given(expr = "my cart has {int} {string} and {int} {string}")]
async fn cart_has_two(world: &mut ComandaWorld, q1: u32, first: String, q2: u32, second: String) {
    cart_has(world, q1, first).await;
    cart_has(world, q2, second).await;
}

#[given(expr = "the coupon {string} is worth {int} colones")]
async fn coupon_exists(world: &mut ComandaWorld, code: String, discount: i64) {
    world.backend.add_coupon(&code, Colones::from(discount));
}

#[given(expr = "the cart is for pickup at {string}")]
async fn cart_branch(world: &mut ComandaWorld, name: String) {
    let id = world.branch(&name);
    world.backend.set_cart_branch(Some(id));
}

#[given("I chose to pay in cash")]
async fn chose_cash(world: &mut ComandaWorld) {
    world.store.save_selection(&PaymentMethod::cash()).unwrap();
}

#[given(expr = "I have a stored {string} card ending in {string} marked as principal")]
async fn stored_card(world: &mut ComandaWorld, brand: String, last_four: String) {
    world.backend.add_card(StoredCard {
        id: CardId(100 + world.backend.cards().len() as i64),
        brand,
        last_four_digits: last_four,
        alias: None,
        principal: true,
    });
}

#[given(expr = "the live exchange rate sells at {float}")]
async fn live_rate(world: &mut ComandaWorld, sell: f64) {
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    world.backend.set_live_rate(Some(ExchangeRate::new(sell - 10.0, sell, date, RateSource::Primary).unwrap()));
}

#[given("no exchange rate is available")]
async fn no_rate(world: &mut ComandaWorld) {
    world.backend.set_live_rate(None);
    world.backend.set_cached_rate(None);
}

//------------------------------------------   When   -----------------------------------------------------------------
#[when("I load the cart")]
async fn load_cart(world: &mut ComandaWorld) {
    let result = world.cart.load().await;
    world.last_cart = world.record(result);
    world.backend.clear_calls();
}

#[when(expr = "I apply the coupon {string}")]
async fn apply_coupon(world: &mut ComandaWorld, code: String) {
    let result = world.cart.apply_coupon(&code).await;
    if let Some(cart) = world.record(result) {
        world.last_cart = Some(cart);
    }
}

#[when(expr = "I decrement {string}")]
async fn decrement(world: &mut ComandaWorld, name: String) {
    let cart = world.current_cart().await;
    let product = world.product(&name);
    let line = cart.lines.iter().find(|l| l.product_id == product).expect("Product is not in the cart");
    let result = world.cart.decrement_line(line.id, line.quantity).await;
    if let Some(cart) = world.record(result).and_then(|u| u.cart().cloned()) {
        world.last_cart = Some(cart);
    }
}

#[when(expr = "I remove {string} and confirm")]
async fn remove_line(world: &mut ComandaWorld, name: String) {
    let cart = world.current_cart().await;
    let product = world.product(&name);
    let line = cart.lines.iter().find(|l| l.product_id == product).expect("Product is not in the cart");
    let result = world.cart.remove_line(line.id, &ScriptedPrompt::answering([true])).await;
    if let Some(cart) = world.record(result).and_then(|u| u.cart().cloned()) {
        world.last_cart = Some(cart);
    }
}

#[when("I go to checkout")]
async fn go_to_checkout(world: &mut ComandaWorld) {
    let checkout = CheckoutApi::new(world.backend.clone(), world.store.clone());
    let result = checkout.enter().await;
    world.last_step = world.record(result);
    world.checkout = Some(checkout);
}

#[when("I confirm the order")]
async fn confirm_order(world: &mut ComandaWorld) {
    let checkout = world.checkout.take().expect("Checkout was not entered");
    let result = checkout.confirm(&ScriptedPrompt::answering([true])).await;
    world.last_step = world.record(result);
    world.checkout = Some(checkout);
}

#[when("I open the payment methods")]
async fn open_payments(world: &mut ComandaWorld) {
    let result = world.payments.load().await;
    world.record(result);
}

#[when("I select cash and confirm")]
async fn select_cash(world: &mut ComandaWorld) {
    world.payments.select(PaymentMethodId::Cash).await.unwrap();
    let result = world.payments.confirm().await;
    world.record(result);
}

#[when("I fetch the exchange rate")]
async fn fetch_rate(world: &mut ComandaWorld) {
    world.display = ExchangeRateApi::new(world.backend.clone()).currency_display().await;
}

#[when("I switch to dollars")]
async fn switch_to_dollars(world: &mut ComandaWorld) {
    world.display.toggle();
}

//------------------------------------------   Then   -----------------------------------------------------------------
#[then(expr = "the coupon {string} was sent to the server")]
async fn coupon_sent(world: &mut ComandaWorld, code: String) {
    assert!(world.backend.calls().contains(&BackendCall::ApplyCoupon(code.clone())));
    assert_eq!(CouponCode::parse(&code).unwrap().as_str(), code);
}

#[then(expr = "the subtotal is {int} colones")]
async fn subtotal_is(world: &mut ComandaWorld, amount: i64) {
    assert_eq!(world.current_cart().await.totals.subtotal, Colones::from(amount));
}

#[then(expr = "the tax is {int} colones")]
async fn tax_is(world: &mut ComandaWorld, amount: i64) {
    assert_eq!(world.current_cart().await.totals.tax, Colones::from(amount));
}

#[then(expr = "the total is {int} colones")]
async fn total_is(world: &mut ComandaWorld, amount: i64) {
    let totals = world.current_cart().await.totals;
    assert_eq!(totals.total, Colones::from(amount));
    assert!(totals.is_consistent());
}

#[then("no change was sent to the server")]
async fn nothing_sent(world: &mut ComandaWorld) {
    assert_eq!(world.backend.mutation_count(), 0, "Unexpected calls: {:?}", world.backend.calls());
}

#[then(expr = "the cart has {int} {string}")]
async fn cart_line_quantity(world: &mut ComandaWorld, quantity: u32, name: String) {
    let product = world.product(&name);
    let cart = world.current_cart().await;
    let line = cart.lines.iter().find(|l| l.product_id == product).expect("Product is not in the cart");
    assert_eq!(line.quantity, quantity);
}

#[then("the cart is empty")]
async fn cart_is_empty(world: &mut ComandaWorld) {
    if let Some(cart) = &world.last_cart {
        assert!(cart.lines.is_empty());
    }
    assert!(world.backend.server_cart().lines.is_empty());
}

#[then("the pay action is unavailable")]
async fn pay_unavailable(world: &mut ComandaWorld) {
    assert!(!world.current_cart().await.is_payable());
}

#[then(expr = "I see the error {string}")]
async fn error_is(world: &mut ComandaWorld, message: String) {
    let err = world.last_error.as_ref().expect("No error was reported");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "I am sent back to the cart with the message {string}")]
async fn back_to_cart(world: &mut ComandaWorld, message: String) {
    let expected = CheckoutStep::Redirect(Navigation::Cart { message });
    assert_eq!(world.last_step.as_ref(), Some(&expected));
}

#[then("I am sent home")]
async fn sent_home(world: &mut ComandaWorld) {
    assert!(matches!(world.last_step, Some(CheckoutStep::Redirect(Navigation::Home { .. }))));
}

#[then("no order was created")]
async fn no_order(world: &mut ComandaWorld) {
    assert!(!world.backend.calls().contains(&BackendCall::CreateOrder));
    assert!(world.backend.orders().is_empty());
}

#[then(expr = "checkout is ready with a total of {int} colones")]
async fn checkout_ready(world: &mut ComandaWorld, total: i64) {
    match &world.last_step {
        Some(CheckoutStep::Ready(summary)) => assert_eq!(summary.cart.totals.total, Colones::from(total)),
        other => panic!("Checkout is not ready: {other:?}"),
    }
}

#[then(expr = "I am sent to track order {int}")]
async fn tracking(world: &mut ComandaWorld, id: i64) {
    assert_eq!(world.last_step, Some(CheckoutStep::Redirect(Navigation::OrderTracking(OrderId(id)))));
}

#[then("my saved payment method is cleared")]
async fn selection_cleared(world: &mut ComandaWorld) {
    assert!(world.store.current().is_none());
}

#[then(expr = "{string} is selected")]
async fn is_selected(world: &mut ComandaWorld, label: String) {
    let selected = world.payments.selected().await.expect("Nothing is selected");
    assert_eq!(selected.to_string(), label);
}

#[then(expr = "the server was sent {string}")]
async fn server_was_sent(world: &mut ComandaWorld, value: String) {
    match world.backend.cart_payment() {
        Some(ServerPaymentRef::Sentinel(sent)) => assert_eq!(sent, value),
        other => panic!("Expected the {value} sentinel but the server got {other:?}"),
    }
}

#[then("my saved payment method is cash")]
async fn saved_cash(world: &mut ComandaWorld) {
    let saved = world.store.current().expect("Nothing was saved");
    assert_eq!(serde_json::to_value(saved).unwrap(), json!({ "id": "cash", "type": "efectivo" }));
}

#[then(expr = "{int} colones is shown as {string}")]
async fn shown_as(world: &mut ComandaWorld, amount: i64, expected: String) {
    assert_eq!(world.display.format(Colones::from(amount)), expected);
}

#[then("the dollar toggle is unavailable")]
async fn toggle_unavailable(world: &mut ComandaWorld) {
    assert!(!world.display.toggle_available());
}
