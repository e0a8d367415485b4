//! Interactive menu options.
//!
//! Commands must be unique across all menus. If the same name is used in multiple menus, the same function will be
//! called for each menu that contains the command.
pub type Menu = (&'static str, &'static [&'static str]);

// Command aliases. Keep this list in alphabetical order.
pub mod commands {
    pub const ADD_PRODUCT: &str = "Add product";
    pub const APPLY_COUPON: &str = "Apply coupon";
    pub const CHECKOUT: &str = "Checkout";
    pub const CHOOSE_PAYMENT: &str = "Choose payment method";
    pub const DECREMENT: &str = "Remove one unit";
    pub const EXIT: &str = "Exit";
    pub const EXCHANGE_RATE: &str = "Exchange rate";
    pub const INCREMENT: &str = "Add one unit";
    pub const LOGIN: &str = "Login";
    pub const LOGOUT: &str = "Logout";
    pub const MY_ORDERS: &str = "My orders";
    pub const NAV_BACK: &str = "Back";
    pub const NAV_TO_CART_MENU: &str = "Cart";
    pub const NAV_TO_ORDERS_MENU: &str = "Orders";
    pub const NAV_TO_PAYMENT_MENU: &str = "Payment methods";
    pub const REMOVE_CARD: &str = "Remove card";
    pub const REMOVE_COUPON: &str = "Remove coupon";
    pub const REMOVE_ITEM: &str = "Remove item";
    pub const SELECT_BRANCH: &str = "Select pickup branch";
    pub const TOGGLE_CURRENCY: &str = "Toggle CRC/USD";
    pub const TRACK_ORDER: &str = "Track order";
    pub const VIEW_CART: &str = "View cart";
    pub const VIEW_PAYMENTS: &str = "View payment methods";
}

pub use commands::*;

pub const TOP_MENU: [&str; 9] = [
    NAV_TO_CART_MENU,
    CHECKOUT,
    NAV_TO_PAYMENT_MENU,
    NAV_TO_ORDERS_MENU,
    EXCHANGE_RATE,
    TOGGLE_CURRENCY,
    LOGIN,
    LOGOUT,
    EXIT,
];

pub const CART_MENU: [&str; 11] = [
    VIEW_CART,
    ADD_PRODUCT,
    INCREMENT,
    DECREMENT,
    REMOVE_ITEM,
    APPLY_COUPON,
    REMOVE_COUPON,
    SELECT_BRANCH,
    CHECKOUT,
    NAV_BACK,
    EXIT,
];

pub const PAYMENT_MENU: [&str; 5] = [VIEW_PAYMENTS, CHOOSE_PAYMENT, REMOVE_CARD, NAV_BACK, EXIT];

pub const ORDERS_MENU: [&str; 4] = [MY_ORDERS, TRACK_ORDER, NAV_BACK, EXIT];

pub fn top_menu() -> &'static Menu {
    &("Main", &TOP_MENU)
}

pub fn cart_menu() -> &'static Menu {
    &("Cart", &CART_MENU)
}

pub fn payment_menu() -> &'static Menu {
    &("Payment", &PAYMENT_MENU)
}

pub fn orders_menu() -> &'static Menu {
    &("Orders", &ORDERS_MENU)
}
