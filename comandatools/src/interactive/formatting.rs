use std::fmt::Write;

use chrono::Local;
use comanda_engine::{
    cart_types::{CartSession, Order},
    checkout_objects::CheckoutSummary,
    exchange_objects::{ExchangeRate, RateSource},
    payment_objects::PaymentMethod,
    CurrencyDisplay,
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_cart(cart: &CartSession, display: &CurrencyDisplay) -> String {
    if cart.is_empty() {
        return "Your cart is empty".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Line", "Product", "Qty", "Unit price", "Total"]);
    cart.lines.iter().for_each(|line| {
        table.add_row(row![
            line.id,
            line.name,
            r->line.quantity,
            r->display.format(line.unit_price),
            r->display.format(line.line_total())
        ]);
    });
    markdown_style(&mut table);
    let mut f = format!("{table}\n");
    let totals = &cart.totals;
    let _ = writeln!(f, "Subtotal:  {:>14}", display.format(totals.subtotal));
    if let Some(coupon) = &cart.coupon {
        let _ = writeln!(f, "Coupon {}: -{}", coupon.code, display.format(totals.discount));
    }
    let _ = writeln!(f, "Tax (13%): {:>14}", display.format(totals.tax));
    let _ = writeln!(f, "Total:     {:>14}", display.format(totals.total));
    match &cart.branch {
        Some(branch) => {
            let _ = writeln!(f, "Pickup at {branch}");
        },
        None => {
            let _ = writeln!(f, "No pickup branch selected");
        },
    }
    if cart.estimated_prep_minutes > 0 {
        let _ = writeln!(f, "Ready in about {} minutes", cart.estimated_prep_minutes);
    }
    f
}

pub fn format_checkout_summary(summary: &CheckoutSummary, display: &CurrencyDisplay) -> String {
    let mut f = String::new();
    let _ = writeln!(f, "===============================================================================");
    let _ = writeln!(f, "Checkout");
    let _ = writeln!(f, "===============================================================================");
    f.push_str(&format_cart(&summary.cart, display));
    match &summary.payment {
        Some(method) => {
            let _ = writeln!(f, "Paying with {method}");
        },
        None => {
            let _ = writeln!(f, "No payment method chosen yet. You can pay at the counter.");
        },
    }
    f
}

pub fn format_order(order: &Order, display: &CurrencyDisplay) -> String {
    let mut f = String::new();
    let _ = writeln!(f, "Order {}: {}", order.id, order.status);
    let _ = writeln!(f, "Total: {}", display.format(order.total));
    if let Some(branch) = &order.branch {
        let _ = writeln!(f, "Pickup at {branch}");
    }
    if let Some(created_at) = order.created_at {
        let _ = writeln!(f, "Placed {}", created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    if let Some(minutes) = order.estimated_prep_minutes {
        let _ = writeln!(f, "Estimated preparation: {minutes} minutes");
    }
    f
}

pub fn format_orders(orders: &[Order], display: &CurrencyDisplay) -> String {
    if orders.is_empty() {
        return "No orders yet".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Order", "Status", "Total", "Branch", "Placed"]);
    orders.iter().for_each(|order| {
        table.add_row(row![
            order.id,
            order.status,
            r->display.format(order.total),
            order.branch.as_ref().map(|b| b.name.as_str()).unwrap_or_default(),
            order.created_at.map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_payment_methods(methods: &[PaymentMethod], selected: Option<&PaymentMethod>) -> String {
    let mut table = Table::new();
    table.set_titles(row!["", "Id", "Method"]);
    methods.iter().for_each(|method| {
        let marker = if Some(method) == selected { "*" } else { "" };
        table.add_row(row![marker, method.id, method]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_exchange_rate(rate: Option<&ExchangeRate>) -> String {
    match rate {
        Some(rate) if rate.source == RateSource::Cached => {
            format!("{rate}\nThe live rate is unavailable. Showing the last known rate.")
        },
        Some(rate) => rate.to_string(),
        None => "No exchange rate is available. Prices are shown in colones only.".to_string(),
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use comanda_common::Colones;
    use comanda_engine::{
        cart_types::{CartLine, CartTotals, LineId, OrderId, OrderStatus, ProductId},
        exchange_objects::ExchangeRate,
    };

    use super::*;

    fn cart() -> CartSession {
        CartSession {
            lines: vec![CartLine {
                id: LineId(1),
                product_id: ProductId(3),
                name: "Casado".into(),
                quantity: 2,
                unit_price: Colones::from(5_000),
                image_url: None,
            }],
            totals: CartTotals::compute(Colones::from(10_000), Colones::ZERO),
            ..Default::default()
        }
    }

    #[test]
    fn cart_in_colones_and_dollars() {
        let mut display = CurrencyDisplay::new(None);
        let text = format_cart(&cart(), &display);
        assert!(text.contains("₡10,000"));
        assert!(text.contains("₡11,300"));
        assert!(text.contains("No pickup branch selected"));

        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let rate = ExchangeRate::new(510.0, 520.5, date, RateSource::Primary).unwrap();
        display = CurrencyDisplay::new(Some(rate));
        display.toggle();
        assert!(format_cart(&cart(), &display).contains("$19.21"));
    }

    #[test]
    fn empty_lists() {
        let display = CurrencyDisplay::default();
        assert_eq!(format_cart(&CartSession::default(), &display), "Your cart is empty");
        assert_eq!(format_orders(&[], &display), "No orders yet");
        let order = Order::new(OrderId(1001), OrderStatus::Ready, Colones::from(9_300));
        assert!(format_order(&order, &display).starts_with("Order #1001: Ready for pickup"));
    }

    #[test]
    fn selected_method_is_marked() {
        let methods = vec![PaymentMethod::cash()];
        let text = format_payment_methods(&methods, Some(&PaymentMethod::cash()));
        assert!(text.contains('*'));
        assert!(text.contains("Cash"));
    }

    #[test]
    fn missing_rates() {
        assert!(format_exchange_rate(None).contains("colones only"));
    }
}
