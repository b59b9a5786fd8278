use std::fmt::Write as _;

use serde::Serialize;

use kirana_inventory::{Category, Unit};
use kirana_orders::ReplenishmentOrder;

/// Item details printed for one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeLine {
    pub name: String,
    pub category: Category,
    pub unit: Unit,
    pub quantity: u64,
}

/// Plain-text message announcing an order to suppliers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderNotice {
    pub subject: String,
    pub body: String,
}

pub fn compose_order_notice(
    order: &ReplenishmentOrder,
    lines: &[NoticeLine],
    signature: &str,
) -> OrderNotice {
    let subject = format!("New Order Notification - Order ID: {}", order.order_number());

    let mut body = String::new();
    body.push_str("Dear Supplier,\n\n");
    body.push_str(
        "A new order has been placed with our store. Kindly find the details below:\n\n",
    );
    let _ = writeln!(body, "Order ID     : {}", order.order_number());
    body.push_str("----------------------------\n");
    for line in lines {
        let _ = writeln!(body, "• Item Name  : {}", line.name);
        let _ = writeln!(body, "  Category   : {}", line.category.as_str());
        let _ = writeln!(body, "  Unit       : {}", line.unit.as_str());
        let _ = writeln!(body, "  Quantity   : {}", line.quantity);
    }
    body.push_str("----------------------------\n");
    let _ = writeln!(body, "Total Amount : ₹{}", order.total_amount());
    if !order.notes().is_empty() {
        let _ = writeln!(body, "Notes        : {}", order.notes());
    }
    body.push_str(
        "\nWe kindly request you to process this order at the earliest convenience.\n\n",
    );
    body.push_str("Best regards,\n");
    body.push_str(signature.trim());
    body.push('\n');

    OrderNotice { subject, body }
}
