use serde::Deserialize;
use serde_json::{Value, json};

use kirana_core::{ItemId, Money};
use kirana_infra::NotificationReport;
use kirana_inventory::{Category, InventoryItem, SupplierContact, Unit};
use kirana_orders::{OrderStatus, ReplenishmentOrder};
use kirana_parties::{Customer, Staff, Supplier};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: Category,
    pub quantity: i64,
    pub unit: Unit,
    pub price: Money,
    pub minimum_stock: i64,
    #[serde(default)]
    pub supplier: Option<SupplierContact>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

/// One requested line. Without a price the item's current price is used.
#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<Money>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<OrderLineRequest>>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &InventoryItem) -> Value {
    json!({
        "id": item.id_typed().to_string(),
        "name": item.name(),
        "category": item.category(),
        "quantity": item.quantity(),
        "unit": item.unit(),
        "price": item.price(),
        "minimum_stock": item.minimum_stock(),
        "supplier": item.supplier(),
        "description": item.description(),
        "is_active": item.is_active(),
        "is_low_stock": item.is_low_stock(),
        "created_at": item.created_at().to_rfc3339(),
        "last_updated": item.last_updated().to_rfc3339(),
    })
}

pub fn order_to_json(order: &ReplenishmentOrder) -> Value {
    json!({
        "id": order.id_typed().to_string(),
        "order_number": order.order_number(),
        "items": order.lines().iter().map(|l| json!({
            "item_id": l.item_id.to_string(),
            "quantity": l.quantity,
            "price": l.price,
        })).collect::<Vec<_>>(),
        "total_amount": order.total_amount(),
        "status": order.status(),
        "notes": order.notes(),
        "created_at": order.created_at().to_rfc3339(),
        "updated_at": order.updated_at().to_rfc3339(),
    })
}

/// Order plus the supplier emails sent for it, when any were attempted.
pub fn order_with_notification(order: &ReplenishmentOrder, report: Option<&NotificationReport>) -> Value {
    let mut body = order_to_json(order);
    body["notification"] = json!(report);
    body
}

pub fn supplier_to_json(supplier: &Supplier) -> Value {
    json!({
        "id": supplier.id_typed().to_string(),
        "name": supplier.name(),
        "email": supplier.email(),
        "phone": supplier.phone(),
        "branch": supplier.branch(),
        "address": supplier.address(),
        "is_active": supplier.is_active(),
        "created_at": supplier.created_at().to_rfc3339(),
        "last_updated": supplier.last_updated().to_rfc3339(),
    })
}

pub fn staff_to_json(member: &Staff) -> Value {
    json!({
        "id": member.id_typed().to_string(),
        "staff_code": member.staff_code(),
        "name": member.name(),
        "email": member.email(),
        "role": member.role(),
        "phone": member.phone(),
        "address": member.address(),
        "is_active": member.is_active(),
        "created_at": member.created_at().to_rfc3339(),
        "updated_at": member.updated_at().to_rfc3339(),
    })
}

/// Customer with a summary of the assigned staff member (null when that record is gone).
pub fn customer_to_json(customer: &Customer, assigned: Option<&Staff>) -> Value {
    json!({
        "id": customer.id_typed().to_string(),
        "token_number": customer.token_number(),
        "name": customer.name(),
        "email": customer.email(),
        "phone": customer.phone(),
        "address": customer.address(),
        "assigned_staff": assigned.map(|s| json!({
            "id": s.id_typed().to_string(),
            "staff_code": s.staff_code(),
            "name": s.name(),
            "role": s.role(),
        })),
        "assigned_staff_id": customer.assigned_staff().to_string(),
        "is_active": customer.is_active(),
        "notes": customer.notes(),
        "created_at": customer.created_at().to_rfc3339(),
        "updated_at": customer.updated_at().to_rfc3339(),
    })
}
