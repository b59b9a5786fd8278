//! Replenishment orders (purchase orders sent to suppliers).
//!
//! This crate contains business rules for replenishment orders, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;

pub use order::{
    ChangeStatus, LinesRevised, NewOrderLine, OrderCommand, OrderEvent, OrderLine, OrderPlaced,
    OrderStatus, PlaceOrder, ReplenishmentOrder, ReviseLines, StatusChanged, order_total,
};
