//! Placing replenishment orders with generated order numbers.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use kirana_core::{Aggregate, DomainError, OrderId, generate_reference};
use kirana_orders::{NewOrderLine, OrderCommand, OrderStatus, PlaceOrder, ReplenishmentOrder};

use crate::store::{DocumentStore, StoreError};

const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Attempts at finding a free order number before giving up.
pub const MAX_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no free order number after {0} attempts")]
    NumbersExhausted(u32),
}

#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub lines: Vec<NewOrderLine>,
    pub status: OrderStatus,
    pub notes: String,
}

/// Validate and persist a new order, retrying with a fresh number on collision.
pub async fn place_order(
    orders: &dyn DocumentStore<ReplenishmentOrder>,
    draft: OrderDraft,
    at: DateTime<Utc>,
) -> Result<ReplenishmentOrder, PlacementError> {
    for attempt in 1..=MAX_NUMBER_ATTEMPTS {
        let order_id = OrderId::new();
        let mut order = ReplenishmentOrder::empty(order_id);
        order.execute(&OrderCommand::PlaceOrder(PlaceOrder {
            order_id,
            order_number: generate_reference(ORDER_NUMBER_PREFIX, at),
            lines: draft.lines.clone(),
            status: draft.status,
            notes: draft.notes.clone(),
            occurred_at: at,
        }))?;

        match orders.insert(order.clone()).await {
            Ok(()) => {
                debug!(order_number = %order.order_number(), attempt, "order persisted");
                return Ok(order);
            }
            Err(StoreError::Conflict {
                field: "order_number",
                value,
                ..
            }) => {
                warn!(order_number = %value, attempt, "order number already taken; retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(PlacementError::NumbersExhausted(MAX_NUMBER_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;

    use kirana_core::{ItemId, Money};

    use crate::store::InMemoryDocumentStore;

    fn draft(quantity: i64) -> OrderDraft {
        OrderDraft {
            lines: vec![NewOrderLine {
                item_id: ItemId::new(),
                quantity,
                price: Money::from_major(5),
            }],
            status: OrderStatus::Pending,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn persists_order_with_generated_number() {
        let store = InMemoryDocumentStore::<ReplenishmentOrder>::new();
        let order = place_order(&store, draft(8), Utc::now()).await.unwrap();

        assert!(order.order_number().starts_with("ORD"));
        assert_eq!(order.total_amount(), Money::from_major(40));
        assert_eq!(store.get(order.id_typed()).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn invalid_lines_are_not_persisted() {
        let store = InMemoryDocumentStore::<ReplenishmentOrder>::new();
        let err = place_order(&store, draft(0), Utc::now()).await.unwrap_err();
        assert!(matches!(err, PlacementError::Domain(DomainError::Validation(_))));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_instant_orders_get_distinct_numbers() {
        let store = InMemoryDocumentStore::<ReplenishmentOrder>::new();
        let at = Utc::now();
        for _ in 0..20 {
            place_order(&store, draft(1), at).await.unwrap();
        }
        let mut numbers: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|o| o.order_number().to_string())
            .collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 20);
    }
}
