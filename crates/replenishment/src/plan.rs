use std::collections::HashSet;

use serde::Serialize;

use kirana_core::{ItemId, Money};
use kirana_inventory::InventoryItem;
use kirana_orders::{NewOrderLine, ReplenishmentOrder};

/// One line the reconciler should order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u64,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Already referenced by a Pending order.
    AlreadyPending,
    /// Listed more than once in the input snapshot.
    Duplicate,
    /// Inactive or above its minimum stock.
    NotLowStock,
    /// A line could not be built for this item.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub item_id: ItemId,
    pub name: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of planning one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplenishmentPlan {
    pub lines: Vec<PlannedLine>,
    pub skipped: Vec<SkippedItem>,
}

impl ReplenishmentPlan {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in the shape the order aggregate accepts.
    pub fn order_lines(&self) -> Vec<NewOrderLine> {
        self.lines
            .iter()
            .map(|l| NewOrderLine {
                item_id: l.item_id,
                quantity: l.quantity as i64,
                price: l.price,
            })
            .collect()
    }

    pub fn skipped_for(&self, reason: &SkipReason) -> usize {
        self.skipped.iter().filter(|s| &s.reason == reason).count()
    }
}

/// Build the lines for one reconciliation pass.
///
/// Each low-stock item not referenced by a pending order gets exactly one
/// line for `minimum_stock - quantity` units at its current price. An item
/// sitting exactly on its minimum is ordered with quantity 1.
pub fn plan_replenishment(
    low_stock: &[InventoryItem],
    pending: &[ReplenishmentOrder],
) -> ReplenishmentPlan {
    let already_pending: HashSet<ItemId> = pending
        .iter()
        .filter(|o| o.is_pending())
        .flat_map(|o| o.lines().iter().map(|l| l.item_id))
        .collect();

    let mut queued: HashSet<ItemId> = HashSet::new();
    let mut plan = ReplenishmentPlan::default();

    for item in low_stock {
        let id = item.id_typed();
        let skip = |reason| SkippedItem {
            item_id: id,
            name: item.name().to_string(),
            reason,
        };

        if !item.is_low_stock() {
            plan.skipped.push(skip(SkipReason::NotLowStock));
            continue;
        }
        if already_pending.contains(&id) {
            plan.skipped.push(skip(SkipReason::AlreadyPending));
            continue;
        }
        if queued.contains(&id) {
            plan.skipped.push(skip(SkipReason::Duplicate));
            continue;
        }

        match build_line(item) {
            Ok(line) => {
                queued.insert(id);
                plan.lines.push(line);
            }
            Err(detail) => plan.skipped.push(skip(SkipReason::Invalid(detail))),
        }
    }

    plan
}

fn build_line(item: &InventoryItem) -> Result<PlannedLine, String> {
    let needed = item
        .shortfall()
        .ok_or_else(|| "reorder quantity out of range".to_string())?;
    let quantity = u64::try_from(needed.max(1))
        .map_err(|_| "reorder quantity out of range".to_string())?;

    item.price()
        .checked_mul(quantity)
        .ok_or_else(|| "line total out of range".to_string())?;

    Ok(PlannedLine {
        item_id: item.id_typed(),
        name: item.name().to_string(),
        quantity,
        price: item.price(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use kirana_core::{Aggregate, OrderId};
    use kirana_inventory::{Category, CreateItem, InventoryCommand, ItemPatch, Unit, UpdateItem};
    use kirana_orders::{OrderCommand, OrderStatus, PlaceOrder};

    fn item(name: &str, quantity: i64, minimum_stock: i64, price_minor: u64) -> InventoryItem {
        let id = ItemId::new();
        let mut item = InventoryItem::empty(id);
        item.execute(&InventoryCommand::CreateItem(CreateItem {
            item_id: id,
            name: name.to_string(),
            category: Category::Groceries,
            quantity,
            unit: Unit::Pcs,
            price: Money::from_minor(price_minor),
            minimum_stock,
            supplier: None,
            description: None,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        item
    }

    fn pending_order_for(items: &[&InventoryItem]) -> ReplenishmentOrder {
        let id = OrderId::new();
        let mut order = ReplenishmentOrder::empty(id);
        order
            .execute(&OrderCommand::PlaceOrder(PlaceOrder {
                order_id: id,
                order_number: "ORD1".to_string(),
                lines: items
                    .iter()
                    .map(|i| NewOrderLine {
                        item_id: i.id_typed(),
                        quantity: 1,
                        price: i.price(),
                    })
                    .collect(),
                status: OrderStatus::Pending,
                notes: String::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        order
    }

    #[test]
    fn orders_the_shortfall_at_current_price() {
        let a = item("A", 2, 10, 500);
        let plan = plan_replenishment(&[a.clone()], &[]);

        assert_eq!(plan.lines.len(), 1);
        let line = &plan.lines[0];
        assert_eq!(line.item_id, a.id_typed());
        assert_eq!(line.quantity, 8);
        assert_eq!(line.price, Money::from_minor(500));
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn item_on_its_minimum_is_ordered_with_one_unit() {
        let b = item("B", 10, 10, 100);
        let plan = plan_replenishment(&[b], &[]);
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].quantity, 1);
    }

    #[test]
    fn items_in_pending_orders_are_skipped() {
        let a = item("A", 1, 5, 100);
        let c = item("C", 0, 3, 100);
        let pending = pending_order_for(&[&a]);

        let plan = plan_replenishment(&[a.clone(), c.clone()], &[pending]);

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].item_id, c.id_typed());
        assert_eq!(plan.skipped_for(&SkipReason::AlreadyPending), 1);
    }

    #[test]
    fn non_pending_orders_do_not_block_reordering() {
        let a = item("A", 1, 5, 100);
        let mut sent = pending_order_for(&[&a]);
        sent.execute(&OrderCommand::ChangeStatus(kirana_orders::ChangeStatus {
            order_id: sent.id_typed(),
            status: OrderStatus::Sent,
            notes: None,
            occurred_at: Utc::now(),
        }))
        .unwrap();

        let plan = plan_replenishment(&[a], &[sent]);
        assert_eq!(plan.lines.len(), 1);
    }

    #[test]
    fn duplicates_and_stocked_items_are_reported() {
        let a = item("A", 1, 5, 100);
        let full = item("Full", 50, 5, 100);
        let mut inactive = item("Gone", 0, 5, 100);
        inactive
            .execute(&InventoryCommand::UpdateItem(UpdateItem {
                item_id: inactive.id_typed(),
                patch: ItemPatch {
                    is_active: Some(false),
                    ..ItemPatch::default()
                },
                occurred_at: Utc::now(),
            }))
            .unwrap();

        let plan = plan_replenishment(&[a.clone(), a, full, inactive], &[]);
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.skipped_for(&SkipReason::Duplicate), 1);
        assert_eq!(plan.skipped_for(&SkipReason::NotLowStock), 2);
    }

    #[test]
    fn unbuildable_line_is_skipped_without_dropping_the_rest() {
        let huge = item("Huge", 0, i64::MAX, u64::MAX);
        let ok = item("Ok", 0, 2, 100);
        let plan = plan_replenishment(&[huge, ok.clone()], &[]);

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].item_id, ok.id_typed());
        assert!(matches!(plan.skipped[0].reason, SkipReason::Invalid(_)));
    }

    #[test]
    fn empty_input_gives_empty_plan() {
        let plan = plan_replenishment(&[], &[]);
        assert!(plan.is_empty());
        assert!(plan.order_lines().is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every low-stock item outside a pending order yields exactly one
            /// line with max(minimum - quantity, 1) units; pending items yield none.
            #[test]
            fn one_line_per_uncovered_low_stock_item(
                stock in prop::collection::vec((0i64..500, 0i64..500, any::<bool>()), 0..20),
            ) {
                let items: Vec<InventoryItem> = stock
                    .iter()
                    .enumerate()
                    .map(|(i, (q, m, _))| item(&format!("item-{i}"), *q, *m, 100))
                    .collect();
                let covered: Vec<&InventoryItem> = items
                    .iter()
                    .zip(stock.iter())
                    .filter(|(_, (_, _, pending))| *pending)
                    .map(|(i, _)| i)
                    .collect();
                let pending = if covered.is_empty() {
                    vec![]
                } else {
                    vec![pending_order_for(&covered)]
                };

                let plan = plan_replenishment(&items, &pending);

                for (it, (q, m, is_pending)) in items.iter().zip(stock.iter()) {
                    let lines: Vec<&PlannedLine> =
                        plan.lines.iter().filter(|l| l.item_id == it.id_typed()).collect();
                    if q <= m && !is_pending {
                        prop_assert_eq!(lines.len(), 1);
                        prop_assert_eq!(lines[0].quantity, (m - q).max(1) as u64);
                    } else {
                        prop_assert!(lines.is_empty());
                    }
                }
            }
        }
    }
}
