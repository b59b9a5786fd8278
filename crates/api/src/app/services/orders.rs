use std::cmp::Reverse;

use tracing::{error, info, warn};

use kirana_core::{Aggregate, DomainError, OrderId};
use kirana_infra::{NotificationReport, OrderDraft, PassOutcome, place_order};
use kirana_inventory::{AdjustStock, InventoryCommand, InventoryItem};
use kirana_orders::{
    ChangeStatus, NewOrderLine, OrderCommand, OrderStatus, ReplenishmentOrder, ReviseLines,
};

use super::{AppServices, ServiceResult, load, log_events, remove};
use crate::app::dto::{CreateOrderRequest, OrderLineRequest, UpdateOrderRequest};

/// A manually created order and the supplier emails it triggered.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: ReplenishmentOrder,
    pub notification: Option<NotificationReport>,
}

#[derive(Debug)]
pub struct UpdatedOrder {
    pub order: ReplenishmentOrder,
    /// Set when the update moved the order to Sent.
    pub notification: Option<NotificationReport>,
    /// Items whose stock was received because the order was completed.
    pub restocked: Vec<InventoryItem>,
}

/// An item before and after an order's quantity was received into it.
struct StockReceipt {
    original: InventoryItem,
    received: InventoryItem,
}

impl AppServices {
    /// All orders, newest first, optionally narrowed to one status.
    pub async fn orders_list(&self, status: Option<OrderStatus>) -> ServiceResult<Vec<ReplenishmentOrder>> {
        let mut orders: Vec<_> = self
            .stores
            .orders
            .list()
            .await?
            .into_iter()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .collect();
        orders.sort_by_key(|o| Reverse(o.created_at()));
        Ok(orders)
    }

    pub async fn orders_get(&self, id: OrderId) -> ServiceResult<ReplenishmentOrder> {
        load(self.stores.orders.as_ref(), id, "order").await
    }

    /// Place an order by hand and email the active suppliers about it.
    pub async fn orders_create(&self, req: CreateOrderRequest) -> ServiceResult<PlacedOrder> {
        let draft = OrderDraft {
            lines: self.resolve_lines(req.items).await?,
            status: req.status.unwrap_or(OrderStatus::Pending),
            notes: req.notes.unwrap_or_default(),
        };
        let order = place_order(self.stores.orders.as_ref(), draft, self.now()).await?;
        info!(
            order_number = %order.order_number(),
            total = %order.total_amount(),
            "order created"
        );

        let notification = self.notify(&order).await;
        Ok(PlacedOrder {
            order,
            notification,
        })
    }

    /// Revise lines, status and notes in one go.
    ///
    /// Moving to Sent emails the suppliers. Moving to Completed receives the
    /// ordered quantities into stock. The stock changes are checked before
    /// anything is written, and the order is only saved once its stock is.
    pub async fn orders_update(&self, id: OrderId, update: UpdateOrderRequest) -> ServiceResult<UpdatedOrder> {
        let mut order = self.orders_get(id).await?;
        let previous = order.status();
        let now = self.now();

        if let Some(items) = update.items {
            let lines = self.resolve_lines(items).await?;
            let events = order.execute(&OrderCommand::ReviseLines(ReviseLines {
                order_id: id,
                lines,
                occurred_at: now,
            }))?;
            log_events(&events);
        }

        if update.status.is_some() || update.notes.is_some() {
            let events = order.execute(&OrderCommand::ChangeStatus(ChangeStatus {
                order_id: id,
                status: update.status.unwrap_or(previous),
                notes: update.notes,
                occurred_at: now,
            }))?;
            log_events(&events);
        }

        let completed_now =
            previous != OrderStatus::Completed && order.status() == OrderStatus::Completed;
        let receipts = if completed_now {
            self.receive_stock(&order).await?
        } else {
            Vec::new()
        };

        // Stock first: a Completed order is never saved without its stock.
        self.write_receipts(&order, &receipts).await?;
        if let Err(e) = self.stores.orders.update(order.clone()).await {
            self.roll_back_receipts(&order, &receipts).await;
            return Err(e.into());
        }
        let restocked: Vec<_> = receipts.into_iter().map(|r| r.received).collect();
        if previous != order.status() {
            info!(
                order_number = %order.order_number(),
                from = %previous,
                to = %order.status(),
                "order status changed"
            );
        }

        let notification = if previous != OrderStatus::Sent && order.status() == OrderStatus::Sent {
            self.notify(&order).await
        } else {
            None
        };

        Ok(UpdatedOrder {
            order,
            notification,
            restocked,
        })
    }

    pub async fn orders_delete(&self, id: OrderId) -> ServiceResult<()> {
        remove(self.stores.orders.as_ref(), id, "order").await?;
        info!(order = %id, "order deleted");
        Ok(())
    }

    /// Run one replenishment pass now, sharing the pass lock with the scheduled runner.
    pub async fn orders_auto_create(&self) -> ServiceResult<PassOutcome> {
        Ok(self.reconciler.run_pass().await?)
    }

    /// Fill in missing prices from the items' current prices. Every line must
    /// name an existing item.
    async fn resolve_lines(&self, lines: Vec<OrderLineRequest>) -> ServiceResult<Vec<NewOrderLine>> {
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            let item = self.stores.items.get(line.item_id).await?.ok_or_else(|| {
                DomainError::validation(format!("item {} does not exist", line.item_id))
            })?;
            resolved.push(NewOrderLine {
                item_id: line.item_id,
                quantity: line.quantity,
                price: line.price.unwrap_or(item.price()),
            });
        }
        Ok(resolved)
    }

    /// Apply each line's quantity to its item, without persisting.
    async fn receive_stock(&self, order: &ReplenishmentOrder) -> ServiceResult<Vec<StockReceipt>> {
        let now = self.now();
        let mut receipts = Vec::with_capacity(order.lines().len());
        for line in order.lines() {
            let Some(original) = self.stores.items.get(line.item_id).await? else {
                warn!(
                    order_number = %order.order_number(),
                    item = %line.item_id,
                    "ordered item no longer exists; nothing to restock"
                );
                continue;
            };
            let delta = i64::try_from(line.quantity)
                .map_err(|_| DomainError::validation("ordered quantity out of range"))?;
            let mut received = original.clone();
            received.execute(&InventoryCommand::AdjustStock(AdjustStock {
                item_id: line.item_id,
                delta,
                occurred_at: now,
            }))?;
            receipts.push(StockReceipt { original, received });
        }
        Ok(receipts)
    }

    /// Persist received stock. If one write fails, the items already written
    /// are put back before the error is returned.
    async fn write_receipts(&self, order: &ReplenishmentOrder, receipts: &[StockReceipt]) -> ServiceResult<()> {
        for (written, receipt) in receipts.iter().enumerate() {
            if let Err(e) = self.stores.items.update(receipt.received.clone()).await {
                self.roll_back_receipts(order, &receipts[..written]).await;
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn roll_back_receipts(&self, order: &ReplenishmentOrder, receipts: &[StockReceipt]) {
        for receipt in receipts {
            if let Err(e) = self.stores.items.update(receipt.original.clone()).await {
                error!(
                    order_number = %order.order_number(),
                    item = %receipt.original.id_typed(),
                    error = %e,
                    "could not undo received stock"
                );
            }
        }
    }

    /// Supplier emails never fail the request; a store error while preparing
    /// them is logged and reported as no notification.
    async fn notify(&self, order: &ReplenishmentOrder) -> Option<NotificationReport> {
        match self.notifier.notify_order(order).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(
                    order_number = %order.order_number(),
                    error = %e,
                    "could not notify suppliers"
                );
                None
            }
        }
    }
}
