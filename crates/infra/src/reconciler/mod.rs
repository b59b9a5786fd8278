//! Replenishment reconciler.
//!
//! One pass turns the current low-stock items into at most one consolidated
//! Pending order. Passes are driven by a [`Ticker`] through the
//! [`ReplenishmentRunner`], or run on demand by the HTTP layer.

pub mod runner;
pub mod ticker;

pub use runner::{ReplenishmentRunner, ReplenishmentRunnerHandle};
pub use ticker::{IntervalTicker, ManualTicker, ManualTickerHandle, Ticker};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use kirana_core::{Clock, DomainError};
use kirana_orders::{OrderStatus, ReplenishmentOrder};
use kirana_replenishment::{SkipReason, SkippedItem, plan_replenishment};

use crate::mail::{NotificationReport, SupplierNotifier};
use crate::placement::{OrderDraft, PlacementError, place_order};
use crate::store::{StoreError, Stores};

pub const AUTO_ORDER_NOTES: &str = "Automatic order created for low stock items";

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Email active suppliers after an automatic order is created.
    pub notify_suppliers: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            notify_suppliers: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    NoLowStock,
    NothingToOrder {
        skipped: Vec<SkippedItem>,
    },
    OrderCreated {
        order: ReplenishmentOrder,
        skipped: Vec<SkippedItem>,
        notification: Option<NotificationReport>,
    },
}

impl PassOutcome {
    pub fn created_order(&self) -> Option<&ReplenishmentOrder> {
        match self {
            PassOutcome::OrderCreated { order, .. } => Some(order),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to load {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to build replenishment order: {0}")]
    Domain(#[from] DomainError),

    #[error("failed to persist replenishment order: {0}")]
    Persist(#[source] StoreError),

    #[error("could not place replenishment order: {0}")]
    Placement(String),
}

impl From<PlacementError> for ReconcileError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::Domain(e) => ReconcileError::Domain(e),
            PlacementError::Store(e) => ReconcileError::Persist(e),
            other => ReconcileError::Placement(other.to_string()),
        }
    }
}

fn fetch(what: &'static str) -> impl FnOnce(StoreError) -> ReconcileError {
    move |source| ReconcileError::Fetch { what, source }
}

pub struct Reconciler {
    stores: Stores,
    notifier: SupplierNotifier,
    clock: Arc<dyn Clock>,
    config: ReconcilerConfig,
    pass_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        stores: Stores,
        notifier: SupplierNotifier,
        clock: Arc<dyn Clock>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            stores,
            notifier,
            clock,
            config,
            pass_lock: Mutex::new(()),
        }
    }

    /// Run one reconciliation pass. Passes on the same reconciler never overlap.
    pub async fn run_pass(&self) -> Result<PassOutcome, ReconcileError> {
        let _pass = self.pass_lock.lock().await;
        let result = self.reconcile().await;
        if let Err(e) = &result {
            error!(error = %e, "replenishment pass aborted");
        }
        result
    }

    async fn reconcile(&self) -> Result<PassOutcome, ReconcileError> {
        let mut low_stock: Vec<_> = self
            .stores
            .items
            .list()
            .await
            .map_err(fetch("inventory"))?
            .into_iter()
            .filter(|item| item.is_low_stock())
            .collect();

        if low_stock.is_empty() {
            info!("no low stock items");
            return Ok(PassOutcome::NoLowStock);
        }
        low_stock.sort_by(|a, b| a.name().cmp(b.name()));

        let pending: Vec<_> = self
            .stores
            .orders
            .list()
            .await
            .map_err(fetch("pending orders"))?
            .into_iter()
            .filter(|order| order.is_pending())
            .collect();

        let plan = plan_replenishment(&low_stock, &pending);
        for skipped in &plan.skipped {
            if let SkipReason::Invalid(detail) = &skipped.reason {
                warn!(item = %skipped.item_id, name = %skipped.name, %detail, "skipping item");
            }
        }

        if plan.is_empty() {
            info!(
                low_stock = low_stock.len(),
                already_pending = plan.skipped_for(&SkipReason::AlreadyPending),
                "all low stock items already have pending orders"
            );
            return Ok(PassOutcome::NothingToOrder {
                skipped: plan.skipped,
            });
        }

        let order = place_order(
            self.stores.orders.as_ref(),
            OrderDraft {
                lines: plan.order_lines(),
                status: OrderStatus::Pending,
                notes: AUTO_ORDER_NOTES.to_string(),
            },
            self.clock.now(),
        )
        .await?;

        info!(
            order_number = %order.order_number(),
            lines = order.lines().len(),
            total = %order.total_amount(),
            "created automatic replenishment order"
        );

        let notification = if self.config.notify_suppliers {
            match self.notifier.notify_order(&order).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(order_number = %order.order_number(), error = %e, "supplier notification failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(PassOutcome::OrderCreated {
            order,
            skipped: plan.skipped,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use kirana_core::{Aggregate, FixedClock, ItemId, Money, SupplierId};
    use kirana_inventory::{
        AdjustStock, Category, CreateItem, InventoryCommand, InventoryItem, Unit,
    };
    use kirana_parties::{Supplier, SupplierDraft};

    use crate::mail::InMemoryMailer;
    use crate::store::{Document, DocumentStore};

    struct Harness {
        stores: Stores,
        mailer: Arc<InMemoryMailer>,
        reconciler: Reconciler,
    }

    fn harness_with(stores: Stores, notify: bool) -> Harness {
        let mailer = Arc::new(InMemoryMailer::new());
        let notifier = SupplierNotifier::new(
            stores.clone(),
            mailer.clone(),
            "orders@kirana.local",
            "Kirana Store",
        );
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()));
        let reconciler = Reconciler::new(
            stores.clone(),
            notifier,
            clock,
            ReconcilerConfig {
                notify_suppliers: notify,
            },
        );
        Harness {
            stores,
            mailer,
            reconciler,
        }
    }

    fn harness() -> Harness {
        harness_with(Stores::in_memory(), true)
    }

    async fn add_item(stores: &Stores, name: &str, qty: i64, min: i64, price_major: u64) -> InventoryItem {
        let id = ItemId::new();
        let mut item = InventoryItem::empty(id);
        item.execute(&InventoryCommand::CreateItem(CreateItem {
            item_id: id,
            name: name.to_string(),
            category: Category::Groceries,
            quantity: qty,
            unit: Unit::Pcs,
            price: Money::from_major(price_major),
            minimum_stock: min,
            supplier: None,
            description: None,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        stores.items.insert(item.clone()).await.unwrap();
        item
    }

    async fn add_supplier(stores: &Stores, email: &str) {
        let s = Supplier::register(
            SupplierId::new(),
            SupplierDraft {
                name: email.to_string(),
                email: email.to_string(),
                phone: "9000000000".to_string(),
                branch: "Main".to_string(),
                address: None,
            },
            Utc::now(),
        )
        .unwrap();
        stores.suppliers.insert(s).await.unwrap();
    }

    #[tokio::test]
    async fn low_stock_item_yields_one_order_with_exact_total() {
        let h = harness();
        let a = add_item(&h.stores, "A", 2, 10, 5).await;

        let outcome = h.reconciler.run_pass().await.unwrap();
        let order = outcome.created_order().expect("order created").clone();

        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].item_id, a.id_typed());
        assert_eq!(order.lines()[0].quantity, 8);
        assert_eq!(order.lines()[0].price, Money::from_major(5));
        assert_eq!(order.total_amount(), Money::from_major(40));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.notes(), AUTO_ORDER_NOTES);
        assert!(order.order_number().starts_with("ORD1709287200000"));
        assert_eq!(h.stores.orders.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn item_exactly_at_minimum_is_included() {
        let h = harness();
        let b = add_item(&h.stores, "B", 10, 10, 3).await;

        let outcome = h.reconciler.run_pass().await.unwrap();
        let order = outcome.created_order().expect("order created");
        assert_eq!(order.lines()[0].item_id, b.id_typed());
        assert_eq!(order.lines()[0].quantity, 1);
    }

    #[tokio::test]
    async fn no_low_stock_means_no_order() {
        let h = harness();
        add_item(&h.stores, "Plenty", 50, 10, 3).await;

        let outcome = h.reconciler.run_pass().await.unwrap();
        assert!(matches!(outcome, PassOutcome::NoLowStock));
        assert!(h.stores.orders.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_immediate_pass_creates_nothing() {
        let h = harness();
        add_item(&h.stores, "A", 2, 10, 5).await;
        add_item(&h.stores, "B", 0, 4, 7).await;

        let first = h.reconciler.run_pass().await.unwrap();
        assert_eq!(first.created_order().unwrap().lines().len(), 2);

        let second = h.reconciler.run_pass().await.unwrap();
        match second {
            PassOutcome::NothingToOrder { skipped } => {
                assert_eq!(skipped.len(), 2);
                assert!(skipped.iter().all(|s| s.reason == SkipReason::AlreadyPending));
            }
            other => panic!("Expected NothingToOrder, got {other:?}"),
        }
        assert_eq!(h.stores.orders.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_passes_create_at_most_one_order() {
        let h = Arc::new(harness());
        add_item(&h.stores, "A", 2, 10, 5).await;

        let (x, y) = tokio::join!(h.reconciler.run_pass(), h.reconciler.run_pass());
        let created = [x.unwrap(), y.unwrap()]
            .iter()
            .filter(|o| o.created_order().is_some())
            .count();
        assert_eq!(created, 1);
        assert_eq!(h.stores.orders.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_low_stock_item_gets_its_own_order_later() {
        let h = harness();
        add_item(&h.stores, "A", 2, 10, 5).await;
        h.reconciler.run_pass().await.unwrap();

        let mut c = add_item(&h.stores, "C", 20, 10, 1).await;
        c.execute(&InventoryCommand::AdjustStock(AdjustStock {
            item_id: c.id_typed(),
            delta: -15,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        h.stores.items.update(c.clone()).await.unwrap();

        let outcome = h.reconciler.run_pass().await.unwrap();
        let order = outcome.created_order().expect("second order");
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].item_id, c.id_typed());
        assert_eq!(order.lines()[0].quantity, 5);
    }

    #[tokio::test]
    async fn suppliers_are_notified_and_failures_keep_the_order() {
        let h = harness();
        add_supplier(&h.stores, "ok@suppliers.in").await;
        add_supplier(&h.stores, "down@suppliers.in").await;
        h.mailer.fail_for("down@suppliers.in");
        add_item(&h.stores, "A", 2, 10, 5).await;

        let outcome = h.reconciler.run_pass().await.unwrap();
        match &outcome {
            PassOutcome::OrderCreated {
                notification: Some(report),
                ..
            } => {
                assert_eq!(report.sent, vec!["ok@suppliers.in".to_string()]);
                assert_eq!(report.failed.len(), 1);
            }
            other => panic!("Expected OrderCreated with a report, got {other:?}"),
        }
        assert_eq!(h.mailer.sent().len(), 1);
        assert_eq!(h.stores.orders.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notification_can_be_disabled() {
        let h = harness_with(Stores::in_memory(), false);
        add_supplier(&h.stores, "ok@suppliers.in").await;
        add_item(&h.stores, "A", 2, 10, 5).await;

        let outcome = h.reconciler.run_pass().await.unwrap();
        assert!(matches!(
            outcome,
            PassOutcome::OrderCreated {
                notification: None,
                ..
            }
        ));
        assert!(h.mailer.sent().is_empty());
    }

    /// Store whose reads always fail.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl<T: Document> DocumentStore<T> for BrokenStore {
        async fn get(&self, _id: T::Id) -> Result<Option<T>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn list(&self) -> Result<Vec<T>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn insert(&self, _doc: T) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn update(&self, _doc: T) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn delete(&self, _id: T::Id) -> Result<bool, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn inventory_read_failure_aborts_the_pass() {
        let mut stores = Stores::in_memory();
        stores.items = Arc::new(BrokenStore);
        let h = harness_with(stores, true);

        let err = h.reconciler.run_pass().await.unwrap_err();
        assert!(matches!(err, ReconcileError::Fetch { what: "inventory", .. }));
    }

    #[tokio::test]
    async fn order_read_failure_aborts_without_creating_anything() {
        let mut stores = Stores::in_memory();
        stores.orders = Arc::new(BrokenStore);
        let h = harness_with(stores, true);
        add_item(&h.stores, "A", 2, 10, 5).await;

        let err = h.reconciler.run_pass().await.unwrap_err();
        assert!(matches!(err, ReconcileError::Fetch { what: "pending orders", .. }));
    }
}
