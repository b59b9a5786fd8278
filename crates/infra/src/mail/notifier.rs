use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use kirana_orders::ReplenishmentOrder;
use kirana_replenishment::{NoticeLine, compose_order_notice};

use super::{MailMessage, Mailer};
use crate::store::{Stores, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDelivery {
    pub recipient: String,
    pub error: String,
}

/// Outcome of one round of supplier emails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub sent: Vec<String>,
    pub failed: Vec<FailedDelivery>,
}

impl NotificationReport {
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.failed.is_empty()
    }
}

/// Emails every active supplier about a replenishment order.
#[derive(Clone)]
pub struct SupplierNotifier {
    stores: Stores,
    mailer: Arc<dyn Mailer>,
    from: String,
    signature: String,
}

impl SupplierNotifier {
    pub fn new(
        stores: Stores,
        mailer: Arc<dyn Mailer>,
        from: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            stores,
            mailer,
            from: from.into(),
            signature: signature.into(),
        }
    }

    /// Send the order notice to each active supplier.
    ///
    /// Only store reads can fail; delivery failures are collected in the report.
    pub async fn notify_order(
        &self,
        order: &ReplenishmentOrder,
    ) -> Result<NotificationReport, StoreError> {
        let mut suppliers: Vec<_> = self
            .stores
            .suppliers
            .list()
            .await?
            .into_iter()
            .filter(|s| s.is_active())
            .collect();
        suppliers.sort_by(|a, b| a.name().cmp(b.name()));

        if suppliers.is_empty() {
            info!(order_number = %order.order_number(), "no active suppliers to notify");
            return Ok(NotificationReport::default());
        }

        let lines = self.notice_lines(order).await?;
        let notice = compose_order_notice(order, &lines, &self.signature);

        let mut report = NotificationReport::default();
        for supplier in suppliers {
            let message = MailMessage {
                from: self.from.clone(),
                to: supplier.email().as_str().to_string(),
                subject: notice.subject.clone(),
                text: notice.body.clone(),
            };
            match self.mailer.send(&message).await {
                Ok(()) => {
                    info!(
                        order_number = %order.order_number(),
                        supplier = %supplier.name(),
                        "order notice sent"
                    );
                    report.sent.push(message.to);
                }
                Err(e) => {
                    warn!(
                        order_number = %order.order_number(),
                        supplier = %supplier.name(),
                        error = %e,
                        "failed to send order notice"
                    );
                    report.failed.push(FailedDelivery {
                        recipient: message.to,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn notice_lines(&self, order: &ReplenishmentOrder) -> Result<Vec<NoticeLine>, StoreError> {
        let mut lines = Vec::with_capacity(order.lines().len());
        for line in order.lines() {
            match self.stores.items.get(line.item_id).await? {
                Some(item) => lines.push(NoticeLine {
                    name: item.name().to_string(),
                    category: item.category(),
                    unit: item.unit(),
                    quantity: line.quantity,
                }),
                None => warn!(
                    order_number = %order.order_number(),
                    item = %line.item_id,
                    "ordered item no longer exists; left out of notice"
                ),
            }
        }
        Ok(lines)
    }
}
