use serde::Serialize;

use kirana_core::{DomainError, Money};
use kirana_orders::OrderStatus;

use super::{AppServices, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Σ total of completed orders.
    pub total_sales: Money,
    pub total_orders: usize,
    pub low_stock_items: usize,
    pub total_inventory: usize,
}

impl AppServices {
    pub async fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        let orders = self.stores.orders.list().await?;
        let items = self.stores.items.list().await?;

        let total_sales = orders
            .iter()
            .filter(|o| o.status() == OrderStatus::Completed)
            .try_fold(Money::ZERO, |acc, o| acc.checked_add(o.total_amount()))
            .ok_or_else(|| DomainError::validation("total sales out of range"))?;

        Ok(DashboardStats {
            total_sales,
            total_orders: orders.len(),
            low_stock_items: items.iter().filter(|i| i.is_low_stock()).count(),
            total_inventory: items.iter().filter(|i| i.is_active()).count(),
        })
    }
}
