use tracing::info;

use kirana_core::{Aggregate, ItemId};
use kirana_inventory::{
    AdjustStock, Category, CreateItem, InventoryCommand, InventoryItem, ItemPatch, UpdateItem,
};

use super::{AppServices, ServiceResult, load, log_events, remove};
use crate::app::dto::CreateItemRequest;

impl AppServices {
    /// Active items, by name.
    pub async fn inventory_list(&self) -> ServiceResult<Vec<InventoryItem>> {
        self.active_items(|_| true).await
    }

    pub async fn inventory_by_category(&self, category: Category) -> ServiceResult<Vec<InventoryItem>> {
        self.active_items(|item| item.category() == category).await
    }

    pub async fn inventory_low_stock(&self) -> ServiceResult<Vec<InventoryItem>> {
        self.active_items(InventoryItem::is_low_stock).await
    }

    async fn active_items<F>(&self, keep: F) -> ServiceResult<Vec<InventoryItem>>
    where
        F: Fn(&InventoryItem) -> bool,
    {
        let mut items: Vec<_> = self
            .stores
            .items
            .list()
            .await?
            .into_iter()
            .filter(|item| item.is_active() && keep(item))
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(items)
    }

    pub async fn inventory_get(&self, id: ItemId) -> ServiceResult<InventoryItem> {
        load(self.stores.items.as_ref(), id, "inventory item").await
    }

    pub async fn inventory_create(&self, req: CreateItemRequest) -> ServiceResult<InventoryItem> {
        let item_id = ItemId::new();
        let mut item = InventoryItem::empty(item_id);
        let events = item.execute(&InventoryCommand::CreateItem(CreateItem {
            item_id,
            name: req.name,
            category: req.category,
            quantity: req.quantity,
            unit: req.unit,
            price: req.price,
            minimum_stock: req.minimum_stock,
            supplier: req.supplier,
            description: req.description,
            occurred_at: self.now(),
        }))?;
        log_events(&events);

        self.stores.items.insert(item.clone()).await?;
        info!(item = %item_id, name = %item.name(), "inventory item created");
        Ok(item)
    }

    pub async fn inventory_update(&self, id: ItemId, patch: ItemPatch) -> ServiceResult<InventoryItem> {
        let mut item = self.inventory_get(id).await?;
        let events = item.execute(&InventoryCommand::UpdateItem(UpdateItem {
            item_id: id,
            patch,
            occurred_at: self.now(),
        }))?;
        log_events(&events);

        self.stores.items.update(item.clone()).await?;
        Ok(item)
    }

    /// Add (or with a negative delta, remove) stock.
    pub async fn inventory_adjust(&self, id: ItemId, delta: i64) -> ServiceResult<InventoryItem> {
        let mut item = self.inventory_get(id).await?;
        let events = item.execute(&InventoryCommand::AdjustStock(AdjustStock {
            item_id: id,
            delta,
            occurred_at: self.now(),
        }))?;
        log_events(&events);

        self.stores.items.update(item.clone()).await?;
        info!(item = %id, delta, quantity = item.quantity(), "stock adjusted");
        Ok(item)
    }

    pub async fn inventory_delete(&self, id: ItemId) -> ServiceResult<()> {
        remove(self.stores.items.as_ref(), id, "inventory item").await?;
        info!(item = %id, "inventory item deleted");
        Ok(())
    }
}
