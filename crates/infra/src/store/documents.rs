use kirana_core::{AggregateRoot, CustomerId, Entity, ItemId, OrderId, StaffId, SupplierId};
use kirana_inventory::InventoryItem;
use kirana_orders::ReplenishmentOrder;
use kirana_parties::{Customer, Staff, Supplier};

use super::Document;

impl Document for InventoryItem {
    type Id = ItemId;
    const COLLECTION: &'static str = "inventory";

    fn doc_id(&self) -> ItemId {
        *AggregateRoot::id(self)
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name().to_lowercase())]
    }
}

impl Document for ReplenishmentOrder {
    type Id = OrderId;
    const COLLECTION: &'static str = "orders";

    fn doc_id(&self) -> OrderId {
        *AggregateRoot::id(self)
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("order_number", self.order_number().to_string())]
    }
}

impl Document for Supplier {
    type Id = SupplierId;
    const COLLECTION: &'static str = "suppliers";

    fn doc_id(&self) -> SupplierId {
        *Entity::id(self)
    }
}

impl Document for Customer {
    type Id = CustomerId;
    const COLLECTION: &'static str = "customers";

    fn doc_id(&self) -> CustomerId {
        *Entity::id(self)
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("token_number", self.token_number().to_string())]
    }
}

impl Document for Staff {
    type Id = StaffId;
    const COLLECTION: &'static str = "staff";

    fn doc_id(&self) -> StaffId {
        *Entity::id(self)
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("staff_code", self.staff_code().to_string()),
            ("email", self.email().as_str().to_string()),
        ]
    }
}
