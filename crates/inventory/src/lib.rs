//! Inventory domain module.
//!
//! Business rules for stocked items, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{
    AdjustStock, Category, CreateItem, InventoryCommand, InventoryEvent, InventoryItem, ItemCreated,
    ItemPatch, ItemUpdated, StockAdjusted, SupplierContact, Unit, UpdateItem,
};
