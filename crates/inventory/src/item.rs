use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::{
    Aggregate, AggregateRoot, DomainError, Email, Event, ItemId, Money, required_text,
};

/// Shelf category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    Household,
    Snacks,
    Beverages,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Groceries,
        Category::Household,
        Category::Snacks,
        Category::Beverages,
        Category::PersonalCare,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::Household => "Household",
            Category::Snacks => "Snacks",
            Category::Beverages => "Beverages",
            Category::PersonalCare => "Personal Care",
            Category::Other => "Other",
        }
    }
}

impl core::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown category: {s}")))
    }
}

/// Unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    L,
    Ml,
    Pcs,
    Box,
    Pack,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Pcs => "pcs",
            Unit::Box => "box",
            Unit::Pack => "pack",
        }
    }
}

/// Optional per-item supplier contact (free text, not linked to `Supplier` records).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierContact {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<Email>,
}

/// Aggregate root: InventoryItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    category: Category,
    quantity: i64,
    unit: Unit,
    price: Money,
    minimum_stock: i64,
    supplier: Option<SupplierContact>,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            name: String::new(),
            category: Category::Other,
            quantity: 0,
            unit: Unit::Pcs,
            price: Money::ZERO,
            minimum_stock: 0,
            supplier: None,
            description: String::new(),
            is_active: true,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn minimum_stock(&self) -> i64 {
        self.minimum_stock
    }

    pub fn supplier(&self) -> Option<&SupplierContact> {
        self.supplier.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Active and at or below its minimum stock.
    pub fn is_low_stock(&self) -> bool {
        self.is_active && self.quantity <= self.minimum_stock
    }

    /// Units missing to reach the minimum stock (zero or negative when stocked).
    /// `None` if the difference does not fit in an `i64`.
    pub fn shortfall(&self) -> Option<i64> {
        self.minimum_stock.checked_sub(self.quantity)
    }
}

impl AggregateRoot for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub item_id: ItemId,
    pub name: String,
    pub category: Category,
    pub quantity: i64,
    pub unit: Unit,
    pub price: Money,
    pub minimum_stock: i64,
    pub supplier: Option<SupplierContact>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub quantity: Option<i64>,
    pub unit: Option<Unit>,
    pub price: Option<Money>,
    pub minimum_stock: Option<i64>,
    pub supplier: Option<SupplierContact>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == ItemPatch::default()
    }
}

/// Command: UpdateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub item_id: ItemId,
    pub patch: ItemPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub item_id: ItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    UpdateItem(UpdateItem),
    AdjustStock(AdjustStock),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub item_id: ItemId,
    pub name: String,
    pub category: Category,
    pub quantity: i64,
    pub unit: Unit,
    pub price: Money,
    pub minimum_stock: i64,
    pub supplier: Option<SupplierContact>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemUpdated (normalized patch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdated {
    pub item_id: ItemId,
    pub patch: ItemPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub item_id: ItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    ItemUpdated(ItemUpdated),
    StockAdjusted(StockAdjusted),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::ItemUpdated(_) => "inventory.item.updated",
            InventoryEvent::StockAdjusted(_) => "inventory.item.stock_adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::ItemUpdated(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                self.id = e.item_id;
                self.name = e.name.clone();
                self.category = e.category;
                self.quantity = e.quantity;
                self.unit = e.unit;
                self.price = e.price;
                self.minimum_stock = e.minimum_stock;
                self.supplier = e.supplier.clone();
                self.description = e.description.clone();
                self.is_active = true;
                self.created_at = e.occurred_at;
                self.last_updated = e.occurred_at;
                self.created = true;
            }
            InventoryEvent::ItemUpdated(e) => {
                let p = &e.patch;
                if let Some(name) = &p.name {
                    self.name = name.clone();
                }
                if let Some(category) = p.category {
                    self.category = category;
                }
                if let Some(quantity) = p.quantity {
                    self.quantity = quantity;
                }
                if let Some(unit) = p.unit {
                    self.unit = unit;
                }
                if let Some(price) = p.price {
                    self.price = price;
                }
                if let Some(minimum_stock) = p.minimum_stock {
                    self.minimum_stock = minimum_stock;
                }
                if let Some(supplier) = &p.supplier {
                    self.supplier = Some(supplier.clone());
                }
                if let Some(description) = &p.description {
                    self.description = description.clone();
                }
                if let Some(is_active) = p.is_active {
                    self.is_active = is_active;
                }
                self.last_updated = e.occurred_at;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.quantity += e.delta;
                self.last_updated = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::UpdateItem(cmd) => self.handle_update(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
        }
    }
}

fn ensure_non_negative(field: &str, value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

impl InventoryItem {
    fn ensure_item_id(&self, item_id: ItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        let name = required_text("item name", &cmd.name)?;
        ensure_non_negative("quantity", cmd.quantity)?;
        ensure_non_negative("minimum stock", cmd.minimum_stock)?;

        Ok(vec![InventoryEvent::ItemCreated(ItemCreated {
            item_id: cmd.item_id,
            name,
            category: cmd.category,
            quantity: cmd.quantity,
            unit: cmd.unit,
            price: cmd.price,
            minimum_stock: cmd.minimum_stock,
            supplier: cmd.supplier.clone(),
            description: cmd
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_item_id(cmd.item_id)?;

        if cmd.patch.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }

        let mut patch = cmd.patch.clone();
        if let Some(name) = &patch.name {
            patch.name = Some(required_text("item name", name)?);
        }
        if let Some(quantity) = patch.quantity {
            ensure_non_negative("quantity", quantity)?;
        }
        if let Some(minimum_stock) = patch.minimum_stock {
            ensure_non_negative("minimum stock", minimum_stock)?;
        }
        if let Some(description) = &patch.description {
            patch.description = Some(description.trim().to_string());
        }

        Ok(vec![InventoryEvent::ItemUpdated(ItemUpdated {
            item_id: cmd.item_id,
            patch,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<Vec<InventoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_item_id(cmd.item_id)?;

        if cmd.delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let new_quantity = self
            .quantity
            .checked_add(cmd.delta)
            .ok_or_else(|| DomainError::validation("quantity out of range"))?;
        if new_quantity < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            item_id: cmd.item_id,
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }
}
