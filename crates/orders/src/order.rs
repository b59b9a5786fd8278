use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::{Aggregate, AggregateRoot, DomainError, Event, ItemId, Money, OrderId};

/// Replenishment order status lifecycle.
///
/// Pending -> Sent -> Completed, or Pending -> Completed. Completed is terminal.
/// Older clients send `Pending`, `Email Sent` or `Completed`; those spellings
/// are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Sent", alias = "Email Sent", alias = "email sent", alias = "email_sent")]
    Sent,
    #[serde(alias = "Completed")]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Sent => "sent",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Sent)
                | (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Sent, OrderStatus::Completed)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "sent" | "email sent" | "email_sent" => Ok(OrderStatus::Sent),
            "completed" => Ok(OrderStatus::Completed),
            _ => Err(DomainError::validation(
                "status must be one of: pending, sent, completed",
            )),
        }
    }
}

/// Order line: quantity and unit price captured when the line was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: u64,
    pub price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// Unvalidated line as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub item_id: ItemId,
    pub quantity: i64,
    pub price: Money,
}

/// Σ quantity × price over the lines.
pub fn order_total(lines: &[OrderLine]) -> Result<Money, DomainError> {
    lines.iter().try_fold(Money::ZERO, |acc, line| {
        line.line_total()
            .and_then(|t| acc.checked_add(t))
            .ok_or_else(|| DomainError::validation("order total out of range"))
    })
}

fn validate_lines(lines: &[NewOrderLine]) -> Result<Vec<OrderLine>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::validation("order must contain at least one item"));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if !seen.insert(line.item_id) {
            return Err(DomainError::validation(format!(
                "item {} appears more than once",
                line.item_id
            )));
        }
        out.push(OrderLine {
            item_id: line.item_id,
            quantity: line.quantity as u64,
            price: line.price,
        });
    }
    Ok(out)
}

/// Aggregate root: ReplenishmentOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentOrder {
    id: OrderId,
    order_number: String,
    lines: Vec<OrderLine>,
    total_amount: Money,
    status: OrderStatus,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl ReplenishmentOrder {
    /// Create an empty, not-yet-placed aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: String::new(),
            lines: Vec::new(),
            total_amount: Money::ZERO,
            status: OrderStatus::Pending,
            notes: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

impl AggregateRoot for ReplenishmentOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub lines: Vec<NewOrderLine>,
    pub status: OrderStatus,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseLines (only while Pending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseLines {
    pub order_id: OrderId,
    pub lines: Vec<NewOrderLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus, optionally replacing the notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ReviseLines(ReviseLines),
    ChangeStatus(ChangeStatus),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinesRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinesRevised {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    LinesRevised(LinesRevised),
    StatusChanged(StatusChanged),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.order.placed",
            OrderEvent::LinesRevised(_) => "orders.order.lines_revised",
            OrderEvent::StatusChanged(_) => "orders.order.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::LinesRevised(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ReplenishmentOrder {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.order_number = e.order_number.clone();
                self.lines = e.lines.clone();
                self.status = e.status;
                self.notes = e.notes.clone();
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
                self.created = true;
            }
            OrderEvent::LinesRevised(e) => {
                self.lines = e.lines.clone();
                self.updated_at = e.occurred_at;
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                if let Some(notes) = &e.notes {
                    self.notes = notes.clone();
                }
                self.updated_at = e.occurred_at;
            }
        }

        // The total always follows the lines.
        self.total_amount = order_total(&self.lines).unwrap_or(self.total_amount);
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ReviseLines(cmd) => self.handle_revise(cmd),
            OrderCommand::ChangeStatus(cmd) => self.handle_status(cmd),
        }
    }
}

impl ReplenishmentOrder {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.order_number.trim().is_empty() {
            return Err(DomainError::validation("order number is required"));
        }
        if cmd.status == OrderStatus::Completed {
            return Err(DomainError::validation(
                "an order cannot be created as completed",
            ));
        }

        let lines = validate_lines(&cmd.lines)?;
        let total_amount = order_total(&lines)?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            order_number: cmd.order_number.trim().to_string(),
            lines,
            total_amount,
            status: cmd.status,
            notes: cmd.notes.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseLines) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(cmd.order_id)?;

        if self.status != OrderStatus::Pending {
            return Err(DomainError::invariant(
                "only pending orders can have their items changed",
            ));
        }

        let lines = validate_lines(&cmd.lines)?;
        let total_amount = order_total(&lines)?;

        Ok(vec![OrderEvent::LinesRevised(LinesRevised {
            order_id: cmd.order_id,
            lines,
            total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_status(&self, cmd: &ChangeStatus) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(cmd.order_id)?;

        let notes = cmd.notes.as_deref().map(|n| n.trim().to_string());

        if cmd.status == self.status {
            // Same status: only a notes edit, which is allowed until completion.
            if self.status == OrderStatus::Completed {
                return Err(DomainError::invariant("completed orders cannot be modified"));
            }
            if notes.is_none() {
                return Ok(Vec::new());
            }
        } else if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invariant(format!(
                "cannot move order from {} to {}",
                self.status, cmd.status
            )));
        }

        Ok(vec![OrderEvent::StatusChanged(StatusChanged {
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.status,
            notes,
            occurred_at: cmd.occurred_at,
        })])
    }
}
