//! `kirana-replenishment`
//!
//! **Responsibility:** decide what to reorder and what to tell suppliers.
//!
//! Pure functions only:
//! - no IO, no clocks, no randomness
//! - inputs are snapshots fetched by callers (infra reconciler)
//! - outputs are plans and messages, never persisted state

pub mod notice;
pub mod plan;

pub use notice::{NoticeLine, OrderNotice, compose_order_notice};
pub use plan::{PlannedLine, ReplenishmentPlan, SkipReason, SkippedItem, plan_replenishment};
