//! Infrastructure layer: document stores, outbound mail and the
//! replenishment reconciler with its background runner.

pub mod mail;
pub mod placement;
pub mod reconciler;
pub mod store;

pub use mail::{
    FailedDelivery, HttpMailRelay, InMemoryMailer, LogMailer, MailError, MailMessage, Mailer,
    NotificationReport, SupplierNotifier,
};
pub use placement::{OrderDraft, PlacementError, place_order};
pub use reconciler::{
    IntervalTicker, ManualTicker, ManualTickerHandle, PassOutcome, ReconcileError, Reconciler,
    ReconcilerConfig, ReplenishmentRunner, ReplenishmentRunnerHandle, Ticker,
};
pub use store::{Document, DocumentStore, InMemoryDocumentStore, StoreError, Stores};
#[cfg(feature = "postgres")]
pub use store::PostgresDocumentStore;
