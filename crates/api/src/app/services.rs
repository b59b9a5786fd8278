//! Service layer behind the HTTP routes.
//!
//! Each operation loads documents from the shared [`Stores`], runs the domain
//! command on them and writes the result back. Handlers stay thin: they parse
//! the request, call one method here and map the outcome to a response.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use kirana_core::{Clock, DomainError, Event};
use kirana_infra::{
    Document, DocumentStore, PlacementError, ReconcileError, Reconciler, StoreError, Stores,
    SupplierNotifier,
};

mod dashboard;
mod inventory;
mod orders;
mod parties;

pub use dashboard::DashboardStats;
pub use orders::{PlacedOrder, UpdatedOrder};

/// Attempts at finding a free generated reference (customer token) before giving up.
const MAX_REFERENCE_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// No free generated reference could be found.
    #[error("{0}")]
    Exhausted(String),
}

impl From<PlacementError> for ServiceError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::Domain(e) => ServiceError::Domain(e),
            PlacementError::Store(e) => ServiceError::Store(e),
            other => ServiceError::Exhausted(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    stores: Stores,
    reconciler: Arc<Reconciler>,
    notifier: SupplierNotifier,
    clock: Arc<dyn Clock>,
}

impl AppServices {
    pub fn new(
        stores: Stores,
        reconciler: Arc<Reconciler>,
        notifier: SupplierNotifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            reconciler,
            notifier,
            clock,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// The reconciler shared by the scheduled runner and `POST /orders/auto-create`.
    pub fn reconciler(&self) -> Arc<Reconciler> {
        self.reconciler.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

async fn load<T: Document>(
    store: &dyn DocumentStore<T>,
    id: T::Id,
    what: &'static str,
) -> ServiceResult<T> {
    store.get(id).await?.ok_or(ServiceError::NotFound(what))
}

async fn remove<T: Document>(
    store: &dyn DocumentStore<T>,
    id: T::Id,
    what: &'static str,
) -> ServiceResult<()> {
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(what))
    }
}

fn log_events<E: Event>(events: &[E]) {
    for event in events {
        debug!(event = event.event_type(), at = %event.occurred_at(), "domain event applied");
    }
}
