//! Document persistence.
//!
//! Each aggregate/entity is stored whole, as one JSON document per id. Stores
//! enforce per-collection unique keys on insert and update.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

pub mod documents;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;

use kirana_inventory::InventoryItem;
use kirana_orders::ReplenishmentOrder;
use kirana_parties::{Customer, Staff, Supplier};

/// A record that can live in a `DocumentStore`.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Debug + Display + Into<Uuid> + Send + Sync + 'static;

    /// Collection (table) name.
    const COLLECTION: &'static str;

    fn doc_id(&self) -> Self::Id;

    /// `(field, value)` pairs that must be unique within the collection.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("{collection} with {field} '{value}' already exists")]
    Conflict {
        collection: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError>;

    async fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Insert a new document. Fails with `Conflict` on an id or unique-key clash.
    async fn insert(&self, doc: T) -> Result<(), StoreError>;

    /// Replace an existing document. Fails with `NotFound` if it does not exist.
    async fn update(&self, doc: T) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: T::Id) -> Result<bool, StoreError>;
}

/// All stores the application works with, shared by the HTTP layer and the reconciler.
#[derive(Clone)]
pub struct Stores {
    pub items: Arc<dyn DocumentStore<InventoryItem>>,
    pub orders: Arc<dyn DocumentStore<ReplenishmentOrder>>,
    pub suppliers: Arc<dyn DocumentStore<Supplier>>,
    pub customers: Arc<dyn DocumentStore<Customer>>,
    pub staff: Arc<dyn DocumentStore<Staff>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            items: Arc::new(InMemoryDocumentStore::new()),
            orders: Arc::new(InMemoryDocumentStore::new()),
            suppliers: Arc::new(InMemoryDocumentStore::new()),
            customers: Arc::new(InMemoryDocumentStore::new()),
            staff: Arc::new(InMemoryDocumentStore::new()),
        }
    }

    /// Connect to Postgres and create the collection tables if missing.
    #[cfg(feature = "postgres")]
    pub async fn postgres(pool: sqlx::PgPool) -> Result<Self, StoreError> {
        Ok(Self {
            items: Arc::new(PostgresDocumentStore::open(pool.clone()).await?),
            orders: Arc::new(PostgresDocumentStore::open(pool.clone()).await?),
            suppliers: Arc::new(PostgresDocumentStore::open(pool.clone()).await?),
            customers: Arc::new(PostgresDocumentStore::open(pool.clone()).await?),
            staff: Arc::new(PostgresDocumentStore::open(pool).await?),
        })
    }
}
