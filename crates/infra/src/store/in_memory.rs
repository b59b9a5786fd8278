use std::collections::HashMap;
use std::sync::RwLock;

use super::{Document, DocumentStore, StoreError};

/// In-memory document store.
///
/// Intended for tests/dev and as the default when no database is configured.
pub struct InMemoryDocumentStore<T: Document> {
    docs: RwLock<HashMap<T::Id, T>>,
}

impl<T: Document> InMemoryDocumentStore<T> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Document> Default for InMemoryDocumentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// First unique key of `doc` already taken by a different document.
fn find_clash<T: Document>(docs: &HashMap<T::Id, T>, doc: &T) -> Option<StoreError> {
    let id = doc.doc_id();
    let keys = doc.unique_keys();
    docs.values()
        .filter(|other| other.doc_id() != id)
        .find_map(|other| {
            let taken = other.unique_keys();
            keys.iter()
                .find(|k| taken.contains(k))
                .map(|(field, value)| StoreError::Conflict {
                    collection: T::COLLECTION,
                    field: *field,
                    value: value.clone(),
                })
        })
}

#[async_trait::async_trait]
impl<T: Document> DocumentStore<T> for InMemoryDocumentStore<T> {
    async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.values().cloned().collect())
    }

    async fn insert(&self, doc: T) -> Result<(), StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        let id = doc.doc_id();
        if docs.contains_key(&id) {
            return Err(StoreError::Conflict {
                collection: T::COLLECTION,
                field: "id",
                value: id.to_string(),
            });
        }
        if let Some(clash) = find_clash(&docs, &doc) {
            return Err(clash);
        }
        docs.insert(id, doc);
        Ok(())
    }

    async fn update(&self, doc: T) -> Result<(), StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        let id = doc.doc_id();
        if !docs.contains_key(&id) {
            return Err(StoreError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            });
        }
        if let Some(clash) = find_clash(&docs, &doc) {
            return Err(clash);
        }
        docs.insert(id, doc);
        Ok(())
    }

    async fn delete(&self, id: T::Id) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        Ok(docs.remove(&id).is_some())
    }
}
