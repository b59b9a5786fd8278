//! Postgres-backed document store.
//!
//! One table per collection holds the documents as JSONB; a companion
//! `{collection}_keys` table carries the unique keys so that clashes are
//! rejected by the primary key constraint.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | Other | N/A | `Backend` |

use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::{Document, DocumentStore, StoreError};

pub struct PostgresDocumentStore<T: Document> {
    pool: Arc<PgPool>,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Document> PostgresDocumentStore<T> {
    /// Wrap a pool and make sure the collection tables exist.
    pub async fn open(pool: PgPool) -> Result<Self, StoreError> {
        let store = Self {
            pool: Arc::new(pool),
            _doc: PhantomData,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let collection = T::COLLECTION;
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {collection} (
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        ))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error::<T>("create_table", e))?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {collection}_keys (
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                id UUID NOT NULL REFERENCES {collection}(id) ON DELETE CASCADE,
                PRIMARY KEY (field, value)
            )
            "#
        ))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error::<T>("create_keys_table", e))?;

        Ok(())
    }

    async fn write_keys(
        tx: &mut Transaction<'_, Postgres>,
        doc: &T,
        id: Uuid,
    ) -> Result<(), StoreError> {
        let collection = T::COLLECTION;
        sqlx::query(&format!("DELETE FROM {collection}_keys WHERE id = $1"))
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error::<T>("clear_keys", e))?;

        for (field, value) in doc.unique_keys() {
            sqlx::query(&format!(
                "INSERT INTO {collection}_keys (field, value, id) VALUES ($1, $2, $3)"
            ))
            .bind(field)
            .bind(&value)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| match map_sqlx_error::<T>("insert_key", e) {
                StoreError::Conflict { collection, .. } => StoreError::Conflict {
                    collection,
                    field,
                    value: value.clone(),
                },
                other => other,
            })?;
        }
        Ok(())
    }
}

fn encode<T: Document>(doc: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: Document>(value: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait::async_trait]
impl<T: Document> DocumentStore<T> for PostgresDocumentStore<T> {
    #[instrument(skip(self), fields(collection = T::COLLECTION), err)]
    async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let uuid: Uuid = id.into();
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = $1", T::COLLECTION))
            .bind(uuid)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error::<T>("get", e))?;

        match row {
            Some(row) => {
                let value: serde_json::Value = row
                    .try_get("doc")
                    .map_err(|e| map_sqlx_error::<T>("get", e))?;
                decode(value).map(Some)
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(collection = T::COLLECTION), err)]
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT doc FROM {} ORDER BY updated_at DESC",
            T::COLLECTION
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error::<T>("list", e))?;

        rows.into_iter()
            .map(|row| {
                let value: serde_json::Value = row
                    .try_get("doc")
                    .map_err(|e| map_sqlx_error::<T>("list", e))?;
                decode(value)
            })
            .collect()
    }

    #[instrument(skip(self, doc), fields(collection = T::COLLECTION, id = %doc.doc_id()), err)]
    async fn insert(&self, doc: T) -> Result<(), StoreError> {
        let id: Uuid = doc.doc_id().into();
        let body = encode(&doc)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error::<T>("begin", e))?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, doc, updated_at) VALUES ($1, $2, NOW())",
            T::COLLECTION
        ))
        .bind(id)
        .bind(&body)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error::<T>("insert", e))?;

        Self::write_keys(&mut tx, &doc, id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error::<T>("commit", e))
    }

    #[instrument(skip(self, doc), fields(collection = T::COLLECTION, id = %doc.doc_id()), err)]
    async fn update(&self, doc: T) -> Result<(), StoreError> {
        let id: Uuid = doc.doc_id().into();
        let body = encode(&doc)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error::<T>("begin", e))?;

        let result = sqlx::query(&format!(
            "UPDATE {} SET doc = $2, updated_at = NOW() WHERE id = $1",
            T::COLLECTION
        ))
        .bind(id)
        .bind(&body)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error::<T>("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            });
        }

        Self::write_keys(&mut tx, &doc, id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error::<T>("commit", e))
    }

    #[instrument(skip(self), fields(collection = T::COLLECTION), err)]
    async fn delete(&self, id: T::Id) -> Result<bool, StoreError> {
        let uuid: Uuid = id.into();
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", T::COLLECTION))
            .bind(uuid)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error::<T>("delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_sqlx_error<T: Document>(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict {
                    collection: T::COLLECTION,
                    field: "id",
                    value: msg,
                },
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
