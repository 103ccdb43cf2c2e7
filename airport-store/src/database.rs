//! PostgreSQL-backed document store.
//!
//! Each collection is a table `"<database>"."<collection>"` holding the whole
//! document as JSONB, keyed by its `_id` and ordered by insertion sequence.
//! Tables are created the first time a collection is used, inside the
//! transaction that uses it; the shared cache of created tables only learns
//! about them once that transaction commits.

use airport_core::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app_config::DatabaseConfig;
use crate::document::{DeleteResult, Document, Namespace, ID_FIELD};
use crate::session::{DocumentStore, ReadPreference, Session, TransactionOptions, WriteConcern};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    created: Arc<Mutex<HashSet<Namespace>>>,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!(
            max_connections = config.max_connections,
            database = %config.name,
            "Connecting to PostgreSQL document store"
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            created: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn start_session(&self) -> StoreResult<Box<dyn Session>> {
        Ok(Box::new(PostgresSession {
            pool: self.pool.clone(),
            created: Arc::clone(&self.created),
            pending: HashSet::new(),
            transaction: None,
        }))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

pub struct PostgresSession {
    pool: PgPool,
    created: Arc<Mutex<HashSet<Namespace>>>,
    /// Created by the open transaction, not yet committed.
    pending: HashSet<Namespace>,
    transaction: Option<Transaction<'static, Postgres>>,
}

impl PostgresSession {
    fn active(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
        self.transaction.as_mut().ok_or(StoreError::NoTransaction)
    }

    fn is_created(&self, namespace: &Namespace) -> bool {
        self.pending.contains(namespace)
            || self
                .created
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(namespace)
    }
}

fn table(namespace: &Namespace) -> StoreResult<String> {
    namespace.validate()?;
    Ok(format!(r#""{}"."{}""#, namespace.database, namespace.collection))
}

/// Maps driver errors onto the store taxonomy. Serialization failures and
/// deadlocks are reported as write conflicts so the transaction is retried.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("40001") | Some("40P01") => StoreError::WriteConflict(db.message().to_string()),
            _ => StoreError::Database(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

/// Two transactions racing to create the same schema or table: the loser sees
/// a duplicate in the catalog and reruns, finding the table already there.
fn ddl_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if let Some("23505" | "42P06" | "42P07") = db.code().as_deref() {
            return StoreError::WriteConflict(db.message().to_string());
        }
    }
    store_error(err)
}

fn into_document(namespace: &Namespace, body: Value) -> StoreResult<Document> {
    match body {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Malformed {
            collection: namespace.to_string(),
            reason: format!("expected an object, got {other}"),
        }),
    }
}

#[async_trait]
impl Session for PostgresSession {
    async fn start_transaction(&mut self, options: &TransactionOptions) -> StoreResult<()> {
        if self.transaction.is_some() {
            return Err(StoreError::TransactionInProgress);
        }
        if options.read_preference != ReadPreference::Primary {
            return Err(StoreError::Unsupported(format!(
                "read preference {:?}",
                options.read_preference
            )));
        }

        let mut tx = self.pool.begin().await.map_err(store_error)?;
        // Concurrent schedules for the same plane must not both commit.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        let synchronous_commit = match options.write_concern {
            WriteConcern::Majority => "SET LOCAL synchronous_commit TO on",
            WriteConcern::Acknowledged => "SET LOCAL synchronous_commit TO local",
        };
        sqlx::query(synchronous_commit)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        debug!(read_concern = ?options.read_concern, "postgres transaction started");
        self.transaction = Some(tx);
        Ok(())
    }

    async fn commit_transaction(&mut self) -> StoreResult<()> {
        let tx = self.transaction.take().ok_or(StoreError::NoTransaction)?;
        let pending = std::mem::take(&mut self.pending);
        tx.commit().await.map_err(store_error)?;

        if !pending.is_empty() {
            self.created
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(pending);
        }
        Ok(())
    }

    async fn abort_transaction(&mut self) -> StoreResult<()> {
        self.pending.clear();
        match self.transaction.take() {
            Some(tx) => tx.rollback().await.map_err(store_error),
            None => Ok(()),
        }
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    async fn ensure_collection(&mut self, namespace: &Namespace) -> StoreResult<()> {
        if self.transaction.is_none() {
            return Err(StoreError::NoTransaction);
        }
        if self.is_created(namespace) {
            return Ok(());
        }
        let table = table(namespace)?;

        // On the transaction's own connection; rolled back with it on abort.
        let tx = self.active()?;
        sqlx::query(&format!(r#"CREATE SCHEMA IF NOT EXISTS "{}""#, namespace.database))
            .execute(&mut **tx)
            .await
            .map_err(ddl_error)?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                seq BIGSERIAL, \
                id TEXT PRIMARY KEY, \
                body JSONB NOT NULL\
            )"
        ))
        .execute(&mut **tx)
        .await
        .map_err(ddl_error)?;

        info!(collection = %namespace, "Collection ready");
        self.pending.insert(namespace.clone());
        Ok(())
    }

    async fn find_all(&mut self, namespace: &Namespace) -> StoreResult<Vec<Document>> {
        let sql = format!("SELECT body FROM {} ORDER BY seq", table(namespace)?);
        let tx = self.active()?;
        let bodies: Vec<Value> = sqlx::query_scalar(&sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(store_error)?;

        bodies
            .into_iter()
            .map(|body| into_document(namespace, body))
            .collect()
    }

    async fn find_by_id(
        &mut self,
        namespace: &Namespace,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        let sql = format!("SELECT body FROM {} WHERE id = $1", table(namespace)?);
        let tx = self.active()?;
        let body: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(store_error)?;

        body.map(|body| into_document(namespace, body)).transpose()
    }

    async fn insert_one(
        &mut self,
        namespace: &Namespace,
        mut document: Document,
    ) -> StoreResult<String> {
        let sql = format!("INSERT INTO {} (id, body) VALUES ($1, $2)", table(namespace)?);
        let id = Uuid::new_v4().to_string();
        document.insert(ID_FIELD.to_string(), Value::from(id.clone()));

        let tx = self.active()?;
        sqlx::query(&sql)
            .bind(&id)
            .bind(Value::Object(document))
            .execute(&mut **tx)
            .await
            .map_err(store_error)?;
        Ok(id)
    }

    async fn delete_by_id(&mut self, namespace: &Namespace, id: &str) -> StoreResult<DeleteResult> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table(namespace)?);
        let tx = self.active()?;
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(store_error)?;

        Ok(DeleteResult {
            deleted_count: result.rows_affected(),
        })
    }

    async fn close(&mut self) {
        if let Err(err) = self.abort_transaction().await {
            warn!(error = %err, "rollback on session close failed");
        }
    }
}
