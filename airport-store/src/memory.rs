//! Process-local document store.
//!
//! Transactions are optimistic and read from one snapshot of every collection,
//! taken when the transaction starts, so related collections are always seen
//! at the same point in time. Writes go to the transaction's copy. Commit fails
//! with a write conflict if any collection the transaction touched was
//! committed by someone else in the meantime; otherwise the written copies
//! replace the shared collections atomically.

use airport_core::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

use crate::document::{id_of, DeleteResult, Document, Namespace, ID_FIELD};
use crate::session::{DocumentStore, Session, TransactionOptions};

// Documents are shared between snapshots until a transaction writes.
#[derive(Debug, Clone, Default)]
struct StoredCollection {
    version: u64,
    documents: Arc<Vec<Document>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<Namespace, StoredCollection>,
    open_sessions: usize,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions started and not yet closed or dropped.
    pub fn open_sessions(&self) -> usize {
        lock(&self.state).open_sessions
    }

    pub fn has_collection(&self, namespace: &Namespace) -> bool {
        lock(&self.state).collections.contains_key(namespace)
    }

    /// Committed documents of a collection, outside of any transaction.
    pub fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        lock(&self.state)
            .collections
            .get(namespace)
            .map(|c| c.documents.to_vec())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn start_session(&self) -> StoreResult<Box<dyn Session>> {
        lock(&self.state).open_sessions += 1;
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            transaction: None,
            closed: false,
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct PendingTransaction {
    /// Every committed collection as of `start_transaction`.
    snapshot: HashMap<Namespace, StoredCollection>,
    touched: HashMap<Namespace, StoredCollection>,
    written: HashSet<Namespace>,
}

pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    transaction: Option<PendingTransaction>,
    closed: bool,
}

impl MemorySession {
    fn view(&mut self, namespace: &Namespace) -> StoreResult<&mut StoredCollection> {
        let PendingTransaction { snapshot, touched, .. } =
            self.transaction.as_mut().ok_or(StoreError::NoTransaction)?;
        Ok(touched
            .entry(namespace.clone())
            .or_insert_with(|| snapshot.get(namespace).cloned().unwrap_or_default()))
    }

    fn mark_written(&mut self, namespace: &Namespace) {
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.written.insert(namespace.clone());
        }
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.transaction = None;
            let mut state = lock(&self.state);
            state.open_sessions = state.open_sessions.saturating_sub(1);
        }
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn start_transaction(&mut self, _options: &TransactionOptions) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Unavailable("session is closed".into()));
        }
        if self.transaction.is_some() {
            return Err(StoreError::TransactionInProgress);
        }
        let snapshot = lock(&self.state).collections.clone();
        self.transaction = Some(PendingTransaction {
            snapshot,
            touched: HashMap::new(),
            written: HashSet::new(),
        });
        Ok(())
    }

    async fn commit_transaction(&mut self) -> StoreResult<()> {
        let PendingTransaction { touched, written, .. } =
            self.transaction.take().ok_or(StoreError::NoTransaction)?;

        let mut state = lock(&self.state);
        for (namespace, seen) in &touched {
            let current = state.collections.get(namespace).map_or(0, |c| c.version);
            if current != seen.version {
                debug!(collection = %namespace, "memory commit lost the race");
                return Err(StoreError::WriteConflict(namespace.to_string()));
            }
        }

        for (namespace, seen) in touched {
            if written.contains(&namespace) {
                let committed = StoredCollection {
                    version: seen.version + 1,
                    documents: seen.documents,
                };
                state.collections.insert(namespace, committed);
            }
        }
        Ok(())
    }

    async fn abort_transaction(&mut self) -> StoreResult<()> {
        self.transaction = None;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    async fn ensure_collection(&mut self, namespace: &Namespace) -> StoreResult<()> {
        if self.transaction.is_none() {
            return Err(StoreError::NoTransaction);
        }
        namespace.validate()?;
        lock(&self.state)
            .collections
            .entry(namespace.clone())
            .or_default();
        Ok(())
    }

    async fn find_all(&mut self, namespace: &Namespace) -> StoreResult<Vec<Document>> {
        Ok(self.view(namespace)?.documents.to_vec())
    }

    async fn find_by_id(
        &mut self,
        namespace: &Namespace,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .view(namespace)?
            .documents
            .iter()
            .find(|doc| id_of(doc) == Some(id))
            .cloned())
    }

    async fn insert_one(
        &mut self,
        namespace: &Namespace,
        mut document: Document,
    ) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        document.insert(ID_FIELD.to_string(), id.clone().into());
        Arc::make_mut(&mut self.view(namespace)?.documents).push(document);
        self.mark_written(namespace);
        Ok(id)
    }

    async fn delete_by_id(
        &mut self,
        namespace: &Namespace,
        id: &str,
    ) -> StoreResult<DeleteResult> {
        let documents = Arc::make_mut(&mut self.view(namespace)?.documents);
        let before = documents.len();
        documents.retain(|doc| id_of(doc) != Some(id));
        let deleted_count = (before - documents.len()) as u64;
        if deleted_count > 0 {
            self.mark_written(namespace);
        }
        Ok(DeleteResult { deleted_count })
    }

    async fn close(&mut self) {
        self.release();
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}
