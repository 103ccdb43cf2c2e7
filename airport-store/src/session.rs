//! The seam between the repositories and a concrete document store.
//!
//! A [`DocumentStore`] hands out [`Session`]s. A session is owned by exactly one
//! caller and runs at most one transaction at a time; every data operation must
//! happen inside that transaction.

use airport_core::StoreResult;
use async_trait::async_trait;

use crate::document::{DeleteResult, Document, Namespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadConcern {
    /// Session-consistent reads of the node's latest data.
    #[default]
    Local,
    Majority,
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteConcern {
    Acknowledged,
    #[default]
    Majority,
}

/// Per-transaction policy. The default is what every airport operation uses:
/// primary reads, local read concern, majority-acknowledged writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOptions {
    pub read_preference: ReadPreference,
    pub read_concern: ReadConcern,
    pub write_concern: WriteConcern,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn start_session(&self) -> StoreResult<Box<dyn Session>>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

#[async_trait]
pub trait Session: Send {
    async fn start_transaction(&mut self, options: &TransactionOptions) -> StoreResult<()>;

    async fn commit_transaction(&mut self) -> StoreResult<()>;

    /// Discards pending writes. Aborting without a transaction is a no-op.
    async fn abort_transaction(&mut self) -> StoreResult<()>;

    fn in_transaction(&self) -> bool;

    /// Creates the collection when it does not exist yet.
    async fn ensure_collection(&mut self, namespace: &Namespace) -> StoreResult<()>;

    /// All documents, in storage iteration order.
    async fn find_all(&mut self, namespace: &Namespace) -> StoreResult<Vec<Document>>;

    async fn find_by_id(
        &mut self,
        namespace: &Namespace,
        id: &str,
    ) -> StoreResult<Option<Document>>;

    /// Stores `document` under a freshly assigned id and returns that id.
    async fn insert_one(
        &mut self,
        namespace: &Namespace,
        document: Document,
    ) -> StoreResult<String>;

    async fn delete_by_id(&mut self, namespace: &Namespace, id: &str) -> StoreResult<DeleteResult>;

    /// Releases the session. A transaction still open is aborted.
    async fn close(&mut self);
}
