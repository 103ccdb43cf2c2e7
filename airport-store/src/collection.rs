use airport_core::StoreResult;

use crate::document::{DeleteResult, Document, Namespace};
use crate::session::Session;

/// One collection seen through the caller's session.
///
/// The collection is created on first use; every call runs inside whatever
/// transaction the session currently has open.
pub struct Collection<'s> {
    session: &'s mut dyn Session,
    namespace: &'s Namespace,
}

impl<'s> Collection<'s> {
    pub fn new(session: &'s mut dyn Session, namespace: &'s Namespace) -> Self {
        Self { session, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        self.namespace
    }

    pub async fn find_all(&mut self) -> StoreResult<Vec<Document>> {
        self.session.ensure_collection(self.namespace).await?;
        self.session.find_all(self.namespace).await
    }

    pub async fn find_by_id(&mut self, id: &str) -> StoreResult<Option<Document>> {
        self.session.ensure_collection(self.namespace).await?;
        self.session.find_by_id(self.namespace, id).await
    }

    /// Stores `fields` and returns the id the store assigned.
    pub async fn insert(&mut self, fields: Document) -> StoreResult<String> {
        self.session.ensure_collection(self.namespace).await?;
        self.session.insert_one(self.namespace, fields).await
    }

    pub async fn delete_by_id(&mut self, id: &str) -> StoreResult<DeleteResult> {
        self.session.ensure_collection(self.namespace).await?;
        self.session.delete_by_id(self.namespace, id).await
    }
}
