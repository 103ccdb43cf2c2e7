use airport_core::{Plane, StoreResult};
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::document::{decode, encode, DeleteResult, Namespace};
use crate::session::Session;

// Stored shape: { _id, model }
#[derive(Debug, Serialize, Deserialize)]
struct PlaneRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    model: String,
}

impl From<PlaneRecord> for Plane {
    fn from(record: PlaneRecord) -> Self {
        Plane {
            id: record.id,
            model: record.model,
        }
    }
}

/// Plain CRUD over the plane collection. Referential checks belong to the
/// service layer.
pub struct PlaneRepository<'s> {
    planes: Collection<'s>,
}

impl<'s> PlaneRepository<'s> {
    pub fn new(session: &'s mut dyn Session, namespace: &'s Namespace) -> Self {
        Self {
            planes: Collection::new(session, namespace),
        }
    }

    pub async fn find_all_planes(&mut self) -> StoreResult<Vec<Plane>> {
        let namespace = self.planes.namespace().clone();
        self.planes
            .find_all()
            .await?
            .into_iter()
            .map(|doc| decode::<PlaneRecord>(&namespace, doc).map(Plane::from))
            .collect()
    }

    pub async fn find_by_id(&mut self, id: &str) -> StoreResult<Option<Plane>> {
        match self.planes.find_by_id(id).await? {
            Some(doc) => Ok(Some(decode::<PlaneRecord>(self.planes.namespace(), doc)?.into())),
            None => Ok(None),
        }
    }

    /// Inserts the plane's model and returns the plane carrying its new id.
    pub async fn save_plane(&mut self, mut plane: Plane) -> StoreResult<Plane> {
        let record = PlaneRecord {
            id: None,
            model: plane.model.clone(),
        };
        let fields = encode(self.planes.namespace(), &record)?;
        plane.id = Some(self.planes.insert(fields).await?);
        Ok(plane)
    }

    pub async fn delete_plane(&mut self, plane: &Plane) -> StoreResult<DeleteResult> {
        self.planes.delete_by_id(plane.id().unwrap_or_default()).await
    }
}
