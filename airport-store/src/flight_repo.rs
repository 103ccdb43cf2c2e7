use airport_core::{Flight, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::document::{decode, encode, DeleteResult, Document};
use crate::plane_repo::PlaneRepository;
use crate::session::Session;
use crate::transaction::Namespaces;

// Stored shape: { _id, departure_date, arrival_date, origin, destination, plane_id }
#[derive(Debug, Serialize, Deserialize)]
struct FlightRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    departure_date: DateTime<Utc>,
    arrival_date: DateTime<Utc>,
    origin: String,
    destination: String,
    plane_id: String,
}

/// CRUD over the flight collection.
///
/// Only the plane id is persisted; reads resolve it back into the full plane
/// through [`PlaneRepository`] on the same session.
pub struct FlightRepository<'s> {
    session: &'s mut dyn Session,
    namespaces: &'s Namespaces,
}

impl<'s> FlightRepository<'s> {
    pub fn new(session: &'s mut dyn Session, namespaces: &'s Namespaces) -> Self {
        Self { session, namespaces }
    }

    fn flights(&mut self) -> Collection<'_> {
        Collection::new(&mut *self.session, &self.namespaces.flights)
    }

    fn planes(&mut self) -> PlaneRepository<'_> {
        PlaneRepository::new(&mut *self.session, &self.namespaces.planes)
    }

    async fn resolve(&mut self, doc: Document) -> StoreResult<Flight> {
        let record: FlightRecord = decode(&self.namespaces.flights, doc)?;
        let plane = self
            .planes()
            .find_by_id(&record.plane_id)
            .await?
            .ok_or_else(|| StoreError::DanglingPlane {
                flight: record.id.clone().unwrap_or_default(),
                plane_id: record.plane_id.clone(),
            })?;

        Ok(Flight {
            number: record.id,
            departure_date: record.departure_date,
            arrival_date: record.arrival_date,
            origin: record.origin,
            destination: record.destination,
            plane,
        })
    }

    pub async fn find_all_flights(&mut self) -> StoreResult<Vec<Flight>> {
        let docs = self.flights().find_all().await?;
        let mut flights = Vec::with_capacity(docs.len());
        for doc in docs {
            flights.push(self.resolve(doc).await?);
        }
        Ok(flights)
    }

    pub async fn find_by_num(&mut self, number: &str) -> StoreResult<Option<Flight>> {
        match self.flights().find_by_id(number).await? {
            Some(doc) => Ok(Some(self.resolve(doc).await?)),
            None => Ok(None),
        }
    }

    /// Inserts the flight with a reference to its plane and returns the flight
    /// carrying its new number.
    pub async fn save_flight(&mut self, mut flight: Flight) -> StoreResult<Flight> {
        let record = FlightRecord {
            id: None,
            departure_date: flight.departure_date,
            arrival_date: flight.arrival_date,
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            plane_id: flight.plane_id().unwrap_or_default().to_string(),
        };
        let fields = encode(&self.namespaces.flights, &record)?;
        flight.number = Some(self.flights().insert(fields).await?);
        Ok(flight)
    }

    pub async fn delete_flight(&mut self, flight: &Flight) -> StoreResult<DeleteResult> {
        self.flights()
            .delete_by_id(flight.number().unwrap_or_default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::session::{DocumentStore, TransactionOptions};
    use airport_core::Plane;
    use chrono::TimeZone;
    use serde_json::Value;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 14, hour, 30, 0).unwrap()
    }

    async fn open(store: &MemoryStore) -> Box<dyn Session> {
        let mut session = store.start_session().await.unwrap();
        session.start_transaction(&TransactionOptions::default()).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_save_stores_plane_reference() {
        let store = MemoryStore::new();
        let names = Namespaces::new("airport", "plane", "flight");
        let mut session = open(&store).await;

        let plane = PlaneRepository::new(session.as_mut(), &names.planes)
            .save_plane(Plane::new("A321"))
            .await
            .unwrap();
        let flight = FlightRepository::new(session.as_mut(), &names)
            .save_flight(Flight::new(at(7), at(9), "NAP", "TRN", plane.clone()))
            .await
            .unwrap();
        session.commit_transaction().await.unwrap();

        let stored = store.documents(&names.flights);
        assert_eq!(stored.len(), 1);
        let doc = &stored[0];
        assert_eq!(doc.get("_id").and_then(Value::as_str), flight.number());
        assert_eq!(doc.get("plane_id").and_then(Value::as_str), plane.id());
        assert_eq!(doc.get("origin"), Some(&Value::from("NAP")));
        assert!(doc.get("plane").is_none());
        assert!(doc.contains_key("departure_date"));
        assert!(doc.contains_key("arrival_date"));
    }

    #[tokio::test]
    async fn test_reads_resolve_plane() {
        let store = MemoryStore::new();
        let names = Namespaces::new("airport", "plane", "flight");
        let mut session = open(&store).await;

        let plane = PlaneRepository::new(session.as_mut(), &names.planes)
            .save_plane(Plane::new("E195"))
            .await
            .unwrap();
        let mut flights = FlightRepository::new(session.as_mut(), &names);
        let saved = flights
            .save_flight(Flight::new(at(7), at(9), "NAP", "TRN", plane.clone()))
            .await
            .unwrap();

        let found = flights.find_by_num(saved.number().unwrap()).await.unwrap();
        assert_eq!(found, Some(saved.clone()));
        assert_eq!(found.unwrap().plane, plane);
        assert_eq!(flights.find_all_flights().await.unwrap(), vec![saved.clone()]);
        assert_eq!(flights.find_by_num("nope").await.unwrap(), None);

        assert!(flights.delete_flight(&saved).await.unwrap().deleted());
        assert!(flights.find_all_flights().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_removal_is_a_conflict_not_a_dangling_plane() {
        let store = MemoryStore::new();
        let names = Namespaces::new("airport", "plane", "flight");

        let mut setup = open(&store).await;
        let plane = PlaneRepository::new(setup.as_mut(), &names.planes)
            .save_plane(Plane::new("A319"))
            .await
            .unwrap();
        let flight = FlightRepository::new(setup.as_mut(), &names)
            .save_flight(Flight::new(at(7), at(9), "NAP", "TRN", plane.clone()))
            .await
            .unwrap();
        setup.commit_transaction().await.unwrap();

        let mut reader = open(&store).await;
        assert_eq!(reader.find_all(&names.flights).await.unwrap().len(), 1);

        let mut remover = open(&store).await;
        FlightRepository::new(remover.as_mut(), &names)
            .delete_flight(&flight)
            .await
            .unwrap();
        PlaneRepository::new(remover.as_mut(), &names.planes)
            .delete_plane(&plane)
            .await
            .unwrap();
        remover.commit_transaction().await.unwrap();

        let seen = FlightRepository::new(reader.as_mut(), &names)
            .find_all_flights()
            .await
            .unwrap();
        assert_eq!(seen, vec![flight]);
        assert!(matches!(
            reader.commit_transaction().await,
            Err(StoreError::WriteConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_plane_is_reported() {
        let store = MemoryStore::new();
        let names = Namespaces::new("airport", "plane", "flight");
        let mut session = open(&store).await;

        let ghost = Plane::with_id("gone", "A320");
        let mut flights = FlightRepository::new(session.as_mut(), &names);
        let saved = flights
            .save_flight(Flight::new(at(7), at(9), "NAP", "TRN", ghost))
            .await
            .unwrap();

        match flights.find_all_flights().await {
            Err(StoreError::DanglingPlane { flight, plane_id }) => {
                assert_eq!(Some(flight.as_str()), saved.number());
                assert_eq!(plane_id, "gone");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
