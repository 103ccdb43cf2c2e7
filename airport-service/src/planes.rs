use airport_core::{AirportError, AirportResult, Plane, PlaneNotFound};
use tracing::{debug, info};

use crate::service::{observe, AirportService};

impl AirportService {
    /// Stores a new plane; no validation is applied to the model.
    pub async fn save_plane(&self, model: impl Into<String>) -> AirportResult<Plane> {
        let plane = Plane::new(model);
        let saved = self
            .transactions
            .do_in_transaction(move |repos| {
                let plane = plane.clone();
                Box::pin(async move { Ok(repos.planes().save_plane(plane).await?) })
            })
            .await?;

        info!(plane = %saved, "Plane saved");
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: &str) -> AirportResult<Option<Plane>> {
        let id = id.to_string();
        self.transactions
            .do_in_transaction(move |repos| {
                let id = id.clone();
                Box::pin(async move { Ok(repos.planes().find_by_id(&id).await?) })
            })
            .await
    }

    pub async fn find_all_planes(&self) -> AirportResult<Vec<Plane>> {
        self.transactions
            .do_in_transaction(|repos| {
                Box::pin(async move { Ok(repos.planes().find_all_planes().await?) })
            })
            .await
    }

    /// Deletes a plane that exists and that no flight is assigned to.
    ///
    /// Flights are scanned in storage order and the first one referencing the
    /// plane is named in the rejection.
    pub async fn delete_plane(&self, plane: &Plane) -> AirportResult<()> {
        let target = plane.clone();
        let result = self
            .transactions
            .do_in_transaction(move |repos| {
                let plane = target.clone();
                Box::pin(async move {
                    let id = plane.id_or_null().to_string();
                    if repos.planes().find_by_id(&id).await?.is_none() {
                        return Err(PlaneNotFound::Id(id).into());
                    }

                    let flights = repos.flights().find_all_flights().await?;
                    let assigned = flights.iter().find(|f| f.plane_id() == Some(id.as_str()));
                    if let Some(flight) = assigned {
                        return Err(AirportError::PlaneWithAssociateFlight {
                            flight_number: flight.number_or_null().to_string(),
                        });
                    }

                    let deleted = repos.planes().delete_plane(&plane).await?;
                    debug!(id = %id, deleted = deleted.deleted_count, "plane removed");
                    Ok(())
                })
            })
            .await;

        if result.is_ok() {
            info!(plane = %plane, "Plane deleted");
        }
        observe("delete_plane", result)
    }
}
