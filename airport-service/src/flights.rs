use airport_core::schedule;
use airport_core::{AirportResult, Flight, FlightNotFound, PlaneNotFound};
use tracing::info;

use crate::service::{observe, AirportService};

impl AirportService {
    /// Validates and stores a flight, returning it with its assigned number.
    ///
    /// The candidate is checked on its own first, then against every stored
    /// flight of the same plane, then the plane itself must exist.
    pub async fn save_flight(&self, flight: Flight) -> AirportResult<Flight> {
        let candidate = flight;
        let result = self
            .transactions
            .do_in_transaction(move |repos| {
                let flight = candidate.clone();
                Box::pin(async move {
                    let existing = repos.flights().find_all_flights().await?;
                    schedule::validate(&flight, &existing)?;

                    let plane_id = flight.plane.id_or_null().to_string();
                    if repos.planes().find_by_id(&plane_id).await?.is_none() {
                        return Err(PlaneNotFound::Id(plane_id).into());
                    }

                    Ok(repos.flights().save_flight(flight).await?)
                })
            })
            .await;

        if let Ok(saved) = &result {
            info!(flight = %saved, "Flight saved");
        }
        observe("save_flight", result)
    }

    pub async fn find_by_num(&self, number: &str) -> AirportResult<Option<Flight>> {
        let number = number.to_string();
        self.transactions
            .do_in_transaction(move |repos| {
                let number = number.clone();
                Box::pin(async move { Ok(repos.flights().find_by_num(&number).await?) })
            })
            .await
    }

    pub async fn find_all_flights(&self) -> AirportResult<Vec<Flight>> {
        self.transactions
            .do_in_transaction(|repos| {
                Box::pin(async move { Ok(repos.flights().find_all_flights().await?) })
            })
            .await
    }

    pub async fn delete_flight(&self, flight: &Flight) -> AirportResult<()> {
        let number = flight.number_or_null().to_string();
        let target = flight.clone();
        let result = self
            .transactions
            .do_in_transaction(move |repos| {
                let flight = target.clone();
                Box::pin(async move {
                    let number = flight.number_or_null().to_string();
                    if repos.flights().find_by_num(&number).await?.is_none() {
                        return Err(FlightNotFound::Number(number).into());
                    }
                    repos.flights().delete_flight(&flight).await?;
                    Ok(())
                })
            })
            .await;

        if result.is_ok() {
            info!(number = %number, "Flight deleted");
        }
        observe("delete_flight", result)
    }
}
