//! Read-only lookups. Each one loads a full collection inside a single
//! transaction and filters it in memory, preserving storage order. An empty
//! result is reported as a not-found rejection rather than an empty list.

use airport_core::search::{planes_by_model, DateRange, FlightFilter};
use airport_core::{AirportResult, Flight, Plane};
use chrono::{DateTime, Utc};

use crate::service::{observe, AirportService};

impl AirportService {
    pub async fn find_all_flights_by_origin(&self, origin: &str) -> AirportResult<Vec<Flight>> {
        self.search_flights("find_all_flights_by_origin", FlightFilter::Origin(origin.to_string()))
            .await
    }

    pub async fn find_all_flights_by_destination(
        &self,
        destination: &str,
    ) -> AirportResult<Vec<Flight>> {
        self.search_flights(
            "find_all_flights_by_destination",
            FlightFilter::Destination(destination.to_string()),
        )
        .await
    }

    /// Flights departing strictly between `start` and `end`.
    pub async fn find_all_flights_with_departure_date_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AirportResult<Vec<Flight>> {
        self.search_flights(
            "find_all_flights_with_departure_date_in_range",
            FlightFilter::DepartureWithin(DateRange::new(start, end)),
        )
        .await
    }

    /// Flights arriving strictly between `start` and `end`.
    pub async fn find_all_flights_with_arrival_date_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AirportResult<Vec<Flight>> {
        self.search_flights(
            "find_all_flights_with_arrival_date_in_range",
            FlightFilter::ArrivalWithin(DateRange::new(start, end)),
        )
        .await
    }

    pub async fn find_all_flights_associated_with_plane(
        &self,
        plane_id: &str,
    ) -> AirportResult<Vec<Flight>> {
        self.search_flights(
            "find_all_flights_associated_with_plane",
            FlightFilter::Plane(plane_id.to_string()),
        )
        .await
    }

    pub async fn find_all_planes_by_model(&self, model: &str) -> AirportResult<Vec<Plane>> {
        let model = model.to_string();
        let result = self
            .transactions
            .do_in_transaction(move |repos| {
                let model = model.clone();
                Box::pin(async move {
                    let planes = repos.planes().find_all_planes().await?;
                    Ok(planes_by_model(planes, &model)?)
                })
            })
            .await;
        observe("find_all_planes_by_model", result)
    }

    async fn search_flights(
        &self,
        operation: &'static str,
        filter: FlightFilter,
    ) -> AirportResult<Vec<Flight>> {
        let result = self
            .transactions
            .do_in_transaction(move |repos| {
                let filter = filter.clone();
                Box::pin(async move {
                    let flights = repos.flights().find_all_flights().await?;
                    Ok(filter.apply(flights)?)
                })
            })
            .await;
        observe(operation, result)
    }
}
