use chrono::{DateTime, Utc};

use crate::error::{FlightNotFound, PlaneNotFound};
use crate::flight::Flight;
use crate::plane::Plane;

/// Open time window: both bounds are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant > self.start && instant < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightFilter {
    Origin(String),
    Destination(String),
    DepartureWithin(DateRange),
    ArrivalWithin(DateRange),
    Plane(String),
}

impl FlightFilter {
    pub fn matches(&self, flight: &Flight) -> bool {
        match self {
            FlightFilter::Origin(origin) => flight.origin == *origin,
            FlightFilter::Destination(destination) => flight.destination == *destination,
            FlightFilter::DepartureWithin(range) => range.contains(flight.departure_date),
            FlightFilter::ArrivalWithin(range) => range.contains(flight.arrival_date),
            FlightFilter::Plane(plane_id) => flight.plane_id() == Some(plane_id.as_str()),
        }
    }

    /// The rejection reported when nothing matches.
    pub fn not_found(&self) -> FlightNotFound {
        match self {
            FlightFilter::Origin(_) => FlightNotFound::Origin,
            FlightFilter::Destination(_) => FlightNotFound::Destination,
            FlightFilter::DepartureWithin(_) => FlightNotFound::DepartureRange,
            FlightFilter::ArrivalWithin(_) => FlightNotFound::ArrivalRange,
            FlightFilter::Plane(_) => FlightNotFound::AssociatedPlane,
        }
    }

    /// Keeps matching flights in their original order, failing on an empty result.
    pub fn apply(&self, flights: Vec<Flight>) -> Result<Vec<Flight>, FlightNotFound> {
        let found: Vec<Flight> = flights.into_iter().filter(|f| self.matches(f)).collect();
        if found.is_empty() {
            Err(self.not_found())
        } else {
            Ok(found)
        }
    }
}

pub fn planes_by_model(planes: Vec<Plane>, model: &str) -> Result<Vec<Plane>, PlaneNotFound> {
    let found: Vec<Plane> = planes.into_iter().filter(|p| p.model == model).collect();
    if found.is_empty() {
        Err(PlaneNotFound::Model)
    } else {
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 2, hour, 0, 0).unwrap()
    }

    fn sample() -> Vec<Flight> {
        vec![
            Flight::new(at(6), at(8), "BLQ", "FCO", Plane::with_id("p-1", "A320"))
                .with_number("f-1"),
            Flight::new(at(9), at(11), "FCO", "BLQ", Plane::with_id("p-1", "A320"))
                .with_number("f-2"),
            Flight::new(at(7), at(12), "BLQ", "JFK", Plane::with_id("p-2", "B777"))
                .with_number("f-3"),
        ]
    }

    fn numbers(flights: &[Flight]) -> Vec<&str> {
        flights.iter().filter_map(|f| f.number()).collect()
    }

    #[test]
    fn test_filter_by_route() {
        let found = FlightFilter::Origin("BLQ".into()).apply(sample()).unwrap();
        assert_eq!(numbers(&found), ["f-1", "f-3"]);

        let found = FlightFilter::Destination("BLQ".into()).apply(sample()).unwrap();
        assert_eq!(numbers(&found), ["f-2"]);
    }

    #[test]
    fn test_range_bounds_are_exclusive() {
        let range = DateRange::new(at(6), at(9));
        let found = FlightFilter::DepartureWithin(range).apply(sample()).unwrap();
        assert_eq!(numbers(&found), ["f-3"]);

        let range = DateRange::new(at(8), at(12));
        let found = FlightFilter::ArrivalWithin(range).apply(sample()).unwrap();
        assert_eq!(numbers(&found), ["f-2"]);
    }

    #[test]
    fn test_filter_by_plane() {
        let found = FlightFilter::Plane("p-1".into()).apply(sample()).unwrap();
        assert_eq!(numbers(&found), ["f-1", "f-2"]);
    }

    #[test]
    fn test_empty_result_reports_filter_kind() {
        let err = FlightFilter::Origin("ZRH".into()).apply(sample()).unwrap_err();
        assert_eq!(err.to_string(), "There aren't flights with this origin");

        let range = DateRange::new(at(20), at(23));
        let err = FlightFilter::ArrivalWithin(range).apply(sample()).unwrap_err();
        assert_eq!(err, FlightNotFound::ArrivalRange);

        let err = FlightFilter::Plane("p-9".into()).apply(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "There aren't flights associates with selected plane");
    }

    #[test]
    fn test_planes_by_model() {
        let planes = vec![
            Plane::with_id("p-1", "A320"),
            Plane::with_id("p-2", "B777"),
            Plane::with_id("p-3", "A320"),
        ];
        let found = planes_by_model(planes.clone(), "A320").unwrap();
        assert_eq!(found, vec![planes[0].clone(), planes[2].clone()]);

        assert_eq!(planes_by_model(planes, "a320"), Err(PlaneNotFound::Model));
    }
}
