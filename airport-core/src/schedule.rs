//! Scheduling rules for a candidate flight.
//!
//! A plane may only fly one flight at a time. The candidate is first checked on
//! its own (date order, route), then against every existing flight of the same
//! plane in list order; the first conflicting flight decides the rejection.

use crate::error::{AirportResult, InconsistentData, Overlap};
use crate::flight::Flight;

/// Checks that the flight makes sense on its own.
pub fn check_itinerary(flight: &Flight) -> Result<(), InconsistentData> {
    if flight.arrival_date <= flight.departure_date {
        return Err(InconsistentData::Dates);
    }
    if flight.origin == flight.destination {
        return Err(InconsistentData::Route);
    }
    Ok(())
}

impl Overlap {
    /// Classifies how `candidate` collides with `existing`, if at all.
    ///
    /// Plane identity is not considered here. Intervals touching at opposite
    /// endpoints (one arrives exactly when the other departs) do not collide.
    pub fn between(candidate: &Flight, existing: &Flight) -> Option<Overlap> {
        let (dep, arr) = (candidate.departure_date, candidate.arrival_date);
        let (start, end) = (existing.departure_date, existing.arrival_date);

        if dep == start || arr == end {
            Some(Overlap::SameEndpoint)
        } else if dep > start && dep < end {
            Some(Overlap::DepartureInside)
        } else if arr > start && arr < end {
            Some(Overlap::ArrivalInside)
        } else if dep < start && arr > end {
            Some(Overlap::Encloses)
        } else {
            None
        }
    }
}

/// Finds the first flight of the candidate's plane that conflicts with it.
pub fn first_conflict<'a, I>(candidate: &Flight, existing: I) -> Option<(&'a Flight, Overlap)>
where
    I: IntoIterator<Item = &'a Flight>,
{
    existing
        .into_iter()
        .filter(|flight| flight.shares_plane_with(candidate))
        .find_map(|flight| Overlap::between(candidate, flight).map(|overlap| (flight, overlap)))
}

/// Runs the full validation pipeline in its fixed order.
pub fn validate<'a, I>(candidate: &Flight, existing: I) -> AirportResult<()>
where
    I: IntoIterator<Item = &'a Flight>,
{
    check_itinerary(candidate)?;
    match first_conflict(candidate, existing) {
        Some((_, overlap)) => Err(overlap.into()),
        None => Ok(()),
    }
}
