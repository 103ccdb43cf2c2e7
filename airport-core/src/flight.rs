use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plane::Plane;

/// A scheduled flight with its plane fully resolved.
///
/// `number` is the store-assigned identifier; it is `None` until the flight
/// has been saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flight {
    pub number: Option<String>,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub origin: String,
    pub destination: String,
    pub plane: Plane,
}

impl Flight {
    pub fn new(
        departure_date: DateTime<Utc>,
        arrival_date: DateTime<Utc>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        plane: Plane,
    ) -> Self {
        Self {
            number: None,
            departure_date,
            arrival_date,
            origin: origin.into(),
            destination: destination.into(),
            plane,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    /// The number as shown to users: `null` for an unsaved flight.
    pub fn number_or_null(&self) -> &str {
        self.number().unwrap_or("null")
    }

    pub fn plane_id(&self) -> Option<&str> {
        self.plane.id()
    }

    /// True when both flights are assigned to the same saved plane.
    pub fn shares_plane_with(&self, other: &Flight) -> bool {
        matches!((self.plane_id(), other.plane_id()), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flight_num={}, departure_date={}, arrival_date={}, \
             origin={}, destination={}, plane[{}]",
            self.number_or_null(),
            self.departure_date.to_rfc3339(),
            self.arrival_date.to_rfc3339(),
            self.origin,
            self.destination,
            self.plane
        )
    }
}
