pub mod error;
pub mod flight;
pub mod plane;
pub mod schedule;
pub mod search;

pub use error::{
    AirportError, AirportResult, FlightNotFound, InconsistentData, Overlap, PlaneNotFound,
    StoreError, StoreResult,
};
pub use flight::Flight;
pub use plane::Plane;
