//! Error taxonomy shared by the store and the service layer.
//!
//! Every domain variant renders the exact message callers have always been
//! shown, so a front end can display `err.to_string()` unchanged.

use std::time::Duration;

/// Malformed input rejected before any scheduling check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InconsistentData {
    #[error("departure or arrival date is wrong")]
    Dates,
    #[error("origin or destination is wrong")]
    Route,
}

/// The plane is already in service: one of the four overlap cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Overlap {
    #[error("This plane is already in service. Departure or arrival date are equals to exsisting flight.")]
    SameEndpoint,
    #[error("This plane is already in service. Departure date is between dates of existing flight")]
    DepartureInside,
    #[error("This plane is already in service. Arrival date is between dates of existing flight")]
    ArrivalInside,
    #[error("This plane is already in service. Departure date is before and arrival date is after dates of existing flight")]
    Encloses,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlightNotFound {
    #[error("No existing flight with num {0}")]
    Number(String),
    #[error("There aren't flights with this origin")]
    Origin,
    #[error("There aren't flights with this destination")]
    Destination,
    #[error("There aren't flights with departure date in the selected range")]
    DepartureRange,
    #[error("There aren't flights with arrival date in the selected range")]
    ArrivalRange,
    #[error("There aren't flights associates with selected plane")]
    AssociatedPlane,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaneNotFound {
    #[error("No existing plane with id {0}")]
    Id(String),
    #[error("There aren't planes with insert model")]
    Model,
}

/// Failures of the document store itself, as opposed to domain rejections.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no transaction in progress on this session")]
    NoTransaction,

    #[error("a transaction is already in progress on this session")]
    TransactionInProgress,

    #[error("write conflict: {0}")]
    WriteConflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("transaction attempt exceeded {0:?}")]
    Timeout(Duration),

    #[error("invalid namespace `{0}`")]
    InvalidNamespace(String),

    #[error("unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("malformed document in {collection}: {reason}")]
    Malformed { collection: String, reason: String },

    #[error("flight {flight} references missing plane {plane_id}")]
    DanglingPlane { flight: String, plane_id: String },

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether running the whole transaction again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::WriteConflict(_) | StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum AirportError {
    #[error(transparent)]
    InconsistentData(#[from] InconsistentData),

    #[error(transparent)]
    PlaneAlreadyInService(#[from] Overlap),

    #[error(transparent)]
    FlightNotFound(#[from] FlightNotFound),

    #[error(transparent)]
    PlaneNotFound(#[from] PlaneNotFound),

    #[error("Impossible to delete. There is the flight {flight_number} associates with this plane")]
    PlaneWithAssociateFlight { flight_number: String },

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl AirportError {
    /// Domain rejections are final: retrying the same request cannot succeed.
    pub fn is_domain(&self) -> bool {
        !matches!(self, AirportError::Store(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, AirportError::Store(err) if err.is_transient())
    }
}

pub type AirportResult<T> = Result<T, AirportError>;
