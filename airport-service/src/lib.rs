pub mod flights;
pub mod planes;
pub mod search;
pub mod service;

pub use service::AirportService;
