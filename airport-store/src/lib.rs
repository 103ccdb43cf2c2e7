pub mod app_config;
pub mod collection;
pub mod database;
pub mod document;
pub mod flight_repo;
pub mod memory;
pub mod plane_repo;
pub mod session;
pub mod transaction;

use airport_core::StoreResult;
use std::sync::Arc;
use tracing::info;

pub use app_config::{Config, StoreBackend};
pub use database::PostgresStore;
pub use document::{DeleteResult, Document, Namespace};
pub use flight_repo::FlightRepository;
pub use memory::MemoryStore;
pub use plane_repo::PlaneRepository;
pub use session::{DocumentStore, Session, TransactionOptions};
pub use transaction::{Namespaces, Repositories, RetryPolicy, TransactionManager};

/// Builds the document store selected by `config.backend`.
pub async fn connect(config: &app_config::DatabaseConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    info!(backend = ?config.backend, database = %config.name, "Opening document store");
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(config)
                .await
                .map_err(database::store_error)?;
            Ok(Arc::new(store))
        }
    }
}
