use airport_core::AirportResult;
use airport_store::{Config, TransactionManager};
use tracing::info;

/// Scheduling, consistency and search operations over planes and flights.
///
/// Holds no state of its own: every operation runs as exactly one transaction
/// through the [`TransactionManager`]. The operations are split by concern
/// across the `planes`, `flights` and `search` modules.
///
/// Validation and insert are serialized only by the store's transaction
/// isolation. Two concurrent saves for overlapping intervals on one plane both
/// pass validation; the store then rejects one commit as a write conflict and
/// the coordinator reruns it, at which point it sees the other flight.
#[derive(Clone)]
pub struct AirportService {
    pub(crate) transactions: TransactionManager,
}

impl AirportService {
    pub fn new(transactions: TransactionManager) -> Self {
        Self { transactions }
    }

    /// Opens the configured store and wires the coordinator.
    pub async fn from_config(config: &Config) -> AirportResult<Self> {
        let store = airport_store::connect(&config.database).await?;
        info!(
            backend = store.backend(),
            planes = %config.collections.plane,
            flights = %config.collections.flight,
            "Airport service ready"
        );
        Ok(Self::new(TransactionManager::from_config(store, config)))
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }
}

/// Logs a domain rejection before handing the result back to the caller.
pub(crate) fn observe<T>(operation: &'static str, result: AirportResult<T>) -> AirportResult<T> {
    if let Err(err) = &result {
        if err.is_domain() {
            tracing::warn!(operation, reason = %err, "request rejected");
        }
    }
    result
}
