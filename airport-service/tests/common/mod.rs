#![allow(dead_code)]

use std::sync::{Arc, Once};

use airport_core::{Flight, Plane};
use airport_service::AirportService;
use airport_store::{MemoryStore, Namespaces, TransactionManager};
use chrono::{DateTime, TimeZone, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "airport_service=debug,airport_store=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub fn service() -> (AirportService, MemoryStore) {
    init_tracing();
    let store = MemoryStore::new();
    let transactions = TransactionManager::new(
        Arc::new(store.clone()),
        Namespaces::new("airport", "plane", "flight"),
    );
    (AirportService::new(transactions), store)
}

/// 2024-06-01 at `hour`:00 UTC.
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

pub fn flight(dep: u32, arr: u32, plane: &Plane) -> Flight {
    Flight::new(at(dep), at(arr), "FCO", "LHR", plane.clone())
}
