//! Unit-of-work coordinator.
//!
//! [`TransactionManager::do_in_transaction`] opens one session per call, hands
//! the unit of work a [`Repositories`] factory bound to that session, commits
//! or aborts, and always releases the session before returning.

use airport_core::{AirportError, AirportResult, StoreError};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::app_config::Config;
use crate::document::Namespace;
use crate::flight_repo::FlightRepository;
use crate::plane_repo::PlaneRepository;
use crate::session::{DocumentStore, Session, TransactionOptions};

/// Where planes and flights live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    pub planes: Namespace,
    pub flights: Namespace,
}

impl Namespaces {
    pub fn new(database: &str, plane_collection: &str, flight_collection: &str) -> Self {
        Self {
            planes: Namespace::new(database, plane_collection),
            flights: Namespace::new(database, flight_collection),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.database.name,
            &config.collections.plane,
            &config.collections.flight,
        )
    }
}

/// Repository factory bound to the session of one transaction.
pub struct Repositories {
    session: Box<dyn Session>,
    namespaces: Arc<Namespaces>,
}

impl Repositories {
    pub fn planes(&mut self) -> PlaneRepository<'_> {
        PlaneRepository::new(self.session.as_mut(), &self.namespaces.planes)
    }

    pub fn flights(&mut self) -> FlightRepository<'_> {
        FlightRepository::new(self.session.as_mut(), &self.namespaces)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per call, the first one included.
    pub max_attempts: u32,
    /// Deadline for a single attempt, commit included.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct TransactionManager {
    store: Arc<dyn DocumentStore>,
    namespaces: Arc<Namespaces>,
    options: TransactionOptions,
    retry: RetryPolicy,
}

impl TransactionManager {
    pub fn new(store: Arc<dyn DocumentStore>, namespaces: Namespaces) -> Self {
        Self {
            store,
            namespaces: Arc::new(namespaces),
            options: TransactionOptions::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self::new(store, Namespaces::from_config(config)).with_retry_policy(RetryPolicy {
            max_attempts: config.transaction.max_attempts.max(1),
            attempt_timeout: config.transaction.attempt_timeout(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Runs `work` inside one transaction.
    ///
    /// Domain errors returned by `work` abort the transaction and come back
    /// unchanged. Transient store failures (write conflicts, an unavailable
    /// store) rerun `work` from scratch in a fresh transaction until the retry
    /// policy is exhausted. `work` may therefore run more than once and must
    /// not have effects outside the repositories it is given.
    pub async fn do_in_transaction<T, F>(&self, mut work: F) -> AirportResult<T>
    where
        T: Send,
        F: for<'r> FnMut(&'r mut Repositories) -> BoxFuture<'r, AirportResult<T>> + Send,
    {
        let session = self.store.start_session().await?;
        let mut repositories = Repositories {
            session,
            namespaces: Arc::clone(&self.namespaces),
        };

        let outcome = self.run(&mut repositories, &mut work).await;
        repositories.session.close().await;

        if let Err(AirportError::Store(err)) = &outcome {
            error!(backend = self.store.backend(), error = %err, "transaction failed");
        }
        outcome
    }

    async fn run<T, F>(&self, repositories: &mut Repositories, work: &mut F) -> AirportResult<T>
    where
        T: Send,
        F: for<'r> FnMut(&'r mut Repositories) -> BoxFuture<'r, AirportResult<T>> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            repositories.session.start_transaction(&self.options).await?;

            let deadline = self.retry.attempt_timeout;
            let result = match tokio::time::timeout(deadline, work(&mut *repositories)).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(deadline).into()),
            };

            let failure = match result {
                Ok(value) => match repositories.session.commit_transaction().await {
                    Ok(()) => {
                        debug!(attempt, "transaction committed");
                        return Ok(value);
                    }
                    Err(err) => AirportError::from(err),
                },
                Err(err) => {
                    if let Err(abort) = repositories.session.abort_transaction().await {
                        warn!(error = %abort, "abort failed");
                    }
                    err
                }
            };

            if failure.is_transient() && attempt < self.retry.max_attempts {
                warn!(attempt, error = %failure, "transient failure, retrying transaction");
                continue;
            }
            return Err(failure);
        }
    }
}
