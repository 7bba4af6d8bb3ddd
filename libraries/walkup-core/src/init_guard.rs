//! Single-flight initialization guard
//!
//! Expensive async setup (device handshakes, SDK loading) must run at most
//! once at a time per subsystem, and every caller that shows up while it is
//! running should share the outcome instead of starting a second run.
//!
//! ```text
//! caller A ──ensure──▶ [initializing] ──run──────────▶ Performed(v)
//! caller B ──ensure──▶ queued ─────────────────────────▶ Joined(v)
//! caller C ──ensure──▶ queued ─────────────────────────▶ Joined(v)
//! caller D ──ensure──▶ [initialized] ─────────────────▶ AlreadyInitialized(v)
//! ```
//!
//! The guard is a plain value owned by whoever builds the application and
//! injected where needed; there is no process-wide registry.

use crate::error::WalkupError;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// How a successful `ensure_initialized` call was satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome<T> {
    /// This call ran the initializer
    Performed(T),
    /// Another call was already running it; this one waited for its result
    Joined(T),
    /// A previous run had already succeeded
    AlreadyInitialized(T),
}

impl<T> InitOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Performed(v) | Self::Joined(v) | Self::AlreadyInitialized(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Performed(v) | Self::Joined(v) | Self::AlreadyInitialized(v) => v,
        }
    }

    pub fn is_performed(&self) -> bool {
        matches!(self, Self::Performed(_))
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }
}

/// Initialization failures, delivered identically to every waiting caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The initializer returned an error
    #[error("{name} failed to initialize: {message}")]
    Failed { name: String, message: String },

    /// `reset` ran while this caller was waiting
    #[error("{0} was reset before initialization finished")]
    Reset(String),

    /// The caller running the initializer was dropped mid-run
    #[error("{0} initialization was cancelled")]
    Cancelled(String),
}

impl From<InitError> for WalkupError {
    fn from(err: InitError) -> Self {
        WalkupError::Initialization(err.to_string())
    }
}

/// Read-only view of one guarded subsystem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitStatus {
    pub initialized: bool,
    pub initializing: bool,
    /// Message of the last failed run, cleared by a later success or reset
    pub error: Option<String>,
    /// Callers currently queued behind the in-flight run
    pub waiters: usize,
}

type Waiter<T> = oneshot::Sender<Result<T, InitError>>;

struct InitRecord<T> {
    /// `Some` once a run has succeeded
    value: Option<T>,
    initializing: bool,
    error: Option<String>,
    waiters: VecDeque<Waiter<T>>,
    /// Bumped by `reset` so a run that straddles it cannot publish
    generation: u64,
}

impl<T> Default for InitRecord<T> {
    fn default() -> Self {
        Self {
            value: None,
            initializing: false,
            error: None,
            waiters: VecDeque::new(),
            generation: 0,
        }
    }
}

enum Step<T> {
    Ready(T),
    Wait(oneshot::Receiver<Result<T, InitError>>),
    Run(u64),
}

/// Per-name single-flight initializer with cached success
pub struct InitGuard<T> {
    records: Mutex<HashMap<String, InitRecord<T>>>,
}

impl<T> Default for InitGuard<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> fmt::Debug for InitGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.records().keys().cloned().collect();
        f.debug_struct("InitGuard").field("names", &names).finish()
    }
}

impl<T: Clone + Send> InitGuard<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `initializer` for `name` unless it already ran or is running
    ///
    /// The initializer is only invoked when no run is in flight and no run
    /// has succeeded yet. Errors are never retried here.
    pub async fn ensure_initialized<F, Fut, E>(
        &self,
        name: &str,
        initializer: F,
    ) -> Result<InitOutcome<T>, InitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let step = {
            let mut records = self.records();
            let record = records.entry(name.to_string()).or_default();

            if let Some(value) = &record.value {
                Step::Ready(value.clone())
            } else if record.initializing {
                let (tx, rx) = oneshot::channel();
                record.waiters.push_back(tx);
                debug!(
                    subsystem = name,
                    waiters = record.waiters.len(),
                    "Joining in-flight initialization"
                );
                Step::Wait(rx)
            } else {
                record.initializing = true;
                Step::Run(record.generation)
            }
        };

        match step {
            Step::Ready(value) => Ok(InitOutcome::AlreadyInitialized(value)),
            Step::Wait(rx) => match rx.await {
                Ok(result) => result.map(InitOutcome::Joined),
                Err(_) => Err(InitError::Cancelled(name.to_string())),
            },
            Step::Run(generation) => self.run(name, generation, initializer).await,
        }
    }

    async fn run<F, Fut, E>(
        &self,
        name: &str,
        generation: u64,
        initializer: F,
    ) -> Result<InitOutcome<T>, InitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        debug!(subsystem = name, "Running initializer");
        let mut pending = PendingRun {
            guard: self,
            name,
            generation,
            armed: true,
        };

        let result = initializer().await.map_err(|e| InitError::Failed {
            name: name.to_string(),
            message: e.to_string(),
        });
        pending.armed = false;

        if self.settle(name, generation, &result) {
            match &result {
                Ok(_) => info!(subsystem = name, "Initialized"),
                Err(e) => warn!(subsystem = name, error = %e, "Initialization failed"),
            }
            result.map(InitOutcome::Performed)
        } else {
            debug!(subsystem = name, "Discarding initializer result after reset");
            Err(InitError::Reset(name.to_string()))
        }
    }

    /// Publish a finished run to the record and its waiters
    ///
    /// Returns false when the record was reset while the run was in flight.
    fn settle(&self, name: &str, generation: u64, result: &Result<T, InitError>) -> bool {
        let waiters = {
            let mut records = self.records();
            let Some(record) = records.get_mut(name) else {
                return false;
            };
            if record.generation != generation {
                return false;
            }

            record.initializing = false;
            match result {
                Ok(value) => {
                    record.value = Some(value.clone());
                    record.error = None;
                }
                Err(InitError::Failed { message, .. }) => {
                    record.error = Some(message.clone());
                }
                Err(other) => record.error = Some(other.to_string()),
            }
            std::mem::take(&mut record.waiters)
        };

        for waiter in waiters {
            // A waiter whose caller went away is simply skipped
            let _ = waiter.send(result.clone());
        }
        true
    }

    /// Forget `name`'s state, rejecting anyone still waiting on it
    pub fn reset(&self, name: &str) {
        let waiters = {
            let mut records = self.records();
            match records.get_mut(name) {
                Some(record) => Self::clear(record),
                None => return,
            }
        };

        info!(subsystem = name, rejected = waiters.len(), "Initialization state reset");
        for waiter in waiters {
            let _ = waiter.send(Err(InitError::Reset(name.to_string())));
        }
    }

    /// Reset every guarded subsystem (e.g. on logout)
    pub fn reset_all(&self) {
        let rejected: Vec<(String, VecDeque<Waiter<T>>)> = {
            let mut records = self.records();
            records
                .iter_mut()
                .map(|(name, record)| (name.clone(), Self::clear(record)))
                .collect()
        };

        for (name, waiters) in rejected {
            for waiter in waiters {
                let _ = waiter.send(Err(InitError::Reset(name.clone())));
            }
        }
        info!("All initialization state reset");
    }

    fn clear(record: &mut InitRecord<T>) -> VecDeque<Waiter<T>> {
        record.value = None;
        record.initializing = false;
        record.error = None;
        record.generation += 1;
        std::mem::take(&mut record.waiters)
    }

    /// Snapshot of `name`'s state; never mutates
    pub fn status(&self, name: &str) -> InitStatus {
        self.records()
            .get(name)
            .map(|record| InitStatus {
                initialized: record.value.is_some(),
                initializing: record.initializing,
                error: record.error.clone(),
                waiters: record.waiters.len(),
            })
            .unwrap_or_default()
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.records()
            .get(name)
            .is_some_and(|record| record.value.is_some())
    }

    /// Cached result of the last successful run
    pub fn value(&self, name: &str) -> Option<T> {
        self.records()
            .get(name)
            .and_then(|record| record.value.clone())
    }
}

impl<T> InitGuard<T> {
    fn records(&self) -> MutexGuard<'_, HashMap<String, InitRecord<T>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rolls the record back if the running caller is dropped before settling
struct PendingRun<'a, T> {
    guard: &'a InitGuard<T>,
    name: &'a str,
    generation: u64,
    armed: bool,
}

impl<T> Drop for PendingRun<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let waiters = {
            let mut records = self.guard.records();
            match records.get_mut(self.name) {
                Some(record) if record.generation == self.generation => {
                    record.initializing = false;
                    std::mem::take(&mut record.waiters)
                }
                _ => return,
            }
        };

        warn!(subsystem = self.name, "Initializer dropped before completing");
        for waiter in waiters {
            let _ = waiter.send(Err(InitError::Cancelled(self.name.to_string())));
        }
    }
}
