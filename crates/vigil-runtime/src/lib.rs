//! Vigil runtime.
//!
//! Spawns one guard thread and `N` student threads around a room
//! coordinator, waits for the guard to finish its checks, then shuts the
//! students down cooperatively.
//!
//! ## Architecture
//!
//! ```text
//! vigil-runtime
//!   ├─ Runtime          (spawn, join, shutdown sequencing)
//!   ├─ GuardActor       (num_checks inspections, then stop)
//!   ├─ StudentActor     (enter / study / leave until shutdown)
//!   ├─ TracingObserver  (room events -> event log)
//!   └─ SystemEnv        (real clock and sleeps)
//! ```
//!
//! ## Shutdown
//!
//! 1. The guard returns after its last patrol
//! 2. The shared `CancellationToken` is cancelled
//! 3. The room is closed, waking every student waiting at the door
//! 4. Every student thread is joined
//!
//! No thread is ever interrupted while holding room state.
//!
//! A student that fails or panics stops the run early: the token is
//! cancelled and the room closed, which turns away a guard still waiting for
//! the room to empty. The failure is then reported by `run`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actors;
mod error;
mod observer;
mod system_env;

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

pub use actors::{GuardActor, StudentActor, actor_rng, actor_seed};
pub use error::RuntimeError;
pub use observer::TracingObserver;
pub use system_env::SystemEnv;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vigil_core::{
    Coordinator, Environment, GateCoordinator, ObserverSet, Protocol, RoomAccess, RoomError,
    RoomObserver, RunConfig,
};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Coordinator implementation that ran.
    pub protocol: Protocol,
    /// Inspections the guard completed.
    pub inspections: u32,
    /// Completed visits per student; index `i` is student `i + 1`.
    pub visits: Vec<u64>,
}

impl RunReport {
    /// Visits summed over every student.
    pub fn total_visits(&self) -> u64 {
        self.visits.iter().sum()
    }
}

/// Drives one run of the guard and its students.
pub struct Runtime<E: Environment> {
    config: RunConfig,
    env: E,
    observers: ObserverSet,
}

impl<E: Environment> Runtime<E> {
    /// Validate `config` and prepare a run. Room events are logged through
    /// [`TracingObserver`].
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Config` if the configuration is invalid.
    pub fn new(config: RunConfig, env: E) -> Result<Self, RuntimeError> {
        config.validate()?;
        Ok(Self { config, env, observers: ObserverSet::new().with(Arc::new(TracingObserver)) })
    }

    /// Also report every room event to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RoomObserver>) -> Self {
        self.observers = self.observers.with(observer);
        self
    }

    /// The configuration this runtime will use.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the guard to completion and stop every student.
    pub fn run(self) -> Result<RunReport, RuntimeError> {
        let Self { config, env, observers } = self;
        let room = build_room(&config, Arc::new(observers))?;
        let shutdown = CancellationToken::new();

        info!(
            students = config.num_students,
            capacity = config.capacity,
            checks = config.num_checks,
            seed = config.seed,
            protocol = %config.protocol,
            "starting run"
        );

        let guard = GuardActor::new(
            Arc::clone(&room),
            env.clone(),
            config.timing,
            config.num_checks,
            config.seed,
        );
        let guard = spawn("guard".to_string(), move || guard.run())?;

        let mut students = Vec::new();
        for id in 1..=config.num_students {
            let student = StudentActor::new(
                id,
                Arc::clone(&room),
                env.clone(),
                config.timing,
                config.seed,
                shutdown.clone(),
            );
            let tripwire = StopOnFailure::new(Arc::clone(&room), shutdown.clone());
            match spawn(format!("student-{id}"), move || tripwire.watch(student.run())) {
                Ok(handle) => students.push(handle),
                Err(e) => {
                    // The guard cannot be interrupted; let it finish, then stop everyone.
                    let _ = join("guard", guard);
                    stop(&room, &shutdown);
                    for (index, handle) in students.into_iter().enumerate() {
                        let _ = join(&format!("student-{}", index + 1), handle);
                    }
                    return Err(e);
                },
            }
        }

        let inspections = join("guard", guard);
        debug!("guard joined, shutting students down");
        stop(&room, &shutdown);

        let mut visits = Vec::new();
        let mut first_error = None;
        for (index, handle) in students.into_iter().enumerate() {
            match join(&format!("student-{}", index + 1), handle) {
                Ok(count) => visits.push(count),
                Err(e) => {
                    visits.push(0);
                    first_error.get_or_insert(e);
                },
            }
        }

        // A failed student closes the room, which in turn may turn the guard
        // away; report the student's failure rather than the guard's.
        if let Some(e) = first_error {
            return Err(e);
        }
        let inspections = inspections?;

        let report = RunReport { protocol: config.protocol, inspections, visits };
        info!(inspections, total_visits = report.total_visits(), "run complete");
        Ok(report)
    }
}

impl<E: Environment> std::fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

/// Build the coordinator selected by `config.protocol`.
fn build_room(
    config: &RunConfig,
    observer: Arc<dyn RoomObserver>,
) -> Result<Arc<dyn RoomAccess>, RoomError> {
    Ok(match config.protocol {
        Protocol::Condvar => Arc::new(Coordinator::with_observer(config.capacity, observer)?),
        Protocol::Gates => Arc::new(GateCoordinator::with_observer(config.capacity, observer)?),
    })
}

fn spawn<T, F>(name: String, f: F) -> Result<JoinHandle<Result<T, RoomError>>, RuntimeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RoomError> + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| RuntimeError::Spawn { actor: name, source })
}

fn join<T>(name: &str, handle: JoinHandle<Result<T, RoomError>>) -> Result<T, RuntimeError> {
    handle
        .join()
        .map_err(|_| RuntimeError::ActorPanicked { actor: name.to_string() })?
        .map_err(RuntimeError::from)
}

/// Stops the run if the actor it watches fails or panics, so the guard is
/// never left waiting on a student that is gone.
struct StopOnFailure {
    room: Arc<dyn RoomAccess>,
    shutdown: CancellationToken,
    armed: bool,
}

impl StopOnFailure {
    fn new(room: Arc<dyn RoomAccess>, shutdown: CancellationToken) -> Self {
        Self { room, shutdown, armed: true }
    }

    fn watch<T>(mut self, result: Result<T, RoomError>) -> Result<T, RoomError> {
        self.armed = result.is_err();
        result
    }
}

impl Drop for StopOnFailure {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("actor failed, stopping the run");
            stop(&self.room, &self.shutdown);
        }
    }
}

fn stop(room: &Arc<dyn RoomAccess>, shutdown: &CancellationToken) {
    shutdown.cancel();
    if let Err(e) = room.close() {
        tracing::error!(error = %e, "failed to close room");
    }
}
