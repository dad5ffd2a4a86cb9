//! Scenario builder.
//!
//! A scenario configures one run, attaches an [`InvariantMonitor`], runs the
//! actors on a [`SimEnv`], and checks the outcome with optional oracles.
//!
//! ```ignore
//! Scenario::new()
//!     .students(5)
//!     .capacity(2)
//!     .checks(3)
//!     .protocol(Protocol::Gates)
//!     .oracle(Box::new(|outcome| {
//!         if outcome.report.inspections == 3 { Ok(()) } else { Err("missed a check".into()) }
//!     }))
//!     .run()?;
//! ```

use std::sync::Arc;

use tracing::{debug, warn};
use vigil_core::{Protocol, RoomObserver, RunConfig, TimingConfig};
use vigil_runtime::{RunReport, Runtime, RuntimeError};

use crate::{
    monitor::{InvariantMonitor, InvariantViolation, MonitorReport},
    sim_env::SimEnv,
};

/// Checks a finished scenario; `Err` carries a human-readable reason.
pub type OracleFn = Box<dyn FnOnce(&ScenarioOutcome) -> Result<(), String>>;

/// Everything a scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// What the runtime reported.
    pub report: RunReport,
    /// What the monitor saw.
    pub monitor: MonitorReport,
    /// Nominal time slept by all actors.
    pub nominal_time: std::time::Duration,
}

/// Why a scenario failed.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The runtime itself failed.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// The monitor recorded broken invariants.
    #[error(
        "{} invariant violation(s), first: {}",
        .0.len(),
        .0.first().map(ToString::to_string).unwrap_or_default()
    )]
    Violations(Vec<InvariantViolation>),

    /// An oracle rejected the outcome.
    #[error("oracle failed: {0}")]
    Oracle(String),
}

/// Builder for a single simulated run.
pub struct Scenario {
    config: RunConfig,
    env: SimEnv,
    oracles: Vec<OracleFn>,
}

impl Scenario {
    /// Defaults: 5 students, capacity 2, 2 checks, seed 11, condvar protocol.
    pub fn new() -> Self {
        Self { config: RunConfig::default(), env: SimEnv::new(), oracles: Vec::new() }
    }

    /// Number of student actors.
    #[must_use]
    pub fn students(mut self, n: usize) -> Self {
        self.config.num_students = n;
        self
    }

    /// Room capacity.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Number of guard inspections.
    #[must_use]
    pub fn checks(mut self, checks: u32) -> Self {
        self.config.num_checks = checks;
        self
    }

    /// Base seed for every actor's generator.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Coordinator implementation.
    #[must_use]
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    /// Activity duration ranges.
    #[must_use]
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.config.timing = timing;
        self
    }

    /// Run on a specific environment.
    #[must_use]
    pub fn with_env(mut self, env: SimEnv) -> Self {
        self.env = env;
        self
    }

    /// Add a check on the outcome. Oracles run in registration order.
    #[must_use]
    pub fn oracle(mut self, oracle: OracleFn) -> Self {
        self.oracles.push(oracle);
        self
    }

    /// Run the scenario.
    ///
    /// # Errors
    ///
    /// - `ScenarioError::Runtime` if the configuration is invalid or an actor failed
    /// - `ScenarioError::Violations` if the monitor saw a broken invariant
    /// - `ScenarioError::Oracle` if an oracle rejected the outcome
    pub fn run(self) -> Result<ScenarioOutcome, ScenarioError> {
        let Self { config, env, oracles } = self;
        debug!(?config, "running scenario");

        let monitor = Arc::new(InvariantMonitor::new());
        let report = Runtime::new(config, env.clone())?
            .with_observer(Arc::clone(&monitor) as Arc<dyn RoomObserver>)
            .run()?;

        let outcome =
            ScenarioOutcome { report, monitor: monitor.report(), nominal_time: env.slept() };

        if !outcome.monitor.is_clean() {
            warn!(count = outcome.monitor.violations.len(), "scenario broke room invariants");
            return Err(ScenarioError::Violations(outcome.monitor.violations.clone()));
        }

        for oracle in oracles {
            oracle(&outcome).map_err(ScenarioError::Oracle)?;
        }

        Ok(outcome)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("config", &self.config)
            .field("env", &self.env)
            .field("oracles", &self.oracles.len())
            .finish()
    }
}
