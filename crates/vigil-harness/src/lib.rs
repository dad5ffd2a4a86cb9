//! Simulation harness for the room access protocol.
//!
//! Runs the real guard and student actors against either coordinator with a
//! compressed clock, and checks the linearized event stream against the
//! room's safety invariants.
//!
//! # Why a Monitor?
//!
//! Thread interleavings differ on every run, so a bad schedule may show up
//! once in a thousand runs. The coordinators emit every state change while
//! holding their mutex, which gives a single total order of events. The
//! [`InvariantMonitor`] replays that order and records each violation with
//! the event that caused it, so a failing run explains itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil_core::Protocol;
//! use vigil_harness::Scenario;
//!
//! #[test]
//! fn guard_waits_for_a_full_room() {
//!     let outcome = Scenario::new()
//!         .students(6)
//!         .capacity(2)
//!         .checks(3)
//!         .protocol(Protocol::Gates)
//!         .run()
//!         .unwrap();
//!
//!     assert_eq!(outcome.report.inspections, 3);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod monitor;
pub mod scenario;
pub mod sim_env;

pub use monitor::{InvariantMonitor, InvariantViolation, MonitorReport};
pub use scenario::{OracleFn, Scenario, ScenarioError, ScenarioOutcome};
pub use sim_env::{DEFAULT_SPEEDUP, SimEnv};
