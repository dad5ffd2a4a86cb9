//! Environment abstraction for actor timing.
//!
//! The `Environment` trait decouples the actors' activity durations from the
//! wall clock. Production uses real sleeps; the simulation harness scales or
//! skips them so that scenario tests explore many interleavings quickly
//! without changing any protocol code.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: implementations must not share global state between runs
//!
//! Randomness is deliberately absent: each actor owns its own seeded
//! generator, so nothing random is shared through the environment.

use std::time::{Duration, Instant};

/// Time source and sleeper used by the actors.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: subsequent calls return times `>=` previous calls.
    fn now(&self) -> Instant;

    /// Blocks the calling thread for (a representation of) `duration`.
    ///
    /// Only actors call this, and never while holding room state.
    fn sleep(&self, duration: Duration);
}
