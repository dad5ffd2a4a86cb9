//! Simulation environment with a compressed clock.
//!
//! `SimEnv` runs activities at a fraction of their nominal length. Threads
//! still really sleep (or at least yield), so the OS scheduler still
//! interleaves actors, but a run that nominally takes seconds finishes in
//! milliseconds.
//!
//! The environment also keeps a virtual clock: the sum of nominal durations
//! requested through `sleep`, across every actor sharing it.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use vigil_core::Environment;

/// Default speed-up over the wall clock.
pub const DEFAULT_SPEEDUP: u32 = 50;

/// Environment for scenario tests.
#[derive(Debug, Clone)]
pub struct SimEnv {
    /// Divisor applied to every sleep; `None` means sleeps only yield.
    speedup: Option<u32>,
    /// Nominal nanoseconds slept, summed over all clones.
    slept_nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Activities run [`DEFAULT_SPEEDUP`] times faster than nominal.
    pub fn new() -> Self {
        Self::with_speedup(DEFAULT_SPEEDUP)
    }

    /// Activities run `speedup` times faster than nominal. A speed-up of
    /// zero is treated as one.
    pub fn with_speedup(speedup: u32) -> Self {
        Self { speedup: Some(speedup.max(1)), slept_nanos: Arc::new(AtomicU64::new(0)) }
    }

    /// Activities take no time; each sleep just yields the thread.
    pub fn instant() -> Self {
        Self { speedup: None, slept_nanos: Arc::new(AtomicU64::new(0)) }
    }

    /// Total nominal time slept by every actor using this environment.
    pub fn slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::Relaxed))
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.slept_nanos.fetch_add(nanos, Ordering::Relaxed);

        match self.speedup {
            Some(speedup) if !duration.is_zero() => thread::sleep(duration / speedup),
            _ => thread::yield_now(),
        }
    }
}
