//! Production Environment implementation using the system clock.
//!
//! This module provides `SystemEnv`, the production implementation of the
//! `Environment` trait. Activities really take as long as they claim to.

use std::time::{Duration, Instant};

use vigil_core::Environment;

/// Production environment using system time and real thread sleeps.
///
/// This implementation:
/// - Uses `std::time::Instant::now()` for time
/// - Uses `std::thread::sleep()` for activities
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
