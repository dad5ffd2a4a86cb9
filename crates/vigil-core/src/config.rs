//! Run configuration.
//!
//! [`RunConfig`] is everything the runtime needs to start a guard and its
//! students. Activity durations live in [`TimingConfig`].

use std::{fmt, ops::RangeInclusive, time::Duration};

use crate::error::ConfigError;

/// Base seed used when none is given.
pub const DEFAULT_SEED: u64 = 11;

/// Most student threads a run may spawn.
pub const MAX_STUDENTS: usize = 4096;

/// Which coordinator implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Mutex plus condition variables.
    #[default]
    Condvar,
    /// Three binary gates.
    Gates,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condvar => write!(f, "condvar"),
            Self::Gates => write!(f, "gates"),
        }
    }
}

/// Activity durations.
///
/// Students study and do something else for `min_sleep..=max_sleep`. The
/// guard inspects and patrols for `min_sleep..=max_sleep / 2` (clamped so the
/// range is never inverted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Shortest activity.
    pub min_sleep: Duration,
    /// Longest student activity.
    pub max_sleep: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { min_sleep: Duration::from_millis(20), max_sleep: Duration::from_millis(100) }
    }
}

impl TimingConfig {
    /// Timing with every activity taking no time at all.
    pub fn instant() -> Self {
        Self { min_sleep: Duration::ZERO, max_sleep: Duration::ZERO }
    }

    /// Range, in milliseconds, of student activities.
    pub fn student_range_ms(&self) -> RangeInclusive<u64> {
        millis(self.min_sleep)..=millis(self.max_sleep)
    }

    /// Range, in milliseconds, of guard activities.
    pub fn guard_range_ms(&self) -> RangeInclusive<u64> {
        let min = millis(self.min_sleep);
        let max = (millis(self.max_sleep) / 2).max(min);
        min..=max
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of student actors, ids `1..=num_students`.
    pub num_students: usize,
    /// Room capacity.
    pub capacity: usize,
    /// Inspections the guard performs before the run ends.
    pub num_checks: u32,
    /// Base seed for every actor's generator.
    pub seed: u64,
    /// Coordinator implementation.
    pub protocol: Protocol,
    /// Activity durations.
    pub timing: TimingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_students: 5,
            capacity: 2,
            num_checks: 2,
            seed: DEFAULT_SEED,
            protocol: Protocol::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Check the configuration before any actor starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_students > MAX_STUDENTS {
            return Err(ConfigError::TooManyStudents {
                requested: self.num_students,
                max: MAX_STUDENTS,
            });
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.num_checks == 0 {
            return Err(ConfigError::ZeroChecks);
        }
        if self.timing.min_sleep > self.timing.max_sleep {
            return Err(ConfigError::InvertedSleepRange {
                min_ms: self.timing.min_sleep.as_millis(),
                max_ms: self.timing.max_sleep.as_millis(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.protocol, Protocol::Condvar);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = RunConfig { capacity: 0, ..RunConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn zero_checks_are_rejected() {
        let config = RunConfig { num_checks: 0, ..RunConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChecks));
    }

    #[test]
    fn zero_students_are_allowed() {
        let config = RunConfig { num_students: 0, ..RunConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_sleep_range_is_rejected() {
        let timing = TimingConfig {
            min_sleep: Duration::from_millis(50),
            max_sleep: Duration::from_millis(10),
        };
        let config = RunConfig { timing, ..RunConfig::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedSleepRange { min_ms: 50, max_ms: 10 })
        );
    }

    #[test]
    fn student_count_is_bounded() {
        let at_limit = RunConfig { num_students: MAX_STUDENTS, ..RunConfig::default() };
        assert!(at_limit.validate().is_ok());

        let huge = RunConfig { num_students: usize::MAX, ..RunConfig::default() };
        assert_eq!(
            huge.validate(),
            Err(ConfigError::TooManyStudents { requested: usize::MAX, max: MAX_STUDENTS })
        );
    }

    #[test]
    fn guard_range_is_half_of_student_range() {
        let timing = TimingConfig::default();
        assert_eq!(timing.student_range_ms(), 20..=100);
        assert_eq!(timing.guard_range_ms(), 20..=50);
    }

    #[test]
    fn guard_range_never_inverts() {
        let timing = TimingConfig {
            min_sleep: Duration::from_millis(30),
            max_sleep: Duration::from_millis(40),
        };
        assert_eq!(timing.guard_range_ms(), 30..=30);
        assert_eq!(TimingConfig::instant().guard_range_ms(), 0..=0);
    }

    #[test]
    fn protocol_display() {
        assert_eq!(Protocol::Condvar.to_string(), "condvar");
        assert_eq!(Protocol::Gates.to_string(), "gates");
    }
}
