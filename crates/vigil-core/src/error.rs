//! Error types for gates and coordinators.
//!
//! Every error in this module is a protocol defect except
//! [`RoomError::Closed`], which is the normal way a student learns that the
//! run is over. Callers should treat the rest as fatal.

use thiserror::Error;

/// Errors from [`BinaryGate`](crate::gate::BinaryGate) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    /// A gate was created with a token count outside `{0, 1}`.
    #[error("gate token must be 0 or 1, got {0}")]
    InvalidToken(u8),

    /// A lock gate was released while its token was already available.
    #[error("double release of a lock gate")]
    DoubleRelease,

    /// A thread panicked while holding the gate's internal state.
    #[error("gate state poisoned")]
    Poisoned,
}

/// Errors from room coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The room was closed; the caller did not enter.
    #[error("room is closed")]
    Closed,

    /// A student left without a matching entry.
    #[error("student {student} left an empty room")]
    NotOccupied {
        /// The student that tried to leave.
        student: usize,
    },

    /// Room capacity must be positive.
    #[error("room capacity must be positive")]
    ZeroCapacity,

    /// A gate was misused by the protocol.
    #[error("gate misuse: {0}")]
    Gate(#[from] GateError),

    /// An actor panicked while holding the room state.
    #[error("room state poisoned by a panicking actor")]
    Poisoned,
}

/// Errors from [`RunConfig::validate`](crate::config::RunConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// More students than one run can spawn threads for.
    #[error("num_students {requested} exceeds the maximum of {max}")]
    TooManyStudents {
        /// Requested student count.
        requested: usize,
        /// Largest accepted count.
        max: usize,
    },

    /// Capacity was zero.
    #[error("capacity must be a positive integer")]
    ZeroCapacity,

    /// The guard was asked to make zero checks.
    #[error("num_checks must be a positive integer")]
    ZeroChecks,

    /// The minimum sleep exceeds the maximum sleep.
    #[error("minimum sleep {min_ms}ms exceeds maximum sleep {max_ms}ms")]
    InvertedSleepRange {
        /// Configured minimum, in milliseconds.
        min_ms: u128,
        /// Configured maximum, in milliseconds.
        max_ms: u128,
    },
}
