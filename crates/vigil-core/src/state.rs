//! Room state shared by the guard and the students.
//!
//! # Invariants
//!
//! - Capacity bound: `occupancy <= capacity`
//! - Mutual exclusion: `guard_status == Inspecting` implies `occupancy == 0`
//! - Guard priority: no student is admitted while `guard_status != Outside`
//!
//! `RoomState` itself is crate-private. Coordinators own it behind their
//! mutex and hand out [`RoomSnapshot`] copies.

use std::{fmt, num::NonZeroUsize};

use crate::error::RoomError;

/// Identifier of a student actor, in `1..=N`.
pub type StudentId = usize;

/// The guard's phase relative to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GuardStatus {
    /// Not at the room. Students may enter.
    #[default]
    Outside,
    /// At the door, waiting for the room to empty.
    WaitingToEnter,
    /// Inside the room. The room is empty.
    Inspecting,
}

impl fmt::Display for GuardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outside => write!(f, "outside"),
            Self::WaitingToEnter => write!(f, "waiting to enter"),
            Self::Inspecting => write!(f, "inspecting"),
        }
    }
}

/// Consistent copy of the room state, taken under the coordinator's mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Students currently in the room.
    pub occupancy: usize,
    /// Guard phase.
    pub guard_status: GuardStatus,
    /// Maximum simultaneous occupancy.
    pub capacity: usize,
    /// Whether the room has been closed for shutdown.
    pub closed: bool,
}

impl RoomSnapshot {
    /// Whether this snapshot satisfies the room invariants.
    pub fn is_consistent(&self) -> bool {
        self.occupancy <= self.capacity
            && (self.guard_status != GuardStatus::Inspecting || self.occupancy == 0)
    }
}

#[derive(Debug)]
pub(crate) struct RoomState {
    occupancy: usize,
    guard_status: GuardStatus,
    capacity: NonZeroUsize,
    closed: bool,
}

impl RoomState {
    pub(crate) fn new(capacity: usize) -> Result<Self, RoomError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(RoomError::ZeroCapacity)?;
        Ok(Self { occupancy: 0, guard_status: GuardStatus::Outside, capacity, closed: false })
    }

    pub(crate) fn occupancy(&self) -> usize {
        self.occupancy
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn is_full(&self) -> bool {
        self.occupancy >= self.capacity.get()
    }

    /// A student may enter: guard outside and a free seat.
    pub(crate) fn can_admit(&self) -> bool {
        self.guard_status == GuardStatus::Outside && !self.is_full()
    }

    /// Guard is blocked until the last student leaves.
    pub(crate) fn guard_is_waiting(&self) -> bool {
        self.guard_status == GuardStatus::WaitingToEnter
    }

    pub(crate) fn admit(&mut self) {
        debug_assert!(self.can_admit(), "admit called on a room that cannot admit");
        self.occupancy += 1;
    }

    pub(crate) fn discharge(&mut self, student: StudentId) -> Result<(), RoomError> {
        self.occupancy = self.occupancy.checked_sub(1).ok_or(RoomError::NotOccupied { student })?;
        Ok(())
    }

    pub(crate) fn set_guard_status(&mut self, status: GuardStatus) {
        debug_assert!(
            status != GuardStatus::Inspecting || self.occupancy == 0,
            "guard entered an occupied room"
        );
        self.guard_status = status;
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            occupancy: self.occupancy,
            guard_status: self.guard_status,
            capacity: self.capacity.get(),
            closed: self.closed,
        }
    }
}
