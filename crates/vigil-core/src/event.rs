//! Room events and observers.
//!
//! Coordinators report every step that changes occupancy or guard status.
//! Observers are invoked while the coordinator's mutex is held, so the
//! sequence of `(event, snapshot)` pairs an observer sees is a linearization
//! of the run. Observers must therefore be quick and must never call back
//! into the coordinator.

use std::{fmt, sync::Arc};

use crate::state::{RoomSnapshot, StudentId};

/// A protocol step that changed the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomEvent {
    /// The guard found students inside and is waiting for the room to empty.
    GuardWaiting,
    /// The guard entered the empty room.
    GuardInspecting,
    /// The guard finished inspecting and left.
    GuardLeft,
    /// A student took a seat.
    StudentEntered {
        /// Who entered.
        student: StudentId,
    },
    /// A student left their seat.
    StudentLeft {
        /// Who left.
        student: StudentId,
    },
    /// The room was closed for shutdown.
    Closed,
}

impl fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuardWaiting => write!(f, "guard waiting"),
            Self::GuardInspecting => write!(f, "guard inspecting"),
            Self::GuardLeft => write!(f, "guard left"),
            Self::StudentEntered { student } => write!(f, "student {student} entered"),
            Self::StudentLeft { student } => write!(f, "student {student} left"),
            Self::Closed => write!(f, "room closed"),
        }
    }
}

/// Receives the linearized event stream of a coordinator.
pub trait RoomObserver: Send + Sync {
    /// Called under the coordinator's mutex after `event` was applied.
    fn on_event(&self, event: &RoomEvent, snapshot: &RoomSnapshot);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RoomObserver for NoopObserver {
    fn on_event(&self, _event: &RoomEvent, _snapshot: &RoomSnapshot) {}
}

/// Fans events out to several observers, in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RoomObserver>>,
}

impl ObserverSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer.
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn RoomObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RoomObserver for ObserverSet {
    fn on_event(&self, event: &RoomEvent, snapshot: &RoomSnapshot) {
        for observer in &self.observers {
            observer.on_event(event, snapshot);
        }
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet").field("observers", &self.observers.len()).finish()
    }
}
