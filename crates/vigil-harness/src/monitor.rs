//! Invariant monitor.
//!
//! `InvariantMonitor` is a [`RoomObserver`] that replays the coordinator's
//! linearized event stream against a shadow model of the room and records
//! every broken invariant instead of panicking, so a test can report all of
//! them at once.
//!
//! # Checked invariants
//!
//! - Capacity bound: `occupancy <= capacity` in every snapshot
//! - Mutual exclusion: never `Inspecting` with `occupancy > 0`
//! - Empty before inspection: every `GuardInspecting` is preceded by an
//!   observed empty room with no intervening entry
//! - Guard priority: no student enters while the guard is at the door or
//!   inside
//! - Seat accounting: a student enters at most once before leaving, leaves
//!   only after entering, and the shadow occupancy matches the snapshot
//! - Closed room: nobody enters after the room closed

use std::{
    collections::BTreeSet,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use vigil_core::{GuardStatus, RoomEvent, RoomObserver, RoomSnapshot, StudentId};

/// A broken room invariant, with the event that exposed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// More students than seats.
    OverCapacity {
        /// Event after which the room was over capacity.
        event: RoomEvent,
        /// Reported occupancy.
        occupancy: usize,
        /// Room capacity.
        capacity: usize,
    },
    /// The guard was inspecting an occupied room.
    InspectedOccupiedRoom {
        /// Event after which the overlap was observed.
        event: RoomEvent,
        /// Reported occupancy.
        occupancy: usize,
    },
    /// The guard started inspecting without an observed empty room.
    InspectionWithoutEmptyRoom,
    /// A student entered while the guard was not outside.
    EnteredPastGuard {
        /// The student.
        student: StudentId,
        /// Guard status at the time.
        guard_status: GuardStatus,
    },
    /// A student entered twice without leaving.
    DoubleEntry {
        /// The student.
        student: StudentId,
    },
    /// A student left without having entered.
    LeftWithoutEntering {
        /// The student.
        student: StudentId,
    },
    /// A student entered a closed room.
    EnteredClosedRoom {
        /// The student.
        student: StudentId,
    },
    /// The coordinator's occupancy disagrees with the replayed events.
    OccupancyMismatch {
        /// Event after which the mismatch was observed.
        event: RoomEvent,
        /// Occupancy implied by the event stream.
        expected: usize,
        /// Occupancy the coordinator reported.
        reported: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverCapacity { event, occupancy, capacity } => {
                write!(f, "after '{event}': occupancy {occupancy} exceeds capacity {capacity}")
            },
            Self::InspectedOccupiedRoom { event, occupancy } => {
                write!(f, "after '{event}': guard inspecting with {occupancy} students inside")
            },
            Self::InspectionWithoutEmptyRoom => {
                write!(f, "guard began inspecting without an observed empty room")
            },
            Self::EnteredPastGuard { student, guard_status } => {
                write!(f, "student {student} entered while guard was {guard_status}")
            },
            Self::DoubleEntry { student } => write!(f, "student {student} entered twice"),
            Self::LeftWithoutEntering { student } => {
                write!(f, "student {student} left without entering")
            },
            Self::EnteredClosedRoom { student } => {
                write!(f, "student {student} entered a closed room")
            },
            Self::OccupancyMismatch { event, expected, reported } => {
                write!(f, "after '{event}': replayed occupancy {expected}, reported {reported}")
            },
        }
    }
}

/// Counters and findings accumulated by an [`InvariantMonitor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    /// Every violation, in the order observed.
    pub violations: Vec<InvariantViolation>,
    /// Successful entries.
    pub entries: u64,
    /// Exits.
    pub exits: u64,
    /// Inspections started.
    pub inspections: u64,
    /// Times the guard had to wait at the door.
    pub guard_waits: u64,
    /// Highest occupancy seen.
    pub max_occupancy: usize,
    /// Students still inside when the report was taken.
    pub inside: Vec<StudentId>,
    /// Whether the room was closed.
    pub closed: bool,
}

impl MonitorReport {
    /// Whether every invariant held.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug)]
struct MonitorState {
    occupancy: usize,
    inside: BTreeSet<StudentId>,
    empty_since_last_entry: bool,
    closed: bool,
    report: MonitorReport,
    history: Option<Vec<(RoomEvent, RoomSnapshot)>>,
}

/// Replays room events and records invariant violations.
#[derive(Debug)]
pub struct InvariantMonitor {
    state: Mutex<MonitorState>,
}

impl InvariantMonitor {
    /// Create a monitor for a fresh, empty room.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a monitor that also keeps the full event history.
    pub fn with_history() -> Self {
        Self::build(Some(Vec::new()))
    }

    fn build(history: Option<Vec<(RoomEvent, RoomSnapshot)>>) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                occupancy: 0,
                inside: BTreeSet::new(),
                empty_since_last_entry: true,
                closed: false,
                report: MonitorReport::default(),
                history,
            }),
        }
    }

    /// Copy of the counters and violations so far.
    pub fn report(&self) -> MonitorReport {
        let state = self.lock();
        let mut report = state.report.clone();
        report.inside = state.inside.iter().copied().collect();
        report.closed = state.closed;
        report
    }

    /// Recorded events, if the monitor was built with history.
    pub fn history(&self) -> Vec<(RoomEvent, RoomSnapshot)> {
        self.lock().history.clone().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        // A panicking test thread must not hide the violations recorded so far.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InvariantMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorState {
    fn record(&mut self, violation: InvariantViolation) {
        tracing::error!(%violation, "room invariant violated");
        self.report.violations.push(violation);
    }

    fn apply(&mut self, event: &RoomEvent, snapshot: &RoomSnapshot) {
        if let Some(history) = self.history.as_mut() {
            history.push((*event, *snapshot));
        }

        match *event {
            RoomEvent::StudentEntered { student } => {
                if self.closed {
                    self.record(InvariantViolation::EnteredClosedRoom { student });
                }
                if snapshot.guard_status != GuardStatus::Outside {
                    self.record(InvariantViolation::EnteredPastGuard {
                        student,
                        guard_status: snapshot.guard_status,
                    });
                }
                if !self.inside.insert(student) {
                    self.record(InvariantViolation::DoubleEntry { student });
                }
                self.occupancy += 1;
                self.empty_since_last_entry = false;
                self.report.entries += 1;
            },
            RoomEvent::StudentLeft { student } => {
                if !self.inside.remove(&student) {
                    self.record(InvariantViolation::LeftWithoutEntering { student });
                }
                self.occupancy = self.occupancy.saturating_sub(1);
                if self.occupancy == 0 {
                    self.empty_since_last_entry = true;
                }
                self.report.exits += 1;
            },
            RoomEvent::GuardWaiting => self.report.guard_waits += 1,
            RoomEvent::GuardInspecting => {
                if !(self.empty_since_last_entry && self.occupancy == 0) {
                    self.record(InvariantViolation::InspectionWithoutEmptyRoom);
                }
                self.report.inspections += 1;
            },
            RoomEvent::GuardLeft => {},
            RoomEvent::Closed => self.closed = true,
        }

        if snapshot.occupancy > snapshot.capacity {
            self.record(InvariantViolation::OverCapacity {
                event: *event,
                occupancy: snapshot.occupancy,
                capacity: snapshot.capacity,
            });
        }
        if snapshot.guard_status == GuardStatus::Inspecting && snapshot.occupancy > 0 {
            self.record(InvariantViolation::InspectedOccupiedRoom {
                event: *event,
                occupancy: snapshot.occupancy,
            });
        }
        if snapshot.occupancy != self.occupancy {
            self.record(InvariantViolation::OccupancyMismatch {
                event: *event,
                expected: self.occupancy,
                reported: snapshot.occupancy,
            });
        }

        self.report.max_occupancy = self.report.max_occupancy.max(snapshot.occupancy);
    }
}

impl RoomObserver for InvariantMonitor {
    fn on_event(&self, event: &RoomEvent, snapshot: &RoomSnapshot) {
        self.lock().apply(event, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(occupancy: usize, guard_status: GuardStatus) -> RoomSnapshot {
        RoomSnapshot { occupancy, guard_status, capacity: 2, closed: false }
    }

    #[test]
    fn clean_cycle_has_no_violations() {
        let monitor = InvariantMonitor::new();

        monitor.on_event(&RoomEvent::StudentEntered { student: 1 }, &snap(1, GuardStatus::Outside));
        monitor.on_event(&RoomEvent::GuardWaiting, &snap(1, GuardStatus::WaitingToEnter));
        monitor.on_event(
            &RoomEvent::StudentLeft { student: 1 },
            &snap(0, GuardStatus::WaitingToEnter),
        );
        monitor.on_event(&RoomEvent::GuardInspecting, &snap(0, GuardStatus::Inspecting));
        monitor.on_event(&RoomEvent::GuardLeft, &snap(0, GuardStatus::Outside));

        let report = monitor.report();
        assert!(report.is_clean(), "{:?}", report.violations);
        assert_eq!(report.entries, 1);
        assert_eq!(report.exits, 1);
        assert_eq!(report.inspections, 1);
        assert_eq!(report.guard_waits, 1);
        assert_eq!(report.max_occupancy, 1);
        assert!(report.inside.is_empty());
    }

    #[test]
    fn detects_over_capacity() {
        let monitor = InvariantMonitor::new();
        for student in 1..=3 {
            monitor.on_event(
                &RoomEvent::StudentEntered { student },
                &snap(student, GuardStatus::Outside),
            );
        }

        let report = monitor.report();
        assert_eq!(
            report.violations,
            vec![InvariantViolation::OverCapacity {
                event: RoomEvent::StudentEntered { student: 3 },
                occupancy: 3,
                capacity: 2,
            }]
        );
        assert_eq!(report.inside, vec![1, 2, 3]);
    }

    #[test]
    fn detects_inspection_of_occupied_room() {
        let monitor = InvariantMonitor::new();
        monitor.on_event(&RoomEvent::StudentEntered { student: 1 }, &snap(1, GuardStatus::Outside));
        monitor.on_event(&RoomEvent::GuardInspecting, &snap(1, GuardStatus::Inspecting));

        let violations = monitor.report().violations;
        assert!(violations.contains(&InvariantViolation::InspectionWithoutEmptyRoom));
        assert!(violations.contains(&InvariantViolation::InspectedOccupiedRoom {
            event: RoomEvent::GuardInspecting,
            occupancy: 1,
        }));
    }

    #[test]
    fn detects_entry_past_waiting_guard() {
        let monitor = InvariantMonitor::new();
        monitor.on_event(&RoomEvent::StudentEntered { student: 1 }, &snap(1, GuardStatus::Outside));
        monitor.on_event(&RoomEvent::GuardWaiting, &snap(1, GuardStatus::WaitingToEnter));
        monitor.on_event(
            &RoomEvent::StudentEntered { student: 2 },
            &snap(2, GuardStatus::WaitingToEnter),
        );

        assert_eq!(
            monitor.report().violations,
            vec![InvariantViolation::EnteredPastGuard {
                student: 2,
                guard_status: GuardStatus::WaitingToEnter,
            }]
        );
    }

    #[test]
    fn detects_seat_accounting_errors() {
        let monitor = InvariantMonitor::new();
        monitor.on_event(&RoomEvent::StudentLeft { student: 4 }, &snap(0, GuardStatus::Outside));
        monitor.on_event(&RoomEvent::StudentEntered { student: 1 }, &snap(1, GuardStatus::Outside));
        monitor.on_event(&RoomEvent::StudentEntered { student: 1 }, &snap(2, GuardStatus::Outside));

        let violations = monitor.report().violations;
        assert!(violations.contains(&InvariantViolation::LeftWithoutEntering { student: 4 }));
        assert!(violations.contains(&InvariantViolation::DoubleEntry { student: 1 }));
    }

    #[test]
    fn detects_occupancy_mismatch_and_closed_entry() {
        let monitor = InvariantMonitor::new();
        monitor.on_event(&RoomEvent::Closed, &snap(0, GuardStatus::Outside));
        monitor.on_event(&RoomEvent::StudentEntered { student: 1 }, &snap(2, GuardStatus::Outside));

        let report = monitor.report();
        assert!(report.closed);
        assert!(report.violations.contains(&InvariantViolation::EnteredClosedRoom { student: 1 }));
        assert!(report.violations.contains(&InvariantViolation::OccupancyMismatch {
            event: RoomEvent::StudentEntered { student: 1 },
            expected: 1,
            reported: 2,
        }));
    }

    #[test]
    fn history_is_kept_on_request() {
        let plain = InvariantMonitor::new();
        let recording = InvariantMonitor::with_history();

        for monitor in [&plain, &recording] {
            monitor.on_event(&RoomEvent::GuardInspecting, &snap(0, GuardStatus::Inspecting));
        }

        assert!(plain.history().is_empty());
        assert_eq!(recording.history().len(), 1);
    }

    #[test]
    fn violation_display_names_the_event() {
        let violation = InvariantViolation::OverCapacity {
            event: RoomEvent::StudentEntered { student: 3 },
            occupancy: 3,
            capacity: 2,
        };
        assert_eq!(
            violation.to_string(),
            "after 'student 3 entered': occupancy 3 exceeds capacity 2"
        );
    }
}
