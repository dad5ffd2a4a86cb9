//! Binary-gate room coordinator.
//!
//! The classic rendition of the room protocol, built from three
//! [`BinaryGate`]s:
//!
//! | gate            | kind   | initial token |
//! |-----------------|--------|---------------|
//! | `mutex`         | lock   | 1             |
//! | `room_empty`    | signal | 0             |
//! | `room_not_full` | signal | 1             |
//!
//! A signal gate holds at most one token, so a release can be absorbed by a
//! student whose condition still fails. Entry therefore re-checks its
//! condition in a loop after every wakeup, and every path that consumes a
//! `room_not_full` token without entering guarantees a later release (a
//! student leaving, or the guard walking out).
//!
//! Room state sits in a `std::sync::Mutex` purely for safe interior
//! mutability. It is only ever locked while the `mutex` gate is held, so it
//! is never contended; exclusion comes from the gate.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{
    coordinator::RoomAccess,
    error::RoomError,
    event::{NoopObserver, RoomEvent, RoomObserver},
    gate::BinaryGate,
    state::{GuardStatus, RoomSnapshot, RoomState, StudentId},
};

/// Outcome of one pass of an entry check, for a student or the guard.
enum Admission {
    Admitted,
    Wait,
    Closed,
}

/// Room coordinator built from binary gates.
pub struct GateCoordinator {
    mutex: BinaryGate,
    room_empty: BinaryGate,
    room_not_full: BinaryGate,
    state: Mutex<RoomState>,
    observer: Arc<dyn RoomObserver>,
}

impl GateCoordinator {
    /// Create a coordinator for a room with `capacity` seats.
    pub fn new(capacity: usize) -> Result<Self, RoomError> {
        Self::with_observer(capacity, Arc::new(NoopObserver))
    }

    /// Create a coordinator that reports every room event to `observer`.
    pub fn with_observer(
        capacity: usize,
        observer: Arc<dyn RoomObserver>,
    ) -> Result<Self, RoomError> {
        Ok(Self {
            mutex: BinaryGate::lock(),
            room_empty: BinaryGate::signal(false),
            room_not_full: BinaryGate::signal(true),
            state: Mutex::new(RoomState::new(capacity)?),
            observer,
        })
    }

    /// Run `f` on the room state. Caller must hold the `mutex` gate, which is
    /// released before a poisoned state lock is reported.
    fn with_state<R>(&self, f: impl FnOnce(&mut RoomState) -> R) -> Result<R, RoomError> {
        match self.state.lock() {
            Ok(mut state) => Ok(f(&mut state)),
            Err(_) => {
                self.mutex.release()?;
                Err(RoomError::Poisoned)
            },
        }
    }

    fn emit(&self, event: RoomEvent, state: &RoomState) {
        self.observer.on_event(&event, &state.snapshot());
    }
}

impl RoomAccess for GateCoordinator {
    fn enter_room(&self, student: StudentId) -> Result<(), RoomError> {
        self.mutex.acquire()?;

        loop {
            let admission = self.with_state(|state| {
                if state.is_closed() {
                    Admission::Closed
                } else if state.can_admit() {
                    state.admit();
                    debug!(student, occupancy = state.occupancy(), "admitted");
                    self.emit(RoomEvent::StudentEntered { student }, state);
                    Admission::Admitted
                } else {
                    Admission::Wait
                }
            })?;

            match admission {
                Admission::Admitted => break,
                Admission::Closed => {
                    self.mutex.release()?;
                    // Pass the wakeup on so every blocked student sees the close.
                    self.room_not_full.release()?;
                    return Err(RoomError::Closed);
                },
                Admission::Wait => {
                    self.mutex.release()?;
                    self.room_not_full.acquire()?;
                    self.mutex.acquire()?;
                },
            }
        }

        self.mutex.release()?;
        Ok(())
    }

    fn leave_room(&self, student: StudentId) -> Result<(), RoomError> {
        self.mutex.acquire()?;

        let signal = self.with_state(|state| {
            state.discharge(student)?;
            debug!(student, occupancy = state.occupancy(), "discharged");
            self.emit(RoomEvent::StudentLeft { student }, state);

            Ok::<_, RoomError>(if state.occupancy() == 0 && state.guard_is_waiting() {
                Some(&self.room_empty)
            } else if !state.is_full() {
                Some(&self.room_not_full)
            } else {
                None
            })
        })?;

        let signal = match signal {
            Ok(signal) => signal,
            Err(err) => {
                self.mutex.release()?;
                return Err(err);
            },
        };

        if let Some(gate) = signal {
            gate.release()?;
        }
        self.mutex.release()?;

        Ok(())
    }

    fn inspect_room(&self, inspect: &mut dyn FnMut()) -> Result<(), RoomError> {
        self.mutex.acquire()?;

        // `room_empty` may carry a token left over from a close, so the
        // condition is re-checked after every wakeup.
        loop {
            let step = self.with_state(|state| {
                if state.occupancy() == 0 {
                    state.set_guard_status(GuardStatus::Inspecting);
                    self.emit(RoomEvent::GuardInspecting, state);
                    Admission::Admitted
                } else if state.is_closed() {
                    if state.guard_is_waiting() {
                        state.set_guard_status(GuardStatus::Outside);
                        self.emit(RoomEvent::GuardLeft, state);
                    }
                    debug!(occupancy = state.occupancy(), "room closed before it emptied");
                    Admission::Closed
                } else {
                    if !state.guard_is_waiting() {
                        state.set_guard_status(GuardStatus::WaitingToEnter);
                        debug!(occupancy = state.occupancy(), "guard waiting for empty room");
                        self.emit(RoomEvent::GuardWaiting, state);
                    }
                    Admission::Wait
                }
            })?;

            match step {
                Admission::Admitted => break,
                Admission::Closed => {
                    self.mutex.release()?;
                    return Err(RoomError::Closed);
                },
                Admission::Wait => {
                    self.mutex.release()?;
                    self.room_empty.acquire()?;
                    self.mutex.acquire()?;
                },
            }
        }
        self.mutex.release()?;

        inspect();

        self.mutex.acquire()?;
        self.with_state(|state| {
            state.set_guard_status(GuardStatus::Outside);
            self.emit(RoomEvent::GuardLeft, state);
        })?;
        self.mutex.release()?;
        self.room_not_full.release()?;

        Ok(())
    }

    fn close(&self) -> Result<(), RoomError> {
        self.mutex.acquire()?;
        let (newly_closed, guard_waiting) = self.with_state(|state| {
            if state.is_closed() {
                return (false, false);
            }
            state.close();
            self.emit(RoomEvent::Closed, state);
            (true, state.guard_is_waiting())
        })?;
        self.mutex.release()?;

        if newly_closed {
            self.room_not_full.release()?;
        }
        if guard_waiting {
            self.room_empty.release()?;
        }

        Ok(())
    }

    fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.mutex.acquire()?;
        let snapshot = self.with_state(|state| state.snapshot())?;
        self.mutex.release()?;
        Ok(snapshot)
    }
}

impl std::fmt::Debug for GateCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateCoordinator")
            .field("mutex", &self.mutex)
            .field("room_empty", &self.room_empty)
            .field("room_not_full", &self.room_not_full)
            .finish_non_exhaustive()
    }
}
