//! Room access coordinator.
//!
//! Orchestrates one guard and many students around a single room.
//!
//! ## Protocol
//!
//! - Guard: announce at the door; if students are inside, wait until the
//!   last one leaves; inspect the empty room without holding the mutex; leave
//!   and wake every waiting student.
//! - Student enter: wait until the guard is outside and a seat is free, then
//!   take the seat.
//! - Student leave: free the seat; if that emptied the room for a waiting
//!   guard, wake the guard, otherwise wake one waiting student.
//!
//! A guard at the door blocks new entries, so a steady stream of students
//! cannot starve it.
//!
//! [`Coordinator`] implements the protocol with a mutex and two condition
//! variables whose waits re-check their predicate. The binary-gate rendition
//! lives in [`GateCoordinator`](crate::gate_coordinator::GateCoordinator);
//! both implement [`RoomAccess`].

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::debug;

use crate::{
    error::RoomError,
    event::{NoopObserver, RoomEvent, RoomObserver},
    state::{GuardStatus, RoomSnapshot, RoomState, StudentId},
};

/// Operations every room coordinator provides.
pub trait RoomAccess: Send + Sync {
    /// Blocks until the student may enter, then takes a seat.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Closed` if the room is closed before the student
    /// got a seat. The student is then not inside.
    fn enter_room(&self, student: StudentId) -> Result<(), RoomError>;

    /// Frees the student's seat. Never blocks on the guard.
    fn leave_room(&self, student: StudentId) -> Result<(), RoomError>;

    /// Waits for an empty room, runs `inspect` while the guard is inside,
    /// then lets students back in.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Closed` if the room is closed while still
    /// occupied; the guard then stays outside. A closed empty room is still
    /// inspected.
    fn inspect_room(&self, inspect: &mut dyn FnMut()) -> Result<(), RoomError>;

    /// Closes the room and wakes every student waiting to enter, and a guard
    /// waiting at the door. Closing a closed room does nothing.
    ///
    /// Students already inside can still leave.
    fn close(&self) -> Result<(), RoomError>;

    /// Consistent copy of the room state.
    fn snapshot(&self) -> Result<RoomSnapshot, RoomError>;
}

/// Mutex and condition-variable room coordinator.
pub struct Coordinator {
    state: Mutex<RoomState>,
    /// Guard waits here for `occupancy == 0`.
    room_empty: Condvar,
    /// Students wait here for a seat.
    room_not_full: Condvar,
    observer: Arc<dyn RoomObserver>,
}

impl Coordinator {
    /// Create a coordinator for a room with `capacity` seats.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::ZeroCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, RoomError> {
        Self::with_observer(capacity, Arc::new(NoopObserver))
    }

    /// Create a coordinator that reports every room event to `observer`.
    pub fn with_observer(
        capacity: usize,
        observer: Arc<dyn RoomObserver>,
    ) -> Result<Self, RoomError> {
        Ok(Self {
            state: Mutex::new(RoomState::new(capacity)?),
            room_empty: Condvar::new(),
            room_not_full: Condvar::new(),
            observer,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, RoomState>, RoomError> {
        self.state.lock().map_err(|_| RoomError::Poisoned)
    }

    fn emit(&self, event: RoomEvent, state: &RoomState) {
        self.observer.on_event(&event, &state.snapshot());
    }
}

impl RoomAccess for Coordinator {
    fn enter_room(&self, student: StudentId) -> Result<(), RoomError> {
        let state = self.lock()?;
        let mut state = self
            .room_not_full
            .wait_while(state, |s| !s.is_closed() && !s.can_admit())
            .map_err(|_| RoomError::Poisoned)?;

        if state.is_closed() {
            return Err(RoomError::Closed);
        }

        state.admit();
        debug!(student, occupancy = state.occupancy(), "admitted");
        self.emit(RoomEvent::StudentEntered { student }, &state);

        Ok(())
    }

    fn leave_room(&self, student: StudentId) -> Result<(), RoomError> {
        let mut state = self.lock()?;
        state.discharge(student)?;
        debug!(student, occupancy = state.occupancy(), "discharged");
        self.emit(RoomEvent::StudentLeft { student }, &state);

        if state.occupancy() == 0 && state.guard_is_waiting() {
            self.room_empty.notify_one();
        } else if !state.is_full() {
            self.room_not_full.notify_one();
        }

        Ok(())
    }

    fn inspect_room(&self, inspect: &mut dyn FnMut()) -> Result<(), RoomError> {
        let mut state = self.lock()?;

        if state.occupancy() > 0 && !state.is_closed() {
            state.set_guard_status(GuardStatus::WaitingToEnter);
            debug!(occupancy = state.occupancy(), "guard waiting for empty room");
            self.emit(RoomEvent::GuardWaiting, &state);

            state = self
                .room_empty
                .wait_while(state, |s| s.occupancy() > 0 && !s.is_closed())
                .map_err(|_| RoomError::Poisoned)?;
        }

        if state.occupancy() > 0 {
            if state.guard_is_waiting() {
                state.set_guard_status(GuardStatus::Outside);
                self.emit(RoomEvent::GuardLeft, &state);
            }
            debug!(occupancy = state.occupancy(), "room closed before it emptied");
            return Err(RoomError::Closed);
        }

        state.set_guard_status(GuardStatus::Inspecting);
        self.emit(RoomEvent::GuardInspecting, &state);
        drop(state);

        inspect();

        let mut state = self.lock()?;
        state.set_guard_status(GuardStatus::Outside);
        self.emit(RoomEvent::GuardLeft, &state);
        drop(state);

        self.room_not_full.notify_all();

        Ok(())
    }

    fn close(&self) -> Result<(), RoomError> {
        let mut state = self.lock()?;
        if state.is_closed() {
            return Ok(());
        }
        state.close();
        self.emit(RoomEvent::Closed, &state);
        drop(state);

        self.room_not_full.notify_all();
        self.room_empty.notify_all();

        Ok(())
    }

    fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        Ok(self.lock()?.snapshot())
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Coordinator");
        match self.state.try_lock() {
            Ok(state) => debug.field("state", &state.snapshot()),
            Err(_) => debug.field("state", &"<locked>"),
        };
        debug.finish_non_exhaustive()
    }
}
