//! Binary gate.
//!
//! A binary gate is a semaphore whose token count is restricted to `{0, 1}`.
//! The room protocol uses gates in two roles:
//!
//! - Lock: starts with the token available and is always released by the
//!   thread that acquired it. Releasing an available lock gate is a double
//!   release and is reported as [`GateError::DoubleRelease`].
//! - Signal: a one-shot condition flag. Releases saturate at one token, so
//!   signalling a gate nobody waits on is harmless.
//!
//! Blocked acquirers are served in arrival order. Each waiter takes a ticket
//! and only the ticket at the front of the queue may consume a released token,
//! so a thread arriving after a release never overtakes one already queued.

use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard},
};

use crate::error::GateError;

/// Role of a [`BinaryGate`], which decides how double releases are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    /// Mutual exclusion. Double release is an error.
    Lock,
    /// Condition signal. Double release is absorbed.
    Signal,
}

#[derive(Debug)]
struct GateState {
    token: bool,
    waiters: VecDeque<u64>,
    next_ticket: u64,
}

/// A single-token semaphore with FIFO wakeup.
#[derive(Debug)]
pub struct BinaryGate {
    kind: GateKind,
    state: Mutex<GateState>,
    wakeup: Condvar,
}

impl BinaryGate {
    /// Creates a gate with an explicit initial token count.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidToken` if `token` is not 0 or 1.
    pub fn new(kind: GateKind, token: u8) -> Result<Self, GateError> {
        let token = match token {
            0 => false,
            1 => true,
            other => return Err(GateError::InvalidToken(other)),
        };

        Ok(Self::with_token(kind, token))
    }

    /// Creates an unlocked lock gate.
    pub fn lock() -> Self {
        Self::with_token(GateKind::Lock, true)
    }

    /// Creates a signal gate, optionally with its token already available.
    pub fn signal(available: bool) -> Self {
        Self::with_token(GateKind::Signal, available)
    }

    fn with_token(kind: GateKind, token: bool) -> Self {
        Self {
            kind,
            state: Mutex::new(GateState { token, waiters: VecDeque::new(), next_ticket: 0 }),
            wakeup: Condvar::new(),
        }
    }

    /// Role this gate was created with.
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Blocks until the token is available, then consumes it.
    pub fn acquire(&self) -> Result<(), GateError> {
        let mut state = self.state()?;

        if state.token && state.waiters.is_empty() {
            state.token = false;
            return Ok(());
        }

        let ticket = state.next_ticket;
        state.next_ticket = state.next_ticket.wrapping_add(1);
        state.waiters.push_back(ticket);

        let mut state = self
            .wakeup
            .wait_while(state, |s| !(s.token && s.waiters.front() == Some(&ticket)))
            .map_err(|_| GateError::Poisoned)?;

        state.waiters.pop_front();
        state.token = false;

        Ok(())
    }

    /// Consumes the token if it is available and nobody is queued for it.
    pub fn try_acquire(&self) -> Result<bool, GateError> {
        let mut state = self.state()?;
        if state.token && state.waiters.is_empty() {
            state.token = false;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Makes the token available and wakes the longest-waiting acquirer.
    ///
    /// # Errors
    ///
    /// Returns `GateError::DoubleRelease` for a lock gate whose token is
    /// already available. Signal gates absorb the extra release.
    pub fn release(&self) -> Result<(), GateError> {
        let mut state = self.state()?;

        if state.token {
            return match self.kind {
                GateKind::Lock => Err(GateError::DoubleRelease),
                GateKind::Signal => Ok(()),
            };
        }

        state.token = true;
        if !state.waiters.is_empty() {
            // Condvar wakeups are unordered; every waiter re-checks its ticket.
            self.wakeup.notify_all();
        }

        Ok(())
    }

    /// Whether the token is currently available.
    pub fn is_available(&self) -> Result<bool, GateError> {
        Ok(self.state()?.token)
    }

    /// Number of threads blocked in [`acquire`](Self::acquire).
    pub fn waiters(&self) -> Result<usize, GateError> {
        Ok(self.state()?.waiters.len())
    }

    fn state(&self) -> Result<MutexGuard<'_, GateState>, GateError> {
        self.state.lock().map_err(|_| GateError::Poisoned)
    }
}
