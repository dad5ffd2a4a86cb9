//! A student.
//!
//! Loops forever: enter, study, leave, do something else. The loop ends only
//! when the shutdown token is cancelled or the room is closed. The token is
//! checked at the top of each iteration, never while the student holds a
//! seat. A student that entered always leaves, even if it panics while
//! inside.

use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vigil_core::{Environment, RoomAccess, RoomError, StudentId, TimingConfig};

use super::{actor_rng, pick_duration};

/// One student actor.
pub struct StudentActor<E: Environment> {
    id: StudentId,
    room: Arc<dyn RoomAccess>,
    env: E,
    rng: ChaCha8Rng,
    timing: TimingConfig,
    shutdown: CancellationToken,
}

impl<E: Environment> StudentActor<E> {
    /// Create student `id` (`>= 1`) for a run with the given base seed.
    pub fn new(
        id: StudentId,
        room: Arc<dyn RoomAccess>,
        env: E,
        timing: TimingConfig,
        base_seed: u64,
        shutdown: CancellationToken,
    ) -> Self {
        let rng = actor_rng(base_seed, id as u64);
        Self { id, room, env, rng, timing, shutdown }
    }

    /// Run until shutdown. Returns the number of completed visits.
    pub fn run(mut self) -> Result<u64, RoomError> {
        let mut visits = 0;

        while !self.shutdown.is_cancelled() {
            let seat = match Seat::take(&*self.room, self.id) {
                Ok(seat) => seat,
                Err(RoomError::Closed) => break,
                Err(e) => return Err(e),
            };

            let study = pick_duration(&mut self.rng, self.timing.student_range_ms());
            info!(student = self.id, duration = ?study, "student studying in room");
            let started = self.env.now();
            self.env.sleep(study);
            let studied = self.env.now().saturating_duration_since(started);

            let occupancy = seat.give_up()?;
            visits += 1;
            debug!(student = self.id, occupancy, ?studied, "student left room");

            let elsewhere = pick_duration(&mut self.rng, self.timing.student_range_ms());
            debug!(student = self.id, duration = ?elsewhere, "student doing something else");
            self.env.sleep(elsewhere);
        }

        debug!(student = self.id, visits, "student stopped");
        Ok(visits)
    }
}

/// A taken seat. Dropping it without [`Seat::give_up`], by an early return
/// or a panic, still leaves the room.
struct Seat<'a> {
    room: &'a dyn RoomAccess,
    student: StudentId,
    taken: bool,
}

impl<'a> Seat<'a> {
    fn take(room: &'a dyn RoomAccess, student: StudentId) -> Result<Self, RoomError> {
        room.enter_room(student)?;
        Ok(Self { room, student, taken: true })
    }

    /// Leave the room. Returns the occupancy afterwards.
    fn give_up(mut self) -> Result<usize, RoomError> {
        self.taken = false;
        self.room.leave_room(self.student)?;
        Ok(self.room.snapshot()?.occupancy)
    }
}

impl Drop for Seat<'_> {
    fn drop(&mut self) {
        if self.taken {
            warn!(student = self.student, "student left room abnormally");
            if let Err(e) = self.room.leave_room(self.student) {
                warn!(student = self.student, error = %e, "failed to free seat");
            }
        }
    }
}
