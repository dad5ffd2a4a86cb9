//! The guard.
//!
//! Inspects the room `num_checks` times, walking the hallway after each
//! inspection, then stops. The guard's return is what ends a run.

use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use tracing::info;
use vigil_core::{Environment, RoomAccess, RoomError, TimingConfig};

use super::{GUARD_ID, actor_rng, pick_duration};

/// The singleton guard actor.
pub struct GuardActor<E: Environment> {
    room: Arc<dyn RoomAccess>,
    env: E,
    rng: ChaCha8Rng,
    timing: TimingConfig,
    num_checks: u32,
}

impl<E: Environment> GuardActor<E> {
    /// Create the guard for a run with the given base seed.
    pub fn new(
        room: Arc<dyn RoomAccess>,
        env: E,
        timing: TimingConfig,
        num_checks: u32,
        base_seed: u64,
    ) -> Self {
        Self { room, env, rng: actor_rng(base_seed, GUARD_ID), timing, num_checks }
    }

    /// Run every check. Returns the number of completed inspections.
    pub fn run(mut self) -> Result<u32, RoomError> {
        let mut completed = 0;

        for check in 1..=self.num_checks {
            let assess = pick_duration(&mut self.rng, self.timing.guard_range_ms());
            let env = &self.env;
            self.room.inspect_room(&mut || {
                info!(check, duration = ?assess, "guard assessing room security");
                env.sleep(assess);
                info!(check, "guard done assessing room security");
            })?;
            completed += 1;

            let patrol = pick_duration(&mut self.rng, self.timing.guard_range_ms());
            info!(check, duration = ?patrol, "guard walking the hallway");
            self.env.sleep(patrol);
        }

        info!(inspections = completed, "guard finished");
        Ok(completed)
    }
}
