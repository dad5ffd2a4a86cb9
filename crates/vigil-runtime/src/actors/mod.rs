//! Guard and student actors.
//!
//! Each actor runs on its own OS thread and talks to the room only through
//! [`RoomAccess`](vigil_core::RoomAccess). Every actor exclusively owns a
//! `ChaCha8Rng` derived from the run's base seed and the actor's id, used to
//! pick activity durations. The guard is actor 0; students are `1..=N`.

mod guard;
mod student;

use std::{ops::RangeInclusive, time::Duration};

pub use guard::GuardActor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
pub use student::StudentActor;

/// Actor id of the guard.
pub const GUARD_ID: u64 = 0;

/// Seed of an actor's generator: the base seed offset by the actor id.
pub fn actor_seed(base_seed: u64, actor_id: u64) -> u64 {
    base_seed.wrapping_add(actor_id)
}

/// Fresh generator for one actor.
pub fn actor_rng(base_seed: u64, actor_id: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(actor_seed(base_seed, actor_id))
}

/// Draw an activity duration from an inclusive millisecond range.
pub(crate) fn pick_duration(rng: &mut ChaCha8Rng, range_ms: RangeInclusive<u64>) -> Duration {
    Duration::from_millis(rng.gen_range(range_ms))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn seeds_differ_per_actor() {
        assert_eq!(actor_seed(11, GUARD_ID), 11);
        assert_eq!(actor_seed(11, 3), 14);
        assert_eq!(actor_seed(u64::MAX, 1), 0);
    }

    #[test]
    fn same_seed_same_durations() {
        let mut a = actor_rng(11, 2);
        let mut b = actor_rng(11, 2);

        for _ in 0..16 {
            assert_eq!(pick_duration(&mut a, 20..=100), pick_duration(&mut b, 20..=100));
        }
    }

    #[test]
    fn durations_stay_in_range() {
        let mut rng = actor_rng(7, 1);
        for _ in 0..256 {
            let d = pick_duration(&mut rng, 20..=50);
            assert!((20..=50).contains(&u64::try_from(d.as_millis()).unwrap()));
        }
    }

    proptest! {
        #[test]
        fn prop_actor_streams_are_reproducible(
            base in any::<u64>(),
            actor in 0u64..64,
            min in 0u64..200,
            span in 0u64..200,
        ) {
            let mut first = actor_rng(base, actor);
            let mut second = actor_rng(base, actor);

            for _ in 0..8 {
                let d = pick_duration(&mut first, min..=min + span);
                prop_assert_eq!(d, pick_duration(&mut second, min..=min + span));
                let ms = u64::try_from(d.as_millis()).unwrap();
                prop_assert!(ms >= min && ms <= min + span);
            }
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let mut rng = actor_rng(7, 1);
        assert_eq!(pick_duration(&mut rng, 0..=0), Duration::ZERO);
    }
}
