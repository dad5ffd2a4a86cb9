//! Event log observer.

use tracing::info;
use vigil_core::{RoomEvent, RoomObserver, RoomSnapshot};

/// Turns room events into the human-readable event log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RoomObserver for TracingObserver {
    fn on_event(&self, event: &RoomEvent, snapshot: &RoomSnapshot) {
        let occupancy = snapshot.occupancy;
        match event {
            RoomEvent::GuardWaiting => {
                info!(occupancy, "guard waiting to enter room");
            },
            RoomEvent::GuardInspecting => info!(occupancy, "guard in room"),
            RoomEvent::GuardLeft => info!("guard left room"),
            RoomEvent::StudentEntered { student } => {
                info!(student, occupancy, "student entered room");
            },
            RoomEvent::StudentLeft { student } => {
                info!(student, occupancy, "student left room");
            },
            RoomEvent::Closed => info!(occupancy, "room closed"),
        }
    }
}
