//! Vigil core: the room access protocol.
//!
//! One guard and many students share a single room. The guard never
//! inspects while a student is inside, and students never exceed the room's
//! capacity.
//!
//! ## Architecture
//!
//! ```text
//! vigil-core
//!   ├─ BinaryGate        (single-token semaphore, FIFO wakeup)
//!   ├─ RoomState         (occupancy + guard status, crate-private)
//!   ├─ RoomAccess        (enter / leave / inspect / close)
//!   │    ├─ Coordinator      (mutex + condition variables)
//!   │    └─ GateCoordinator  (three binary gates)
//!   ├─ RoomObserver      (linearized event stream)
//!   ├─ Environment       (time source for actor activities)
//!   └─ RunConfig         (actor counts, timing, protocol)
//! ```
//!
//! Nothing here spawns threads. The runtime crate drives the actors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod env;
pub mod error;
pub mod event;
pub mod gate;
pub mod gate_coordinator;
pub mod state;

pub use config::{DEFAULT_SEED, MAX_STUDENTS, Protocol, RunConfig, TimingConfig};
pub use coordinator::{Coordinator, RoomAccess};
pub use env::Environment;
pub use error::{ConfigError, GateError, RoomError};
pub use event::{NoopObserver, ObserverSet, RoomEvent, RoomObserver};
pub use gate::{BinaryGate, GateKind};
pub use gate_coordinator::GateCoordinator;
pub use state::{GuardStatus, RoomSnapshot, StudentId};
