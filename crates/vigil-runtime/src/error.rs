//! Runtime error types.

use thiserror::Error;
use vigil_core::{ConfigError, RoomError};

/// Errors that can end a run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The run configuration was rejected before any actor started.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The coordinator reported a protocol defect.
    #[error("room protocol error: {0}")]
    Room(#[from] RoomError),

    /// An actor thread could not be spawned.
    #[error("failed to spawn {actor}: {source}")]
    Spawn {
        /// Name of the actor thread.
        actor: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// An actor thread panicked.
    #[error("{actor} panicked")]
    ActorPanicked {
        /// Name of the actor thread.
        actor: String,
    },
}
