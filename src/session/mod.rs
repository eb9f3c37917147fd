//! Session lifecycle: registry, per-session handle, bootstrap state machine

pub mod bootstrap;
mod handle;
mod registry;

pub use bootstrap::{Established, establish};
pub use handle::SessionHandle;
pub use registry::{SessionRegistry, SessionStatus, SessionStatusEntry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// No registered session for the given id
    #[error("session not active")]
    NotFound,

    /// The target served a blocking/forbidden page during bootstrap;
    /// the attempt is aborted and nothing is registered
    #[error("blocked by forbidden page at {url}")]
    Forbidden { session_id: String, url: String },

    /// Agent termination failed during close; the registry entry is
    /// dropped regardless
    #[error("failed to terminate session {session_id}: {message}")]
    Terminate { session_id: String, message: String },

    /// Any other bootstrap failure, after partial-resource cleanup
    #[error("session {session_id} could not be established: {message}")]
    Bootstrap { session_id: String, message: String },
}

impl SessionError {
    /// Session id the failed operation was about, when one exists
    pub fn session_id(&self) -> Option<&str> {
        match self {
            SessionError::Forbidden { session_id, .. }
            | SessionError::Terminate { session_id, .. }
            | SessionError::Bootstrap { session_id, .. } => Some(session_id),
            SessionError::NotFound => None,
        }
    }
}
