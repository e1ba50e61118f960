//! Error values for the roll pipeline
//!
//! None of these are fatal at runtime: the session loop logs them and skips
//! the tick. Settings I/O is the only place they surface to a caller.

use thiserror::Error;

use crate::sim::{BodyHandle, MonitorState, SessionId};

#[derive(Debug, Error)]
pub enum RollError {
    /// The handle's slot is empty or was reused by a newer body
    #[error("body handle {0} no longer refers to a live body")]
    InvalidHandle(BodyHandle),
    /// The body exists but is not being simulated
    #[error("body {0} has no physics state (static)")]
    NoPhysicsState(BodyHandle),
    /// A timer ticket or cancel request for a session that already ended
    #[error("{0} was superseded or already finished")]
    SessionSuperseded(SessionId),
    /// The monitor was asked to sample outside of the Monitoring state
    #[error("settle monitor is {0:?}, not monitoring")]
    NotMonitoring(MonitorState),
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}
