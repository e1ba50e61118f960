//! Roll session state and the events it emits

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::handle::SessionId;
use super::launch::LaunchImpulse;
use super::result::DiceResult;
use super::settle::SettleCause;

/// One roll, from command to settle or supersession
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollSession {
    pub id: SessionId,
    /// Session clock time of the roll command
    pub start_time: f64,
    pub launch_impulse: Vec3,
    pub launch_torque: Vec3,
    /// Cleared when the die settles
    pub rolling: bool,
}

impl RollSession {
    pub fn new(id: SessionId, start_time: f64, impulse: LaunchImpulse) -> Self {
        Self {
            id,
            start_time,
            launch_impulse: impulse.linear,
            launch_torque: impulse.torque,
            rolling: true,
        }
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.start_time
    }
}

/// Outputs consumed by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The "is rolling" flag changed
    RollingChanged(bool),
    /// A new session launched the die
    RollStarted { session: SessionId },
    /// A session was replaced by a newer roll before settling
    Superseded { session: SessionId },
    /// The die came to rest (or the optional timeout fired)
    Settled {
        session: SessionId,
        cause: SettleCause,
        at: f64,
    },
    /// The logical result for the latest roll command
    ResultReady(DiceResult),
}

/// A drawn result waiting for its reveal time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingResult {
    pub result: DiceResult,
    pub due: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_session_records_launch() {
        let impulse = LaunchImpulse {
            linear: Vec3::new(1.0, 9.0, -2.0),
            torque: Vec3::new(0.0, 3.0, 0.0),
        };
        let roll = RollSession::new(SessionId(3), 2.5, impulse);
        assert_eq!(roll.id, SessionId(3));
        assert_eq!(roll.launch_impulse, impulse.linear);
        assert_eq!(roll.launch_torque, impulse.torque);
        assert!(roll.rolling);
        assert!((roll.elapsed(4.0) - 1.5).abs() < 1e-12);
    }
}
