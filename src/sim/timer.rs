//! Recurring sample timer on the cooperative loop
//!
//! Fires every `interval` seconds from the time it was armed. The timer is
//! bound to one `SessionId`; cancelling it a second time, or cancelling on
//! behalf of another session, is reported instead of silently ignored.

use serde::{Deserialize, Serialize};

use super::handle::SessionId;
use crate::error::RollError;

/// One firing of the timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerTicket {
    pub session: SessionId,
    /// Scheduled fire time
    pub at: f64,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    session: SessionId,
    origin: f64,
    fired: u64,
}

impl Armed {
    fn next_fire(&self, interval: f64) -> f64 {
        // Multiply from the origin so the cadence does not drift
        self.origin + (self.fired + 1) as f64 * interval
    }
}

#[derive(Debug, Clone)]
pub struct SampleTimer {
    interval: f64,
    armed: Option<Armed>,
}

impl SampleTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval as f64,
            armed: None,
        }
    }

    /// Start firing for `session`, first tick one interval after `origin`
    pub fn arm(&mut self, session: SessionId, origin: f64) {
        if let Some(prev) = self.armed.take() {
            log::warn!("Sample timer for {} re-armed without cancel", prev.session);
        }
        self.armed = Some(Armed {
            session,
            origin,
            fired: 0,
        });
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn session(&self) -> Option<SessionId> {
        self.armed.map(|a| a.session)
    }

    /// Time of the next firing, if armed
    pub fn next_due(&self) -> Option<f64> {
        self.armed.map(|a| a.next_fire(self.interval))
    }

    /// Pop the next firing if it is due at or before `now`
    pub fn fire(&mut self, now: f64) -> Option<TimerTicket> {
        let armed = self.armed.as_mut()?;
        let at = armed.next_fire(self.interval);
        if at > now {
            return None;
        }
        armed.fired += 1;
        Some(TimerTicket {
            session: armed.session,
            at,
        })
    }

    /// Stop the timer; exactly one cancel per arm succeeds
    pub fn cancel(&mut self, session: SessionId) -> Result<(), RollError> {
        match self.armed {
            Some(armed) if armed.session == session => {
                self.armed = None;
                Ok(())
            }
            _ => Err(RollError::SessionSuperseded(session)),
        }
    }
}
