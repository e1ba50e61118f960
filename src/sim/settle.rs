//! Settle monitor
//!
//! Reduces the noisy simulation state to one decision: has the die come to
//! rest lying flat on a face? The monitor is sampled on its own cadence by
//! the session loop and never decides during the grace period after launch,
//! when a bouncing die can briefly read as motionless.
//!
//! ```text
//! Idle --begin--> Monitoring --all four conditions--> Settled
//!                      \--max_duration exceeded (optional)--> Settled (timeout)
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::DiceBody;
use super::handle::{BodyHandle, SessionId};
use super::physics::PhysicsEngine;
use crate::error::RollError;
use crate::min_face_down_dot;
use crate::settings::SettleSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    Idle,
    Monitoring,
    Settled,
}

/// Why a monitor reached `Settled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettleCause {
    /// All rest conditions held
    Stable,
    /// The optional maximum duration ran out first
    Timeout,
}

/// One sample of the die reduced to the four settle conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettleReading {
    pub speed: f32,
    pub angular_speed: f32,
    pub height: f32,
    /// Minimum face-normal dot with world-down (cubes only)
    pub min_face_dot: Option<f32>,
    pub is_on_floor: bool,
    pub bottom_face_down: bool,
}

impl SettleReading {
    /// Reduce a body's state against the thresholds
    pub fn from_body(body: &DiceBody, settings: &SettleSettings) -> Self {
        Self::new(
            body.linear_velocity,
            body.angular_velocity,
            body.position,
            body.shape
                .is_cube()
                .then(|| min_face_down_dot(body.orientation)),
            settings,
        )
    }

    pub fn new(
        linear_velocity: Vec3,
        angular_velocity: Vec3,
        position: Vec3,
        min_face_dot: Option<f32>,
        settings: &SettleSettings,
    ) -> Self {
        Self {
            speed: linear_velocity.length(),
            angular_speed: angular_velocity.length(),
            height: position.y,
            min_face_dot,
            is_on_floor: position.y <= settings.floor_rest_y + settings.floor_tolerance,
            // Non-cube shapes have no face test and always pass
            bottom_face_down: min_face_dot.is_none_or(|d| d < settings.face_down_dot),
        }
    }

    /// All four conditions at once
    pub fn is_settled(&self, settings: &SettleSettings) -> bool {
        self.speed < settings.velocity_eps
            && self.angular_speed < settings.angular_eps
            && self.is_on_floor
            && self.bottom_face_down
    }
}

/// Result of one sample while monitoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleOutcome {
    /// Too early to decide
    GracePeriod,
    /// Still moving or not resting flat
    Moving(SettleReading),
    /// Transitioned to `Settled` on this sample
    Settled {
        reading: SettleReading,
        cause: SettleCause,
    },
}

/// Settle state machine bound to one session and one body
#[derive(Debug, Clone)]
pub struct SettleMonitor {
    session: SessionId,
    body: BodyHandle,
    settings: SettleSettings,
    state: MonitorState,
    start_time: f64,
    samples: u32,
}

impl SettleMonitor {
    pub fn new(session: SessionId, body: BodyHandle, settings: SettleSettings) -> Self {
        Self {
            session,
            body,
            settings,
            state: MonitorState::Idle,
            start_time: 0.0,
            samples: 0,
        }
    }

    /// Idle -> Monitoring
    pub fn begin(&mut self, now: f64) {
        self.state = MonitorState::Monitoring;
        self.start_time = now;
        self.samples = 0;
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Sample the body through the engine
    pub fn sample<E: PhysicsEngine + ?Sized>(
        &mut self,
        now: f64,
        engine: &E,
    ) -> Result<SampleOutcome, RollError> {
        if self.state != MonitorState::Monitoring {
            return Err(RollError::NotMonitoring(self.state));
        }
        let body = engine.body(self.body)?;
        if !body.is_dynamic() {
            return Err(RollError::NoPhysicsState(self.body));
        }
        let reading = SettleReading::from_body(body, &self.settings);
        self.observe(now, reading)
    }

    /// Feed a precomputed reading
    pub fn observe(&mut self, now: f64, reading: SettleReading) -> Result<SampleOutcome, RollError> {
        if self.state != MonitorState::Monitoring {
            return Err(RollError::NotMonitoring(self.state));
        }
        self.samples += 1;

        let elapsed = now - self.start_time;
        if elapsed < self.settings.grace_period as f64 {
            return Ok(SampleOutcome::GracePeriod);
        }

        let cause = if reading.is_settled(&self.settings) {
            SettleCause::Stable
        } else if self
            .settings
            .max_duration
            .is_some_and(|max| elapsed >= max as f64)
        {
            SettleCause::Timeout
        } else {
            log::trace!(
                "{} moving: v={:.4} w={:.4} y={:.3} face={:?}",
                self.session,
                reading.speed,
                reading.angular_speed,
                reading.height,
                reading.min_face_dot
            );
            return Ok(SampleOutcome::Moving(reading));
        };

        self.state = MonitorState::Settled;
        Ok(SampleOutcome::Settled { reading, cause })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use proptest::prelude::*;

    fn settings() -> SettleSettings {
        SettleSettings::default()
    }

    fn monitor() -> SettleMonitor {
        let mut m = SettleMonitor::new(
            SessionId(1),
            BodyHandle {
                index: 0,
                generation: 0,
            },
            settings(),
        );
        m.begin(0.0);
        m
    }

    /// A reading at rest on a face
    fn resting() -> SettleReading {
        SettleReading::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(0.0, FLOOR_REST_Y, 0.0),
            Some(-0.99),
            &settings(),
        )
    }

    #[test]
    fn test_settles_after_grace_when_resting() {
        let mut m = monitor();
        assert_eq!(m.observe(0.5, resting()).ok(), Some(SampleOutcome::GracePeriod));
        assert!(matches!(
            m.observe(1.05, resting()),
            Ok(SampleOutcome::Settled {
                cause: SettleCause::Stable,
                ..
            })
        ));
        assert_eq!(m.state(), MonitorState::Settled);
    }

    #[test]
    fn test_each_condition_is_required() {
        let s = settings();
        let rest_pos = Vec3::new(0.0, FLOOR_REST_Y, 0.0);

        let fast = SettleReading::new(Vec3::X * 0.02, Vec3::ZERO, rest_pos, Some(-0.99), &s);
        let spinning = SettleReading::new(Vec3::ZERO, Vec3::Y * 0.02, rest_pos, Some(-0.99), &s);
        let floating = SettleReading::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(0.0, FLOOR_REST_Y + SETTLE_TOLERANCE + 0.01, 0.0),
            Some(-0.99),
            &s,
        );
        let on_edge = SettleReading::new(Vec3::ZERO, Vec3::ZERO, rest_pos, Some(-0.707), &s);

        assert!(resting().is_settled(&s));
        for reading in [fast, spinning, floating, on_edge] {
            assert!(!reading.is_settled(&s));
            let mut m = monitor();
            assert!(matches!(m.observe(2.0, reading), Ok(SampleOutcome::Moving(_))));
            assert_eq!(m.state(), MonitorState::Monitoring);
        }
    }

    #[test]
    fn test_non_cube_skips_face_test() {
        let reading = SettleReading::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(0.0, FLOOR_REST_Y, 0.0),
            None,
            &settings(),
        );
        assert!(reading.bottom_face_down);
        assert!(reading.is_settled(&settings()));
    }

    #[test]
    fn test_settled_is_terminal() {
        let mut m = monitor();
        assert!(matches!(m.observe(1.5, resting()), Ok(SampleOutcome::Settled { .. })));
        // Further samples never report a second transition
        assert!(matches!(
            m.observe(1.55, resting()),
            Err(RollError::NotMonitoring(MonitorState::Settled))
        ));
        assert_eq!(m.samples(), 1);
    }

    #[test]
    fn test_idle_monitor_rejects_engine_samples() {
        use crate::settings::ArenaSettings;
        use crate::sim::{Arena, RigidBodyWorld};

        let world = RigidBodyWorld::new(Arena::build(&ArenaSettings::default()), GRAVITY);
        let mut m = SettleMonitor::new(
            SessionId(3),
            BodyHandle {
                index: 0,
                generation: 0,
            },
            settings(),
        );
        assert!(matches!(
            m.sample(0.0, &world),
            Err(RollError::NotMonitoring(MonitorState::Idle))
        ));
        m.begin(0.0);
        assert!(matches!(m.sample(0.0, &world), Err(RollError::InvalidHandle(_))));
    }

    #[test]
    fn test_timeout_escape_hatch() {
        let s = SettleSettings {
            max_duration: Some(5.0),
            ..settings()
        };
        let mut m = SettleMonitor::new(
            SessionId(2),
            BodyHandle {
                index: 0,
                generation: 0,
            },
            s.clone(),
        );
        m.begin(10.0);
        let moving = SettleReading::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, Some(-0.5), &s);
        assert!(matches!(m.observe(14.9, moving), Ok(SampleOutcome::Moving(_))));
        assert!(matches!(
            m.observe(15.0, moving),
            Ok(SampleOutcome::Settled {
                cause: SettleCause::Timeout,
                ..
            })
        ));
    }

    #[test]
    fn test_no_timeout_by_default() {
        let mut m = monitor();
        let moving = SettleReading::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, Some(-0.5), &settings());
        for i in 0..2_000 {
            let now = i as f64 * SAMPLE_INTERVAL as f64;
            assert!(matches!(m.observe(now, moving), Ok(SampleOutcome::Moving(_) | SampleOutcome::GracePeriod)));
        }
    }

    proptest! {
        #[test]
        fn prop_never_settles_during_grace(
            elapsed in 0.0f64..1.0,
            v in 0.0f32..0.005,
            w in 0.0f32..0.005,
            dot in -1.0f32..1.0,
        ) {
            let s = settings();
            let mut m = monitor();
            let reading = SettleReading::new(
                Vec3::X * v,
                Vec3::Z * w,
                Vec3::new(0.0, FLOOR_REST_Y, 0.0),
                Some(dot),
                &s,
            );
            prop_assert_eq!(m.observe(elapsed, reading).ok(), Some(SampleOutcome::GracePeriod));
            prop_assert_eq!(m.state(), MonitorState::Monitoring);
        }
    }
}
