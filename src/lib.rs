//! Death by Dice - a physically simulated die with settle detection
//!
//! Core modules:
//! - `sim`: Simulation (arena, rigid body world, launcher, settle monitor, session)
//! - `settings`: Tunable configuration loaded from JSON
//! - `error`: Error values for stale handles and cancelled sessions

pub mod error;
pub mod settings;
pub mod sim;

pub use error::RollError;
pub use settings::Settings;

use glam::{Quat, Vec3};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Largest frame delta accepted by the session loop (prevents spiral of death)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Gravity magnitude (units/s², pointing down)
    pub const GRAVITY: f32 = 15.0;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 8.0;
    pub const ARENA_DEPTH: f32 = 8.0;
    pub const WALL_HEIGHT: f32 = 8.0;
    pub const WALL_THICKNESS: f32 = 0.5;
    /// Height of the arena floor plane
    pub const FLOOR_Y: f32 = -1.0;
    pub const FLOOR_RESTITUTION: f32 = 0.2;
    pub const WALL_RESTITUTION: f32 = 0.2;
    pub const ARENA_FRICTION: f32 = 0.6;

    /// Die defaults
    pub const DICE_SIZE: f32 = 1.0;
    pub const DICE_MASS: f32 = 1.0;
    pub const DICE_FRICTION: f32 = 0.6;
    pub const DICE_RESTITUTION: f32 = 0.3;
    pub const DICE_LINEAR_DAMPING: f32 = 0.1;
    pub const DICE_ANGULAR_DAMPING: f32 = 0.5;

    /// Launch impulse ranges
    pub const LAUNCH_HORIZONTAL_IMPULSE: f32 = 4.0;
    pub const LAUNCH_VERTICAL_MIN: f32 = 8.0;
    pub const LAUNCH_VERTICAL_MAX: f32 = 12.0;
    pub const LAUNCH_TORQUE_MAX: f32 = 18.0;
    /// Angular speed cap applied right after the launch impulse
    pub const MAX_ANGULAR_SPEED: f32 = 2.5;

    /// Settle monitor sampling cadence (seconds)
    pub const SAMPLE_INTERVAL: f32 = 0.05;
    /// No settle decision before this much time has passed since launch
    pub const GRACE_PERIOD: f32 = 1.0;
    pub const VELOCITY_EPS: f32 = 0.01;
    pub const ANGULAR_EPS: f32 = 0.01;
    /// Resting-surface height used by the settle test (not the floor plane)
    pub const FLOOR_REST_Y: f32 = -0.5;
    pub const SETTLE_TOLERANCE: f32 = 0.2;
    /// A face counts as "down" when its normal's dot with world-down is below this
    pub const FACE_DOWN_DOT: f32 = -0.98;

    /// Delay between the roll command and the reported result (seconds)
    pub const RESULT_DELAY: f32 = 0.5;
}

/// World-space down direction
pub const WORLD_DOWN: Vec3 = Vec3::NEG_Y;

/// Local face normals of a cube, one per face
pub const CUBE_FACE_NORMALS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Smallest dot product between a rotated cube face normal and world-down.
///
/// A cube lying flat has one face pointing straight down (≈ -1). Balanced on
/// an edge the best face only reaches about -0.707, on a corner about -0.577.
#[inline]
pub fn min_face_down_dot(orientation: Quat) -> f32 {
    CUBE_FACE_NORMALS
        .iter()
        .map(|n| (orientation * *n).dot(WORLD_DOWN))
        .fold(f32::INFINITY, f32::min)
}

/// Rescale `v` so its length does not exceed `max`, keeping its direction
#[inline]
pub fn clamp_length(v: Vec3, max: f32) -> Vec3 {
    let len = v.length();
    if len > max && len > 0.0 {
        v * (max / len)
    } else {
        v
    }
}
