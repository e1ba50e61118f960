//! Roll settings
//!
//! Every tunable of the arena, die, launcher and settle monitor. Loaded from
//! a JSON file; any missing field falls back to the defaults in `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::RollError;
use crate::sim::DieShape;

/// Static arena geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Inner extent along x
    pub width: f32,
    /// Inner extent along z
    pub depth: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    /// Height of the floor plane
    pub floor_y: f32,
    pub floor_restitution: f32,
    pub wall_restitution: f32,
    pub friction: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            depth: ARENA_DEPTH,
            wall_height: WALL_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            floor_y: FLOOR_Y,
            floor_restitution: FLOOR_RESTITUTION,
            wall_restitution: WALL_RESTITUTION,
            friction: ARENA_FRICTION,
        }
    }
}

/// Physical constants applied to the die on every launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DieSettings {
    pub shape: DieShape,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for DieSettings {
    fn default() -> Self {
        Self {
            shape: DieShape::Cube { size: DICE_SIZE },
            mass: DICE_MASS,
            friction: DICE_FRICTION,
            restitution: DICE_RESTITUTION,
            linear_damping: DICE_LINEAR_DAMPING,
            angular_damping: DICE_ANGULAR_DAMPING,
        }
    }
}

/// Random launch impulse ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    /// Horizontal impulse components are drawn from [-h, h]
    pub horizontal_impulse: f32,
    pub vertical_impulse_min: f32,
    pub vertical_impulse_max: f32,
    /// Torque scale is drawn from [0, max]
    pub torque_max: f32,
    /// Angular speed cap applied right after the impulses
    pub max_angular_speed: f32,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            horizontal_impulse: LAUNCH_HORIZONTAL_IMPULSE,
            vertical_impulse_min: LAUNCH_VERTICAL_MIN,
            vertical_impulse_max: LAUNCH_VERTICAL_MAX,
            torque_max: LAUNCH_TORQUE_MAX,
            max_angular_speed: MAX_ANGULAR_SPEED,
        }
    }
}

/// Settle monitor thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleSettings {
    pub sample_interval: f32,
    pub grace_period: f32,
    pub velocity_eps: f32,
    pub angular_eps: f32,
    /// Resting-surface height; deliberately separate from `ArenaSettings::floor_y`
    pub floor_rest_y: f32,
    pub floor_tolerance: f32,
    pub face_down_dot: f32,
    /// Give up and force the rest pose after this long (None = poll forever)
    pub max_duration: Option<f32>,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            sample_interval: SAMPLE_INTERVAL,
            grace_period: GRACE_PERIOD,
            velocity_eps: VELOCITY_EPS,
            angular_eps: ANGULAR_EPS,
            floor_rest_y: FLOOR_REST_Y,
            floor_tolerance: SETTLE_TOLERANCE,
            face_down_dot: FACE_DOWN_DOT,
            max_duration: None,
        }
    }
}

/// All roll settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arena: ArenaSettings,
    pub die: DieSettings,
    pub launch: LaunchSettings,
    pub settle: SettleSettings,

    /// Gravity magnitude (applied along -y)
    pub gravity: f32,
    /// Seconds between the roll command and the reported result
    pub result_delay: f32,

    // === Seeds ===
    /// Seed for launch impulses
    pub physics_seed: u64,
    /// Seed for the d6/d20 result stream
    pub result_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena: ArenaSettings::default(),
            die: DieSettings::default(),
            launch: LaunchSettings::default(),
            settle: SettleSettings::default(),
            gravity: GRAVITY,
            result_delay: RESULT_DELAY,
            physics_seed: 0x5EED_D1CE,
            result_seed: 0xD20_D6,
        }
    }
}

impl Settings {
    /// Create settings with both RNG streams derived from one seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            physics_seed: seed,
            result_seed: seed.wrapping_mul(0x9E37_79B9_7F4A_7C15),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RollError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, RollError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a JSON file
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, RollError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults if the file is missing or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RollError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
