//! The simulated die

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::DieSettings;

/// Collision geometry of the die.
///
/// The d20 shares the cube geometry; there is no 20-sided collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DieShape {
    Cube { size: f32 },
    Sphere { radius: f32 },
}

impl DieShape {
    /// Distance from centre to the floor when resting
    pub fn half_height(&self) -> f32 {
        match *self {
            DieShape::Cube { size } => size / 2.0,
            DieShape::Sphere { radius } => radius,
        }
    }

    /// Scalar inverse inertia (both shapes are isotropic)
    pub fn inverse_inertia(&self, mass: f32) -> f32 {
        let inertia = match *self {
            DieShape::Cube { size } => mass * size * size / 6.0,
            DieShape::Sphere { radius } => 0.4 * mass * radius * radius,
        };
        if inertia > 0.0 { 1.0 / inertia } else { 0.0 }
    }

    pub fn is_cube(&self) -> bool {
        matches!(self, DieShape::Cube { .. })
    }
}

/// Whether the physics engine integrates the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyMode {
    #[default]
    Static,
    Dynamic,
}

/// Read-only pose handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// The single rigid body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceBody {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub shape: DieShape,
    pub mode: BodyMode,
    /// Seconds spent face-supported below the sleep speeds
    #[serde(default)]
    pub resting_time: f32,
}

impl Default for DiceBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: DICE_MASS,
            friction: DICE_FRICTION,
            restitution: DICE_RESTITUTION,
            linear_damping: DICE_LINEAR_DAMPING,
            angular_damping: DICE_ANGULAR_DAMPING,
            shape: DieShape::Cube { size: DICE_SIZE },
            mode: BodyMode::Static,
            resting_time: 0.0,
        }
    }
}

impl DiceBody {
    /// A static die resting at `position`
    pub fn at_rest(settings: &DieSettings, position: Vec3) -> Self {
        let mut body = Self {
            position,
            ..Self::default()
        };
        body.apply_settings(settings);
        body
    }

    /// Copy the physical constants from settings
    pub fn apply_settings(&mut self, settings: &DieSettings) {
        self.shape = settings.shape;
        self.mass = settings.mass;
        self.friction = settings.friction;
        self.restitution = settings.restitution;
        self.linear_damping = settings.linear_damping;
        self.angular_damping = settings.angular_damping;
    }

    pub fn is_dynamic(&self) -> bool {
        self.mode == BodyMode::Dynamic
    }

    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }

    pub fn inverse_inertia(&self) -> f32 {
        self.shape.inverse_inertia(self.mass)
    }

    /// Instantaneous change of linear momentum
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.linear_velocity += impulse * self.inverse_mass();
    }

    /// Instantaneous change of angular momentum
    pub fn apply_torque_impulse(&mut self, torque: Vec3) {
        self.angular_velocity += torque * self.inverse_inertia();
    }

    /// Impulse applied at offset `r` from the centre of mass
    pub fn apply_impulse_at(&mut self, impulse: Vec3, r: Vec3) {
        self.apply_impulse(impulse);
        self.apply_torque_impulse(r.cross(impulse));
    }

    /// Velocity of the material point at offset `r` from the centre
    pub fn point_velocity(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    /// Stop all motion and switch to static at the given pose
    pub fn freeze_at(&mut self, position: Vec3, orientation: Quat) {
        self.mode = BodyMode::Static;
        self.position = position;
        self.orientation = orientation;
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.resting_time = 0.0;
    }

    pub fn pose(&self) -> BodyPose {
        BodyPose {
            position: self.position,
            orientation: self.orientation,
        }
    }

    /// World-space corners for a cube, empty for other shapes
    pub fn corners(&self) -> Vec<Vec3> {
        let DieShape::Cube { size } = self.shape else {
            return Vec::new();
        };
        let h = size / 2.0;
        let mut corners = Vec::with_capacity(8);
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    corners.push(self.position + self.orientation * Vec3::new(sx * h, sy * h, sz * h));
                }
            }
        }
        corners
    }
}
