//! Static arena colliders: one floor plane and four walls

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::DieShape;
use crate::settings::ArenaSettings;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Horizontal half-space; everything below `y` is solid
    Floor { y: f32 },
    /// Axis-aligned box
    Cuboid { center: Vec3, half_extents: Vec3 },
}

/// A fixed piece of collision geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub restitution: f32,
    pub friction: f32,
}

/// Immutable collision geometry bounding the simulation volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    colliders: Vec<Collider>,
    floor_y: f32,
    half_width: f32,
    half_depth: f32,
}

impl Arena {
    /// Build the floor and the four walls
    pub fn build(settings: &ArenaSettings) -> Self {
        let floor_y = settings.floor_y;
        let half_width = settings.width / 2.0;
        let half_depth = settings.depth / 2.0;
        let half_t = settings.wall_thickness / 2.0;
        // Walls sink one thickness into the floor so a corner resting at
        // floor level is always nearest the inner face
        let half_h = (settings.wall_height + settings.wall_thickness) / 2.0;
        let wall_y = floor_y - settings.wall_thickness + half_h;

        let wall = |center: Vec3, half_extents: Vec3| Collider {
            shape: ColliderShape::Cuboid {
                center,
                half_extents,
            },
            restitution: settings.wall_restitution,
            friction: settings.friction,
        };

        // Walls along x overlap the corners so there are no gaps
        let span_x = Vec3::new(half_width + settings.wall_thickness, half_h, half_t);
        let span_z = Vec3::new(half_t, half_h, half_depth + settings.wall_thickness);

        let colliders = vec![
            Collider {
                shape: ColliderShape::Floor { y: floor_y },
                restitution: settings.floor_restitution,
                friction: settings.friction,
            },
            wall(Vec3::new(0.0, wall_y, half_depth + half_t), span_x),
            wall(Vec3::new(0.0, wall_y, -(half_depth + half_t)), span_x),
            wall(Vec3::new(half_width + half_t, wall_y, 0.0), span_z),
            wall(Vec3::new(-(half_width + half_t), wall_y, 0.0), span_z),
        ];

        log::debug!(
            "Arena built: {}x{} floor at y={}, {} colliders",
            settings.width,
            settings.depth,
            floor_y,
            colliders.len()
        );

        Self {
            colliders,
            floor_y,
            half_width,
            half_depth,
        }
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    /// Centre of the floor
    pub fn center(&self) -> Vec3 {
        Vec3::new(0.0, self.floor_y, 0.0)
    }

    /// Where a die of `shape` rests on the centre of the floor
    pub fn rest_position(&self, shape: DieShape) -> Vec3 {
        self.center() + Vec3::Y * shape.half_height()
    }

    /// Whether a point lies within the walls (ignores height)
    pub fn contains_xz(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_width && point.z.abs() <= self.half_depth
    }
}
