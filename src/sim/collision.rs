//! Contact generation between the die and the arena colliders
//!
//! Each collider yields at most one contact manifold. For a cube the
//! manifold holds every corner touching (or inside) the collider; the solver
//! treats each corner as its own contact so friction also resists spin about
//! the contact normal.

use glam::Vec3;

use super::arena::{Collider, ColliderShape};
use super::body::{DiceBody, DieShape};

/// Distance within which a corner counts as touching
pub const CONTACT_SLOP: f32 = 0.005;

/// A single point touching a collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointContact {
    /// World-space contact point
    pub point: Vec3,
    /// Surface normal pointing out of the collider, toward the die
    pub normal: Vec3,
    /// Penetration (negative when only within slop)
    pub depth: f32,
}

/// All contacts between the die and one collider
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub points: Vec<PointContact>,
    /// Average of the point normals
    pub normal: Vec3,
    /// Deepest penetration
    pub depth: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl ContactManifold {
    /// The cube is lying on a face of this collider
    pub fn is_face_support(&self) -> bool {
        self.points.len() >= 3
    }
}

/// Contact of a world point with a collider, if within slop
fn point_contact(point: Vec3, collider: &Collider) -> Option<PointContact> {
    match collider.shape {
        ColliderShape::Floor { y } => {
            let depth = y - point.y;
            (depth > -CONTACT_SLOP).then_some(PointContact {
                point,
                normal: Vec3::Y,
                depth,
            })
        }
        ColliderShape::Cuboid {
            center,
            half_extents,
        } => {
            let local = point - center;
            let overlap = half_extents + Vec3::splat(CONTACT_SLOP) - local.abs();
            if overlap.min_element() <= 0.0 {
                return None;
            }
            // Push out along the axis of least penetration
            let depth = half_extents - local.abs();
            let (axis, d) = if depth.x <= depth.y && depth.x <= depth.z {
                (Vec3::X * local.x.signum(), depth.x)
            } else if depth.y <= depth.z {
                (Vec3::Y * local.y.signum(), depth.y)
            } else {
                (Vec3::Z * local.z.signum(), depth.z)
            };
            Some(PointContact {
                point,
                normal: axis,
                depth: d,
            })
        }
    }
}

/// Sphere against collider: closest surface point within slop
fn sphere_contact(center: Vec3, radius: f32, collider: &Collider) -> Option<PointContact> {
    match collider.shape {
        ColliderShape::Floor { y } => {
            let depth = radius - (center.y - y);
            (depth > -CONTACT_SLOP).then_some(PointContact {
                point: center - Vec3::Y * radius,
                normal: Vec3::Y,
                depth,
            })
        }
        ColliderShape::Cuboid {
            center: box_center,
            half_extents,
        } => {
            let local = center - box_center;
            let closest = local.clamp(-half_extents, half_extents);
            let offset = local - closest;
            let dist = offset.length();
            if dist <= f32::EPSILON {
                // Centre inside the box, fall back to the point test
                return point_contact(center, collider).map(|c| PointContact {
                    depth: c.depth + radius,
                    ..c
                });
            }
            let depth = radius - dist;
            (depth > -CONTACT_SLOP).then_some(PointContact {
                point: box_center + closest,
                normal: offset / dist,
                depth,
            })
        }
    }
}

/// Build one manifold per touching collider
pub fn contacts(body: &DiceBody, colliders: &[Collider]) -> Vec<ContactManifold> {
    let corners = body.corners();
    let mut manifolds = Vec::new();

    for collider in colliders {
        let touching: Vec<PointContact> = match body.shape {
            DieShape::Cube { .. } => corners
                .iter()
                .filter_map(|c| point_contact(*c, collider))
                .collect(),
            DieShape::Sphere { radius } => sphere_contact(body.position, radius, collider)
                .into_iter()
                .collect(),
        };

        if touching.is_empty() {
            continue;
        }

        let normal = touching
            .iter()
            .map(|c| c.normal)
            .sum::<Vec3>()
            .normalize_or(Vec3::Y);
        let depth = touching
            .iter()
            .map(|c| c.depth)
            .fold(f32::NEG_INFINITY, f32::max);

        manifolds.push(ContactManifold {
            points: touching,
            normal,
            depth,
            restitution: collider.restitution,
            friction: collider.friction,
        });
    }

    manifolds
}
