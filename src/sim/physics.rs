//! Physics engine contract and the in-tree rigid body world
//!
//! The session only needs a store of bodies and a fixed-step `step`. Any
//! engine that keeps the most recent integrated state readable between
//! ticks can stand in for `RigidBodyWorld`.

use glam::{Quat, Vec3};

use super::arena::Arena;
use super::body::DiceBody;
use super::collision::{CONTACT_SLOP, ContactManifold, contacts};
use super::handle::{BodyHandle, BodySet};
use crate::clamp_length;
use crate::error::RollError;

/// Approach speed below which contacts do not bounce
pub const RESTITUTION_THRESHOLD: f32 = 1.0;
/// Contact solver passes per step
pub const SOLVER_ITERATIONS: usize = 8;
/// Speeds below which a face-supported die counts as resting
pub const SLEEP_LINEAR_SPEED: f32 = 0.1;
pub const SLEEP_ANGULAR_SPEED: f32 = 0.25;
/// Resting time after which the die's motion is zeroed (seconds)
pub const TIME_UNTIL_SLEEP: f32 = 0.25;

pub trait PhysicsEngine {
    fn bodies(&self) -> &BodySet<DiceBody>;

    fn bodies_mut(&mut self) -> &mut BodySet<DiceBody>;

    /// Advance every dynamic body by `dt` seconds
    fn step(&mut self, dt: f32);

    fn insert_body(&mut self, body: DiceBody) -> BodyHandle {
        self.bodies_mut().insert(body)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> Result<DiceBody, RollError> {
        self.bodies_mut().remove(handle)
    }

    fn body(&self, handle: BodyHandle) -> Result<&DiceBody, RollError> {
        self.bodies().get(handle)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut DiceBody, RollError> {
        self.bodies_mut().get_mut(handle)
    }
}

/// Rigid body integrator with impulse-based contacts against the arena
#[derive(Debug, Clone)]
pub struct RigidBodyWorld {
    arena: Arena,
    gravity: Vec3,
    bodies: BodySet<DiceBody>,
}

impl RigidBodyWorld {
    /// `gravity` is the magnitude of the downward acceleration
    pub fn new(arena: Arena, gravity: f32) -> Self {
        Self {
            arena,
            gravity: Vec3::NEG_Y * gravity,
            bodies: BodySet::new(),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }
}

impl PhysicsEngine for RigidBodyWorld {
    fn bodies(&self) -> &BodySet<DiceBody> {
        &self.bodies
    }

    fn bodies_mut(&mut self) -> &mut BodySet<DiceBody> {
        &mut self.bodies
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.iter_mut() {
            if body.is_dynamic() {
                step_body(body, &self.arena, self.gravity, dt);
            }
        }
    }
}

/// Semi-implicit Euler step for one body
fn step_body(body: &mut DiceBody, arena: &Arena, gravity: Vec3, dt: f32) {
    body.linear_velocity += gravity * dt;

    let manifolds = contacts(body, arena.colliders());
    solve_contacts(body, &manifolds);
    for manifold in &manifolds {
        correct_position(body, manifold);
    }

    // Exponential damping, same form as friction-first integration
    body.linear_velocity /= 1.0 + dt * body.linear_damping;
    body.angular_velocity /= 1.0 + dt * body.angular_damping;

    // A die lying on a face with little motion for long enough is put to
    // sleep. Edge and corner contacts never count, so gravity can still tip
    // them over.
    let on_floor = |m: &&ContactManifold| m.normal.y > 0.9;
    let face_supported = manifolds
        .iter()
        .filter(on_floor)
        .any(|m| m.is_face_support() || !body.shape.is_cube());
    let slow = body.linear_velocity.length() < SLEEP_LINEAR_SPEED
        && body.angular_velocity.length() < SLEEP_ANGULAR_SPEED;
    if face_supported && slow {
        body.resting_time += dt;
    } else {
        body.resting_time = 0.0;
    }
    if body.resting_time >= TIME_UNTIL_SLEEP {
        body.linear_velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
    }

    body.position += body.linear_velocity * dt;
    let spin = body.angular_velocity * dt;
    if spin != Vec3::ZERO {
        body.orientation = (Quat::from_scaled_axis(spin) * body.orientation).normalize();
    }
}

/// One touching point being solved
#[derive(Debug, Clone, Copy)]
struct PointConstraint {
    /// Offset from the centre of mass
    r: Vec3,
    normal: Vec3,
    /// Separating speed the normal impulse aims for
    bounce: f32,
    mu: f32,
    normal_mass: f32,
    normal_impulse: f32,
    tangent_impulse: Vec3,
}

/// Sequential impulses over every touching point.
///
/// Impulses are accumulated per point across iterations and clamped: the
/// normal impulse never pulls, friction stays inside the Coulomb cone.
fn solve_contacts(body: &mut DiceBody, manifolds: &[ContactManifold]) {
    let inv_mass = body.inverse_mass();
    let inv_inertia = body.inverse_inertia();

    let mut constraints = Vec::new();
    for m in manifolds {
        let mu = (body.friction * m.friction).sqrt();
        let restitution = (body.restitution + m.restitution) * 0.5;
        for p in &m.points {
            let r = p.point - body.position;
            let k = inv_mass + inv_inertia * r.cross(p.normal).length_squared();
            if k <= 0.0 {
                continue;
            }
            let vn = body.point_velocity(r).dot(p.normal);
            let bounce = if -vn > RESTITUTION_THRESHOLD {
                -restitution * vn
            } else {
                0.0
            };
            constraints.push(PointConstraint {
                r,
                normal: p.normal,
                bounce,
                mu,
                normal_mass: 1.0 / k,
                normal_impulse: 0.0,
                tangent_impulse: Vec3::ZERO,
            });
        }
    }

    for _ in 0..SOLVER_ITERATIONS {
        for c in constraints.iter_mut() {
            let vn = body.point_velocity(c.r).dot(c.normal);
            let total = (c.normal_impulse + (c.bounce - vn) * c.normal_mass).max(0.0);
            let dn = total - c.normal_impulse;
            c.normal_impulse = total;
            body.apply_impulse_at(c.normal * dn, c.r);

            let v = body.point_velocity(c.r);
            let vt = v - c.normal * v.dot(c.normal);
            let vt_len = vt.length();
            let mut tangent = c.tangent_impulse;
            if vt_len > 1e-6 {
                let t = vt / vt_len;
                let kt = inv_mass + inv_inertia * c.r.cross(t).length_squared();
                tangent -= t * (vt_len / kt);
            }
            let tangent = clamp_length(tangent, c.mu * c.normal_impulse);
            body.apply_impulse_at(tangent - c.tangent_impulse, c.r);
            c.tangent_impulse = tangent;
        }
    }
}

/// Push the die out of a collider, leaving its velocity alone
fn correct_position(body: &mut DiceBody, m: &ContactManifold) {
    let correction = m.depth - CONTACT_SLOP * 0.5;
    if correction > 0.0 {
        body.position += m.normal * correction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::min_face_down_dot;
    use crate::settings::ArenaSettings;
    use crate::sim::BodyMode;

    fn world() -> RigidBodyWorld {
        RigidBodyWorld::new(Arena::build(&ArenaSettings::default()), GRAVITY)
    }

    fn run(world: &mut RigidBodyWorld, seconds: f32) {
        let steps = (seconds / SIM_DT).round() as usize;
        for _ in 0..steps {
            world.step(SIM_DT);
        }
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut world = world();
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, 3.0, 0.0),
            ..Default::default()
        });
        run(&mut world, 1.0);
        let body = world.body(handle).expect("live body");
        assert_eq!(body.position, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_free_fall_follows_gravity() {
        let mut world = world();
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, 5.0, 0.0),
            mode: BodyMode::Dynamic,
            linear_damping: 0.0,
            ..Default::default()
        });
        run(&mut world, 0.2);
        let body = world.body(handle).expect("live body");
        assert!((body.linear_velocity.y + GRAVITY * 0.2).abs() < 0.05);
        assert!(body.position.y < 5.0);
    }

    #[test]
    fn test_flat_drop_comes_to_rest_face_down() {
        let mut world = world();
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, 2.0, 0.0),
            mode: BodyMode::Dynamic,
            ..Default::default()
        });
        run(&mut world, 4.0);

        let body = world.body(handle).expect("live body");
        assert!(body.linear_velocity.length() < VELOCITY_EPS);
        assert!(body.angular_velocity.length() < ANGULAR_EPS);
        assert!((body.position.y - (FLOOR_Y + DICE_SIZE / 2.0)).abs() < 0.05);
        assert!(body.position.y <= FLOOR_REST_Y + SETTLE_TOLERANCE);
        assert!(min_face_down_dot(body.orientation) < FACE_DOWN_DOT);
    }

    #[test]
    fn test_walls_contain_the_die() {
        let settings = ArenaSettings::default();
        let mut world = world();
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, 0.0, 0.0),
            linear_velocity: Vec3::new(10.0, 0.0, 0.0),
            mode: BodyMode::Dynamic,
            ..Default::default()
        });
        for _ in 0..240 {
            world.step(SIM_DT);
            let body = world.body(handle).expect("live body");
            assert!(body.position.x < settings.width / 2.0);
        }
    }

    #[test]
    fn test_spinning_die_against_wall_comes_to_rest() {
        let settings = ArenaSettings::default();
        let mut world = world();
        // Yawed so a vertical edge presses into the +z wall, still spinning
        let yaw = 0.3f32;
        let reach = 0.5 * (yaw.cos() + yaw.sin());
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(
                0.0,
                FLOOR_Y + DICE_SIZE / 2.0 - CONTACT_SLOP / 2.0,
                settings.depth / 2.0 - reach + 0.004,
            ),
            orientation: Quat::from_rotation_y(yaw),
            linear_velocity: Vec3::new(0.2, 0.0, 0.2),
            angular_velocity: Vec3::new(0.0, 0.4, 0.0),
            mode: BodyMode::Dynamic,
            ..Default::default()
        });
        run(&mut world, 3.0);

        let body = world.body(handle).expect("live body");
        assert!(body.linear_velocity.length() < VELOCITY_EPS);
        assert!(body.angular_velocity.length() < ANGULAR_EPS);
        assert!(min_face_down_dot(body.orientation) < FACE_DOWN_DOT);
        assert!(world.arena().contains_xz(body.position));
    }

    #[test]
    fn test_floor_friction_stops_yaw_spin() {
        let mut world = world();
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, FLOOR_Y + DICE_SIZE / 2.0, 0.0),
            angular_velocity: Vec3::new(0.0, 2.0, 0.0),
            mode: BodyMode::Dynamic,
            ..Default::default()
        });
        run(&mut world, 0.5);

        // Damping alone would still leave about 1.5 rad/s
        let body = world.body(handle).expect("live body");
        assert!(body.angular_velocity.length() < ANGULAR_EPS);
    }

    #[test]
    fn test_sliding_die_is_not_put_to_sleep() {
        let mut world = world();
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, FLOOR_Y + DICE_SIZE / 2.0, 0.0),
            linear_velocity: Vec3::new(3.0, 0.0, 0.0),
            mode: BodyMode::Dynamic,
            resting_time: 10.0,
            ..Default::default()
        });
        world.step(SIM_DT);

        let body = world.body(handle).expect("live body");
        assert_eq!(body.resting_time, 0.0);
        assert!(body.linear_velocity.x > 2.0);
    }

    #[test]
    fn test_off_balance_edge_tips_onto_a_face() {
        let mut world = world();
        // Resting on one edge with the centre off to one side
        let tilt = 0.6f32;
        let low = 0.5 * (tilt.cos() + tilt.sin());
        let handle = world.insert_body(DiceBody {
            position: Vec3::new(0.0, FLOOR_Y + low, 0.0),
            orientation: Quat::from_rotation_z(tilt),
            mode: BodyMode::Dynamic,
            ..Default::default()
        });
        run(&mut world, 3.0);

        let body = world.body(handle).expect("live body");
        assert!(min_face_down_dot(body.orientation) < FACE_DOWN_DOT);
        assert!(body.angular_velocity.length() < ANGULAR_EPS);
    }

    #[test]
    fn test_removed_body_is_invalid() {
        let mut world = world();
        let handle = world.insert_body(DiceBody::default());
        assert!(world.remove_body(handle).is_ok());
        assert!(matches!(world.body(handle), Err(RollError::InvalidHandle(_))));
        world.step(SIM_DT);
    }
}
