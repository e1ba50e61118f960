//! Impulse launcher: turns a roll command into a dynamic die

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{BodyMode, DiceBody};
use crate::clamp_length;
use crate::settings::{DieSettings, LaunchSettings};

/// The impulses fired at the start of one roll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchImpulse {
    pub linear: Vec3,
    pub torque: Vec3,
}

#[derive(Debug, Clone)]
pub struct ImpulseLauncher {
    rng: Pcg32,
    launch: LaunchSettings,
    die: DieSettings,
    /// Where the die's centre is placed before the impulse
    spawn: Vec3,
}

impl ImpulseLauncher {
    /// `spawn` is the arena centre raised by the die's half height
    pub fn new(seed: u64, launch: LaunchSettings, die: DieSettings, spawn: Vec3) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            launch,
            die,
            spawn,
        }
    }

    /// Draw the next pair of impulses
    pub fn draw(&mut self) -> LaunchImpulse {
        let h = self.launch.horizontal_impulse;
        let linear = Vec3::new(
            self.rng.random_range(-h..=h),
            self.rng
                .random_range(self.launch.vertical_impulse_min..=self.launch.vertical_impulse_max),
            self.rng.random_range(-h..=h),
        );

        // Axis components are not normalized, which biases the spin direction
        let axis = Vec3::new(
            self.rng.random_range(0.0..=1.0),
            self.rng.random_range(0.0..=1.0),
            self.rng.random_range(0.0..=1.0),
        );
        let scale = self.rng.random_range(0.0..=self.launch.torque_max);

        LaunchImpulse {
            linear,
            torque: axis * scale,
        }
    }

    /// Arm the body and fire freshly drawn impulses at it
    pub fn launch(&mut self, body: &mut DiceBody) -> LaunchImpulse {
        let impulse = self.draw();
        self.fire(body, impulse);
        impulse
    }

    /// Arm the body and apply the given impulses.
    ///
    /// Orientation is carried over from the previous rest pose.
    pub fn fire(&self, body: &mut DiceBody, impulse: LaunchImpulse) {
        body.apply_settings(&self.die);
        body.mode = BodyMode::Dynamic;
        body.position = self.spawn;
        body.linear_velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
        body.resting_time = 0.0;

        body.apply_impulse(impulse.linear);
        body.apply_torque_impulse(impulse.torque);
        body.angular_velocity = clamp_length(body.angular_velocity, self.launch.max_angular_speed);

        log::debug!(
            "Launch impulse {:?}, torque {:?}, spin {:.3}",
            impulse.linear,
            impulse.torque,
            body.angular_velocity.length()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use glam::Quat;
    use proptest::prelude::*;

    fn launcher(seed: u64) -> ImpulseLauncher {
        ImpulseLauncher::new(
            seed,
            LaunchSettings::default(),
            DieSettings::default(),
            Vec3::new(0.0, FLOOR_Y + DICE_SIZE / 2.0, 0.0),
        )
    }

    #[test]
    fn test_launch_arms_body_and_keeps_orientation() {
        let tilted = Quat::from_rotation_y(0.7);
        let mut body = DiceBody {
            position: Vec3::new(2.0, 5.0, -1.0),
            orientation: tilted,
            ..Default::default()
        };
        launcher(1).launch(&mut body);

        assert_eq!(body.mode, BodyMode::Dynamic);
        assert_eq!(body.position, Vec3::new(0.0, FLOOR_Y + DICE_SIZE / 2.0, 0.0));
        assert_eq!(body.orientation, tilted);
        assert!(body.linear_velocity.y >= LAUNCH_VERTICAL_MIN / DICE_MASS);
    }

    #[test]
    fn test_same_seed_same_impulses() {
        let mut a = launcher(99);
        let mut b = launcher(99);
        for _ in 0..5 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn test_spin_axis_preserved_by_cap() {
        let l = launcher(0);
        let mut body = DiceBody::default();
        let torque = Vec3::new(1.0, 0.5, 0.25) * 18.0;
        l.fire(&mut body, LaunchImpulse { linear: Vec3::Y * 10.0, torque });
        assert!((body.angular_velocity.length() - MAX_ANGULAR_SPEED).abs() < 1e-4);
        assert!((body.angular_velocity.normalize() - torque.normalize()).length() < 1e-5);
    }

    #[test]
    fn test_small_spin_is_not_rescaled() {
        let l = launcher(0);
        let mut body = DiceBody::default();
        // Cube inverse inertia is 6, so this gives |w| = 0.6
        l.fire(&mut body, LaunchImpulse { linear: Vec3::Y * 10.0, torque: Vec3::X * 0.1 });
        assert!((body.angular_velocity.length() - 0.6).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_impulse_ranges(seed in any::<u64>()) {
            let impulse = launcher(seed).draw();
            prop_assert!(impulse.linear.x.abs() <= LAUNCH_HORIZONTAL_IMPULSE);
            prop_assert!(impulse.linear.z.abs() <= LAUNCH_HORIZONTAL_IMPULSE);
            prop_assert!(impulse.linear.y >= LAUNCH_VERTICAL_MIN);
            prop_assert!(impulse.linear.y <= LAUNCH_VERTICAL_MAX);
            prop_assert!(impulse.torque.min_element() >= 0.0);
            prop_assert!(impulse.torque.max_element() <= LAUNCH_TORQUE_MAX);
        }

        #[test]
        fn prop_spin_never_exceeds_cap(seed in any::<u64>()) {
            let mut body = DiceBody::default();
            launcher(seed).launch(&mut body);
            prop_assert!(body.angular_velocity.length() <= MAX_ANGULAR_SPEED + 1e-4);
        }

        #[test]
        fn prop_cap_holds_for_any_torque(
            x in 0.0f32..=1.0, y in 0.0f32..=1.0, z in 0.0f32..=1.0, scale in 0.0f32..=18.0
        ) {
            let mut body = DiceBody::default();
            launcher(0).fire(&mut body, LaunchImpulse {
                linear: Vec3::Y * 8.0,
                torque: Vec3::new(x, y, z) * scale,
            });
            prop_assert!(body.angular_velocity.length() <= MAX_ANGULAR_SPEED + 1e-4);
        }
    }
}
