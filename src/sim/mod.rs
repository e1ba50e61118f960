//! Simulation module
//!
//! Everything between the roll command and the settle decision. The module
//! is deterministic for fixed seeds:
//! - Fixed physics timestep only
//! - Seeded RNG only (separate streams for launch impulses and results)
//! - Stable iteration order (by body slot)
//! - No rendering or platform dependencies

pub mod arena;
pub mod body;
pub mod collision;
pub mod handle;
pub mod launch;
pub mod physics;
pub mod result;
pub mod session;
pub mod settle;
pub mod state;
pub mod timer;

pub use arena::{Arena, Collider, ColliderShape};
pub use body::{BodyMode, BodyPose, DiceBody, DieShape};
pub use collision::{ContactManifold, PointContact, contacts};
pub use handle::{BodyHandle, BodySet, SessionId};
pub use launch::{ImpulseLauncher, LaunchImpulse};
pub use physics::{PhysicsEngine, RigidBodyWorld};
pub use result::{DiceResult, ResultGenerator};
pub use session::Session;
pub use settle::{MonitorState, SampleOutcome, SettleCause, SettleMonitor, SettleReading};
pub use state::{PendingResult, RollSession, SessionEvent};
pub use timer::{SampleTimer, TimerTicket};
