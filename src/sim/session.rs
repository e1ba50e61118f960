//! Roll session loop
//!
//! Wires the roll command to the launcher, the fixed-step physics, the
//! settle monitor and the result reveal. Everything runs on one cooperative
//! loop: `advance` processes physics ticks, sample-timer firings and the
//! pending result in time order. On equal times a physics tick runs before
//! a sample, so the monitor always reads the most recent integrated state.

use glam::{Quat, Vec3};

use super::arena::Arena;
use super::body::{BodyPose, DiceBody};
use super::handle::{BodyHandle, SessionId};
use super::launch::ImpulseLauncher;
use super::physics::{PhysicsEngine, RigidBodyWorld};
use super::result::{DiceResult, ResultGenerator};
use super::settle::{MonitorState, SampleOutcome, SettleCause, SettleMonitor};
use super::state::{PendingResult, RollSession, SessionEvent};
use super::timer::{SampleTimer, TimerTicket};
use crate::consts::{MAX_FRAME_DT, SIM_DT};
use crate::error::RollError;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    Tick,
    Sample,
    Result,
}

pub struct Session<E: PhysicsEngine = RigidBodyWorld> {
    settings: Settings,
    engine: E,
    die: BodyHandle,
    rest_position: Vec3,
    launcher: ImpulseLauncher,
    results: ResultGenerator,
    sampler: SampleTimer,
    /// Latest session; kept after it settles with `rolling` cleared
    roll: Option<RollSession>,
    monitor: Option<SettleMonitor>,
    pending_result: Option<PendingResult>,
    last_result: Option<DiceResult>,
    next_session: u32,
    /// Session clock (seconds)
    clock: f64,
    /// Physics ticks since creation
    ticks: u64,
    events: Vec<SessionEvent>,
}

impl Session<RigidBodyWorld> {
    /// Session backed by the in-tree rigid body world
    pub fn new(settings: Settings) -> Self {
        let arena = Arena::build(&settings.arena);
        let engine = RigidBodyWorld::new(arena, settings.gravity);
        Self::with_engine(settings, engine)
    }
}

impl<E: PhysicsEngine> Session<E> {
    /// Insert the die, at rest, into `engine`
    pub fn with_engine(settings: Settings, mut engine: E) -> Self {
        let rest_position = Arena::build(&settings.arena).rest_position(settings.die.shape);
        let die = engine.insert_body(DiceBody::at_rest(&settings.die, rest_position));
        let launcher = ImpulseLauncher::new(
            settings.physics_seed,
            settings.launch.clone(),
            settings.die.clone(),
            rest_position,
        );
        let results = ResultGenerator::new(settings.result_seed);
        let sampler = SampleTimer::new(settings.settle.sample_interval);

        log::info!(
            "Session ready: physics seed {}, result seed {}",
            settings.physics_seed,
            settings.result_seed
        );

        Self {
            settings,
            engine,
            die,
            rest_position,
            launcher,
            results,
            sampler,
            roll: None,
            monitor: None,
            pending_result: None,
            last_result: None,
            next_session: 1,
            clock: 0.0,
            ticks: 0,
            events: Vec::new(),
        }
    }

    /// Roll command: supersede any active roll, launch, start monitoring
    pub fn roll(&mut self) -> Result<SessionId, RollError> {
        let now = self.clock;
        // Leave any active roll untouched if there is no die to launch
        self.engine.body(self.die)?;
        let was_rolling = self.is_rolling();
        if let Some(prev) = self.roll.take().filter(|r| r.rolling) {
            self.supersede(prev);
        }

        let body = self.engine.body_mut(self.die)?;
        let impulse = self.launcher.launch(body);

        let id = SessionId(self.next_session);
        self.next_session += 1;

        let mut monitor = SettleMonitor::new(id, self.die, self.settings.settle.clone());
        monitor.begin(now);
        self.sampler.arm(id, now);
        self.monitor = Some(monitor);
        self.roll = Some(RollSession::new(id, now, impulse));

        let result = self.results.roll();
        if self.pending_result.is_some() {
            log::debug!("Pending result replaced by {}", id);
        }
        self.pending_result = Some(PendingResult {
            result,
            due: now + self.settings.result_delay as f64,
        });

        log::info!("{} launched at t={:.3}", id, now);
        self.events.push(SessionEvent::RollStarted { session: id });
        if !was_rolling {
            self.events.push(SessionEvent::RollingChanged(true));
        }
        Ok(id)
    }

    /// Advance the loop by one frame
    pub fn advance(&mut self, frame_dt: f32) {
        if !frame_dt.is_finite() {
            log::warn!("Ignoring non-finite frame delta {}", frame_dt);
            return;
        }
        let target = self.clock + frame_dt.clamp(0.0, MAX_FRAME_DT) as f64;

        loop {
            let (at, due) = self.next_due();
            if at > target {
                break;
            }
            self.clock = at;

            match due {
                Due::Tick => {
                    self.engine.step(SIM_DT);
                    self.ticks += 1;
                }
                Due::Sample => {
                    if let Some(ticket) = self.sampler.fire(at) {
                        if let Err(e) = self.deliver_sample(ticket) {
                            log::debug!("Sample at t={:.3} skipped: {}", at, e);
                        }
                    }
                }
                Due::Result => {
                    if let Some(pending) = self.pending_result.take() {
                        log::info!(
                            "Result ready: d6={} d20={}",
                            pending.result.d6,
                            pending.result.d20
                        );
                        self.last_result = Some(pending.result);
                        self.events.push(SessionEvent::ResultReady(pending.result));
                    }
                }
            }
        }

        self.clock = target;
    }

    /// Earliest pending piece of work; ties go tick, sample, result
    fn next_due(&self) -> (f64, Due) {
        let mut next = ((self.ticks + 1) as f64 * SIM_DT as f64, Due::Tick);
        if let Some(at) = self.sampler.next_due().filter(|at| *at < next.0) {
            next = (at, Due::Sample);
        }
        if let Some(at) = self.pending_result.map(|p| p.due).filter(|at| *at < next.0) {
            next = (at, Due::Result);
        }
        next
    }

    /// Run one monitor sample for a timer ticket.
    ///
    /// A ticket for a session that is no longer active is a no-op reported
    /// as `SessionSuperseded`.
    pub fn deliver_sample(&mut self, ticket: TimerTicket) -> Result<SampleOutcome, RollError> {
        let active = self
            .roll
            .filter(|r| r.id == ticket.session && r.rolling)
            .ok_or(RollError::SessionSuperseded(ticket.session))?;
        let monitor = self
            .monitor
            .as_mut()
            .filter(|m| m.session() == active.id)
            .ok_or(RollError::SessionSuperseded(ticket.session))?;

        let outcome = monitor.sample(ticket.at, &self.engine)?;
        if let SampleOutcome::Settled { cause, .. } = outcome {
            self.finish(active.id, cause, ticket.at);
        }
        Ok(outcome)
    }

    /// Settled: stop sampling, freeze the die at its rest pose, clear the flag
    fn finish(&mut self, id: SessionId, cause: SettleCause, at: f64) {
        if let Err(e) = self.sampler.cancel(id) {
            log::warn!("Cancel on settle failed: {}", e);
        }
        self.monitor = None;
        let was_rolling = self.is_rolling();
        let elapsed = match self.roll.as_mut() {
            Some(roll) => {
                roll.rolling = false;
                roll.elapsed(at)
            }
            None => 0.0,
        };

        match self.engine.body_mut(self.die) {
            Ok(body) => body.freeze_at(self.rest_position, Quat::IDENTITY),
            Err(e) => log::warn!("Settled die could not be frozen: {}", e),
        }

        match cause {
            SettleCause::Stable => log::info!("{} settled after {:.2}s", id, elapsed),
            SettleCause::Timeout => log::warn!("{} gave up after {:.2}s without settling", id, elapsed),
        }

        self.events.push(SessionEvent::Settled {
            session: id,
            cause,
            at,
        });
        if was_rolling {
            self.events.push(SessionEvent::RollingChanged(false));
        }
    }

    /// Cancel an unfinished session ahead of a new roll
    fn supersede(&mut self, prev: RollSession) {
        if let Err(e) = self.sampler.cancel(prev.id) {
            log::warn!("Cancel on supersede failed: {}", e);
        }
        self.monitor = None;
        match self.engine.body_mut(self.die) {
            Ok(body) => {
                let pose = body.pose();
                body.freeze_at(pose.position, pose.orientation);
            }
            Err(e) => log::debug!("Superseded die is gone: {}", e),
        }
        log::info!("{} superseded after {:.2}s", prev.id, prev.elapsed(self.clock));
        self.events.push(SessionEvent::Superseded { session: prev.id });
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_rolling(&self) -> bool {
        self.roll.is_some_and(|r| r.rolling)
    }

    pub fn last_result(&self) -> Option<DiceResult> {
        self.last_result
    }

    pub fn active_session(&self) -> Option<&RollSession> {
        self.roll.as_ref().filter(|r| r.rolling)
    }

    pub fn monitor_state(&self) -> Option<MonitorState> {
        self.monitor.as_ref().map(|m| m.state())
    }

    /// Current pose for rendering
    pub fn pose(&self) -> Result<BodyPose, RollError> {
        Ok(self.engine.body(self.die)?.pose())
    }

    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn die(&self) -> BodyHandle {
        self.die
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
