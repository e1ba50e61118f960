//! Death by Dice entry point
//!
//! Headless runner: rolls the die, drives the session loop at a fixed frame
//! rate and prints a JSON summary of every roll.
//!
//! Usage: `death-by-dice [settings.json] [rolls]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::process::ExitCode;

    use serde::Serialize;

    use death_by_dice::Settings;
    use death_by_dice::sim::{BodyPose, DiceResult, Session, SessionEvent, SettleCause};

    /// Presentation frame rate of the headless loop
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Stop waiting for a roll after this much simulated time
    const MAX_ROLL_SECONDS: f64 = 120.0;

    #[derive(Debug, Serialize)]
    struct RollSummary {
        roll: u32,
        result: Option<DiceResult>,
        settle_cause: Option<SettleCause>,
        settle_seconds: Option<f64>,
        final_pose: Option<BodyPose>,
    }

    pub fn run() -> ExitCode {
        env_logger::init();
        log::info!("Death by Dice (native) starting...");

        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => Settings::load(path),
            None => Settings::default(),
        };
        let rolls: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

        let mut session = Session::new(settings);
        let mut summaries = Vec::new();
        let mut ok = true;

        for roll in 1..=rolls {
            let started = session.now();
            if let Err(e) = session.roll() {
                log::error!("Roll {} failed: {}", roll, e);
                return ExitCode::FAILURE;
            }

            let mut summary = RollSummary {
                roll,
                result: None,
                settle_cause: None,
                settle_seconds: None,
                final_pose: None,
            };

            // Wait for both the settle and the result reveal
            while (session.is_rolling() || summary.result.is_none())
                && session.now() - started < MAX_ROLL_SECONDS
            {
                session.advance(FRAME_DT);
                for event in session.drain_events() {
                    match event {
                        SessionEvent::Settled { cause, at, .. } => {
                            summary.settle_cause = Some(cause);
                            summary.settle_seconds = Some(at - started);
                        }
                        SessionEvent::ResultReady(result) => summary.result = Some(result),
                        SessionEvent::RollingChanged(rolling) => {
                            log::debug!("Rolling: {}", rolling)
                        }
                        _ => {}
                    }
                }
            }

            if session.is_rolling() {
                log::warn!("Roll {} still moving after {}s", roll, MAX_ROLL_SECONDS);
                ok = false;
            }
            summary.final_pose = session.pose().ok();
            summaries.push(summary);
        }

        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Could not encode summary: {}", e);
                return ExitCode::FAILURE;
            }
        }

        if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front-end; the library is driven by the host page
}
