//! Rope Cutter entry point
//!
//! Runs one scripted session headless through the fixed-timestep loop and
//! prints the session summary as JSON.
//!
//! Usage: `rope-cutter [config.json] [--preset easy|normal|hard]`

use std::path::PathBuf;
use std::process::ExitCode;

use glam::Vec3;
use rope_cutter::consts::{MAX_SUBSTEPS, SIM_DT};
use rope_cutter::sim::{
    CutSource, GameEvent, GamePhase, GameState, Gesture, HandSample, Handedness, TickInput, tick,
};
use rope_cutter::{ConfigError, DifficultyPreset, GameConfig};

/// Frame length of the pretend host (slower than the sim, so frames run 1-2 ticks)
const FRAME_DT: f32 = 1.0 / 50.0;
/// Seconds between scripted clicks
const CLICK_PERIOD: f32 = 0.7;
/// Seconds the scripted hand holds each pose
const POSE_PERIOD: f32 = 0.5;
/// Only aim at ropes whose anchor is this close to the middle
const AIM_LIMIT_X: f32 = 6.0;

/// Host loop plus a scripted player
struct Driver {
    state: GameState,
    accumulator: f32,
    input: TickInput,
    clock: f32,
    next_click: f32,
    next_pose: f32,
    hand_ready: bool,
    pointer_cuts: u32,
    gesture_cuts: u32,
}

impl Driver {
    fn new(config: GameConfig) -> Self {
        Self {
            state: GameState::new(config),
            accumulator: 0.0,
            input: TickInput::default(),
            clock: 0.0,
            next_click: CLICK_PERIOD,
            next_pose: POSE_PERIOD,
            hand_ready: false,
            pointer_cuts: 0,
            gesture_cuts: 0,
        }
    }

    /// Run simulation ticks
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input = TickInput::default();
        }

        for event in self.state.drain_events() {
            match event {
                GameEvent::RopeCut { id, score, source, .. } => {
                    match source {
                        CutSource::Pointer => self.pointer_cuts += 1,
                        CutSource::Gesture(_) => self.gesture_cuts += 1,
                    }
                    log::debug!("{:?} cut: +{} (combo x{})", id, score.points, score.combo);
                }
                GameEvent::SessionEnded(summary) => {
                    log::info!("Session over after {:.1}s", summary.duration);
                }
                _ => {}
            }
        }
    }

    /// Point on the middle segment of the `n`th uncut rope near the middle
    fn target(&self, n: usize) -> Option<Vec3> {
        self.state
            .ropes
            .iter()
            .filter(|r| !r.is_cut() && r.anchor_position().x.abs() < AIM_LIMIT_X)
            .nth(n)
            .map(|rope| {
                let centers = rope.segment_positions(&self.state.physics);
                centers[centers.len() / 2]
            })
    }

    /// Click the first rope now and then; swing the right hand in and out of
    /// the ready pose over the second one
    fn play(&mut self, dt: f32) {
        self.clock += dt;

        if self.clock >= self.next_click {
            self.next_click += CLICK_PERIOD;
            if let Some(target) = self.target(0) {
                let click = self.state.camera.world_to_screen(target);
                self.input.clicks.push(click);
            }
        }

        if self.clock >= self.next_pose {
            self.next_pose += POSE_PERIOD;
            self.hand_ready = !self.hand_ready;
        }
        let sample = self.target(1).map(|target| {
            let camera = &self.state.camera;
            let mut position = camera.world_to_screen(target) / camera.viewport();
            if self.state.config.camera.mirror_tracking {
                position.x = 1.0 - position.x;
            }
            HandSample {
                handedness: Handedness::Right,
                position,
                gesture: if self.hand_ready { Gesture::Victory } else { Gesture::ClosedFist },
                confidence: 0.9,
            }
        });
        self.input.hands = Some(sample.into_iter().collect());
    }
}

fn load_config() -> Result<GameConfig, ConfigError> {
    let mut path: Option<PathBuf> = None;
    let mut preset = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--preset" {
            preset = args.next().as_deref().and_then(DifficultyPreset::from_str);
            if preset.is_none() {
                log::warn!("Unknown preset, keeping the configured spawn ramp");
            }
        } else {
            path = Some(PathBuf::from(arg));
        }
    }

    let mut config = match path {
        Some(path) => GameConfig::load(&path)?,
        None => GameConfig::default(),
    };
    if let Some(preset) = preset {
        log::info!("Difficulty: {}", preset.as_str());
        config.apply_preset(preset);
        config.validate()?;
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Rope Cutter (headless) starting...");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut driver = Driver::new(config);
    driver.state.start_session();
    while driver.state.phase == GamePhase::Playing {
        driver.play(FRAME_DT);
        driver.update(FRAME_DT);
    }
    driver.state.clear_ropes();

    log::info!(
        "Cuts: {} by pointer, {} by gesture",
        driver.pointer_cuts,
        driver.gesture_cuts
    );
    match serde_json::to_string_pretty(&driver.state.summary()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Failed to serialize summary: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
