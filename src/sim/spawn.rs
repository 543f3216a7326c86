//! Spawn scheduling and the difficulty ramp
//!
//! Difficulty is a pure function of session time: interval and speed are
//! interpolated linearly from their start values to their limits over
//! `ramp_duration`, recomputed at every check.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::{self, WeightedIndex};
use serde::{Deserialize, Serialize};

use super::rope::{Side, TreasureKind};
use crate::settings::SpawnConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnerState {
    Stopped,
    Running,
}

/// Request for the orchestrator to build one assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub side: Side,
    pub speed: f32,
    pub treasure: TreasureKind,
}

/// Distribution over [`TreasureKind::ALL`] for the given weights.
///
/// Fails when every weight is zero or the total overflows `u32`.
pub fn treasure_distribution(weights: [u32; 3]) -> Result<WeightedIndex<u32>, weighted::Error> {
    WeightedIndex::new(weights)
}

#[derive(Debug, Clone)]
pub struct SpawnController {
    config: SpawnConfig,
    state: SpawnerState,
    since_last_spawn: f32,
    treasure_table: WeightedIndex<u32>,
}

impl SpawnController {
    /// Panics on treasure weights that [`crate::GameConfig::validate`] rejects
    pub fn new(config: SpawnConfig) -> Self {
        let treasure_table = match treasure_distribution(config.treasure_weights) {
            Ok(table) => table,
            Err(e) => panic!("unusable treasure weights {:?}: {e}", config.treasure_weights),
        };
        Self {
            config,
            state: SpawnerState::Stopped,
            since_last_spawn: 0.0,
            treasure_table,
        }
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SpawnerState::Running
    }

    /// Begin scheduling; the first spawn comes one full interval later
    pub fn start(&mut self) {
        self.state = SpawnerState::Running;
        self.since_last_spawn = 0.0;
    }

    pub fn stop(&mut self) {
        self.state = SpawnerState::Stopped;
    }

    /// Ramp progress in [0, 1]. A non-positive ramp is complete immediately.
    pub fn difficulty(&self, elapsed: f32) -> f32 {
        if self.config.ramp_duration <= 0.0 {
            return 1.0;
        }
        (elapsed / self.config.ramp_duration).clamp(0.0, 1.0)
    }

    /// Seconds between spawns at session time `elapsed`
    pub fn interval(&self, elapsed: f32) -> f32 {
        let d = self.difficulty(elapsed);
        let c = &self.config;
        c.initial_interval - (c.initial_interval - c.min_interval) * d
    }

    /// Anchor speed for assemblies spawned at session time `elapsed`
    pub fn speed(&self, elapsed: f32) -> f32 {
        let d = self.difficulty(elapsed);
        let c = &self.config;
        c.min_speed + (c.max_speed - c.min_speed) * d
    }

    /// Advance the spawn clock by `dt` and emit at most one request
    pub fn update<R: Rng>(&mut self, dt: f32, elapsed: f32, rng: &mut R) -> Option<SpawnRequest> {
        if !self.is_running() {
            return None;
        }

        self.since_last_spawn += dt;
        if self.since_last_spawn < self.interval(elapsed) {
            return None;
        }
        self.since_last_spawn = 0.0;

        let side = if rng.random_bool(0.5) { Side::Left } else { Side::Right };
        Some(SpawnRequest {
            side,
            speed: self.speed(elapsed),
            treasure: TreasureKind::ALL[self.treasure_table.sample(rng)],
        })
    }
}
