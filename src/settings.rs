//! Game configuration and balance
//!
//! Loaded from JSON (every section optional) and validated before a session
//! is built from it.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_CUT_RADIUS;
use crate::sim::gesture::Gesture;
use crate::sim::spawn::treasure_distribution;

/// Configuration problems surfaced to whoever loads the config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}

/// Difficulty presets layered over the default balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Spawn ramp for this preset
    pub fn spawn_config(&self) -> SpawnConfig {
        let base = SpawnConfig::default();
        match self {
            DifficultyPreset::Easy => SpawnConfig {
                initial_interval: 2.5,
                min_interval: 1.0,
                min_speed: 0.8,
                max_speed: 2.0,
                ..base
            },
            DifficultyPreset::Normal => base,
            DifficultyPreset::Hard => SpawnConfig {
                initial_interval: 1.5,
                min_interval: 0.4,
                min_speed: 1.5,
                max_speed: 4.0,
                ..base
            },
        }
    }
}

/// Session length
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub duration_secs: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60.0,
        }
    }
}

/// Spawn cadence and difficulty ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Seconds between spawns at the start of the session
    pub initial_interval: f32,
    /// Seconds between spawns once the ramp is complete
    pub min_interval: f32,
    /// Anchor speed at the start of the session (units/s)
    pub min_speed: f32,
    /// Anchor speed once the ramp is complete (units/s)
    pub max_speed: f32,
    /// Seconds over which interval and speed interpolate
    pub ramp_duration: f32,
    /// Relative spawn weights for bronze, silver, gold treasures
    pub treasure_weights: [u32; 3],
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_interval: 2.0,
            min_interval: 0.6,
            min_speed: 1.0,
            max_speed: 3.0,
            ramp_duration: 60.0,
            treasure_weights: [60, 30, 10],
        }
    }
}

/// Rope chain shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RopeConfig {
    pub segment_count: usize,
    pub segment_length: f32,
    pub segment_radius: f32,
    pub segment_mass: f32,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            segment_count: 5,
            segment_length: 0.5,
            segment_radius: 0.08,
            segment_mass: 0.1,
        }
    }
}

/// Combo scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Max seconds between cuts for the combo to continue
    pub combo_timeout_secs: f32,
    /// Extra fraction of base points per combo step past the first
    pub combo_bonus_rate: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            combo_timeout_secs: 3.0,
            combo_bonus_rate: 0.1,
        }
    }
}

/// Gesture-driven cutting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Pose whose exit fires a cut
    pub ready_gesture: Gesture,
    /// Classifications below this confidence leave gesture state untouched
    pub min_confidence: f32,
    /// Radius of the cut sphere around the hand (world units)
    pub cut_radius: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            ready_gesture: Gesture::Victory,
            min_confidence: 0.5,
            cut_radius: DEFAULT_CUT_RADIUS,
        }
    }
}

/// Play field layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// |x| at which anchors enter
    pub spawn_x: f32,
    /// |x| beyond which assemblies are torn down
    pub despawn_x: f32,
    /// Height of the anchor line
    pub anchor_height: f32,
    /// Vertical gravity (negative is down)
    pub gravity: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            spawn_x: 8.0,
            despawn_x: 10.0,
            anchor_height: 4.0,
            gravity: -9.81,
        }
    }
}

/// Render camera used to turn screen and tracking coordinates into world space
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_y_degrees: f32,
    /// Viewport size in pixels
    pub viewport: [f32; 2],
    /// Front-facing cameras deliver a mirrored image
    pub mirror_tracking: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 1.0, 12.0],
            target: [0.0, 1.0, 0.0],
            fov_y_degrees: 50.0,
            viewport: [1280.0, 720.0],
            mirror_tracking: true,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    pub session: SessionConfig,
    pub spawn: SpawnConfig,
    pub rope: RopeConfig,
    pub score: ScoreConfig,
    pub gesture: GestureConfig,
    pub field: FieldConfig,
    pub camera: CameraConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            session: SessionConfig::default(),
            spawn: SpawnConfig::default(),
            rope: RopeConfig::default(),
            score: ScoreConfig::default(),
            gesture: GestureConfig::default(),
            field: FieldConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl GameConfig {
    /// Create a config from a difficulty preset (applies preset spawn ramp)
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        self.spawn = preset.spawn_config();
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.duration_secs <= 0.0 {
            return Err(ConfigError::invalid("session.duration_secs", "must be positive"));
        }

        let spawn = &self.spawn;
        if spawn.min_interval <= 0.0 {
            return Err(ConfigError::invalid("spawn.min_interval", "must be positive"));
        }
        if spawn.initial_interval < spawn.min_interval {
            return Err(ConfigError::invalid(
                "spawn.initial_interval",
                "must not be below min_interval",
            ));
        }
        if spawn.min_speed < 0.0 || spawn.max_speed < spawn.min_speed {
            return Err(ConfigError::invalid(
                "spawn.max_speed",
                "must be at least min_speed, which must be non-negative",
            ));
        }
        if treasure_distribution(spawn.treasure_weights).is_err() {
            return Err(ConfigError::invalid(
                "spawn.treasure_weights",
                "must not all be zero and must sum to at most u32::MAX",
            ));
        }

        let rope = &self.rope;
        if rope.segment_count == 0 {
            return Err(ConfigError::invalid("rope.segment_count", "must be at least 1"));
        }
        if rope.segment_length <= 0.0 || rope.segment_radius <= 0.0 || rope.segment_mass <= 0.0 {
            return Err(ConfigError::invalid(
                "rope",
                "segment length, radius and mass must be positive",
            ));
        }

        if self.score.combo_timeout_secs < 0.0 {
            return Err(ConfigError::invalid("score.combo_timeout_secs", "must not be negative"));
        }
        if self.score.combo_bonus_rate < 0.0 {
            return Err(ConfigError::invalid("score.combo_bonus_rate", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.gesture.min_confidence) {
            return Err(ConfigError::invalid("gesture.min_confidence", "must be within 0..=1"));
        }
        if self.gesture.cut_radius <= 0.0 {
            return Err(ConfigError::invalid("gesture.cut_radius", "must be positive"));
        }

        let field = &self.field;
        if field.despawn_x <= 0.0 {
            return Err(ConfigError::invalid("field.despawn_x", "must be positive"));
        }
        // Otherwise every rope is torn down on the tick it spawns
        if field.spawn_x < 0.0 || field.spawn_x >= field.despawn_x {
            return Err(ConfigError::invalid(
                "field.spawn_x",
                "must be non-negative and below despawn_x",
            ));
        }

        let camera = &self.camera;
        if camera.viewport[0] <= 0.0 || camera.viewport[1] <= 0.0 {
            return Err(ConfigError::invalid("camera.viewport", "must be positive"));
        }
        if !(camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0) {
            return Err(ConfigError::invalid("camera.fov_y_degrees", "must be within 0..180 exclusive"));
        }
        let forward = Vec3::from(camera.target) - Vec3::from(camera.eye);
        if forward.length_squared() <= f32::EPSILON {
            return Err(ConfigError::invalid("camera.target", "must differ from eye"));
        }
        if forward.normalize().cross(Vec3::Y).length_squared() <= f32::EPSILON {
            return Err(ConfigError::invalid("camera.target", "must not be straight above or below eye"));
        }
        Ok(())
    }
}
