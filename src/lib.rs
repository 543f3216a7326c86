//! Rope Cutter - a rope-cutting arcade core
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (rope physics, spawning, cuts, scoring, gestures)
//! - `settings`: Data-driven game balance and validation

pub mod settings;
pub mod sim;

pub use settings::{ConfigError, DifficultyPreset, GameConfig};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the physics step)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Ropes hang and swing in the z = 0 plane
    pub const ROPE_PLANE_Z: f32 = 0.0;

    /// Radius of the sphere tested around a hand when a gesture cut fires
    pub const DEFAULT_CUT_RADIUS: f32 = 0.5;
}
