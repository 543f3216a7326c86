//! Frame-driven simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only, time injected by the caller
//! - Seeded RNG only
//! - Stable iteration order (ropes by spawn order)
//! - The physics world is only touched through [`physics::PhysicsWorld`],
//!   hit tests included

pub mod camera;
pub mod gesture;
pub mod interaction;
pub mod physics;
pub mod rope;
pub mod score;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timer;

pub use camera::{Camera, Ray};
pub use gesture::{Gesture, GestureStateMachine, GestureTransition, HandSample, HandTracker, Handedness};
pub use interaction::{CutOutcome, CutSource};
pub use physics::{BodyId, JointId, PhysicsWorld, QueryHit};
pub use rope::{Rope, RopeId, Side, TreasureKind};
pub use score::{ScoreEvent, ScoreLedger, ScoreState};
pub use spawn::{SpawnController, SpawnRequest, SpawnerState};
pub use state::{GameEvent, GamePhase, GameState, SessionSummary};
pub use tick::{TickInput, tick};
pub use timer::SessionTimer;
