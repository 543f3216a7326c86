//! Orchestrator state
//!
//! `GameState` is the single owner of every live assembly (the rope arena,
//! kept in spawn order) and of the physics world they live in. Other
//! components only ever see borrows or ids.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::gesture::{Gesture, HandTracker, Handedness};
use super::interaction::{self, CutOutcome, CutSource};
use super::physics::PhysicsWorld;
use super::rope::{Rope, RopeId, Side, TreasureKind};
use super::score::{ScoreEvent, ScoreLedger, ScoreState};
use super::spawn::{SpawnController, SpawnRequest};
use super::timer::SessionTimer;
use crate::consts::SIM_DT;
use crate::settings::GameConfig;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Nothing started yet
    Ready,
    /// Timer running, spawning and cutting enabled
    Playing,
    /// Time up or ended explicitly; in-flight ropes still simulate
    Ended,
}

/// End-of-session numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    pub max_combo: u32,
    pub treasures_cut: u32,
    pub ropes_spawned: u32,
    /// Seconds actually played
    pub duration: f32,
}

/// Things that happened during a tick, drained by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RopeSpawned {
        id: RopeId,
        side: Side,
        speed: f32,
        treasure: TreasureKind,
    },
    RopeCut {
        id: RopeId,
        segment: usize,
        point: Vec3,
        score: ScoreEvent,
        source: CutSource,
    },
    RopeDespawned {
        id: RopeId,
        was_cut: bool,
    },
    GestureChanged {
        hand: Handedness,
        from: Gesture,
        to: Gesture,
    },
    SessionEnded(SessionSummary),
}

/// Complete game state
pub struct GameState {
    pub config: GameConfig,
    pub phase: GamePhase,
    pub physics: PhysicsWorld,
    /// Live assemblies, sorted by id (spawn order)
    pub ropes: Vec<Rope>,
    pub spawner: SpawnController,
    pub ledger: ScoreLedger,
    pub timer: SessionTimer,
    pub hands: HandTracker,
    pub camera: Camera,
    /// Simulation tick counter
    pub time_ticks: u64,
    rng: Pcg32,
    events: Vec<GameEvent>,
    ropes_spawned: u32,
    next_id: u32,
}

impl GameState {
    /// Build a game from a config (assumed validated)
    pub fn new(config: GameConfig) -> Self {
        Self {
            phase: GamePhase::Ready,
            physics: PhysicsWorld::new(config.field.gravity, SIM_DT),
            ropes: Vec::new(),
            spawner: SpawnController::new(config.spawn.clone()),
            ledger: ScoreLedger::new(config.score.clone()),
            timer: SessionTimer::new(config.session.duration_secs),
            hands: HandTracker::new(&config.gesture),
            camera: Camera::new(&config.camera),
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(config.seed),
            events: Vec::new(),
            ropes_spawned: 0,
            next_id: 1,
            config,
        }
    }

    /// Allocate a new rope ID
    fn next_rope_id(&mut self) -> RopeId {
        let id = RopeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Session time in seconds, the clock for scoring and difficulty
    pub fn session_time(&self) -> f64 {
        self.timer.elapsed() as f64
    }

    /// Begin a fresh session. Leftovers from a previous session are torn down.
    pub fn start_session(&mut self) {
        self.clear_ropes();
        self.ledger.reset();
        self.hands.reset();
        self.ropes_spawned = 0;
        self.timer.start();
        self.spawner.start();
        self.phase = GamePhase::Playing;
        log::info!("Session started ({}s)", self.timer.duration());
    }

    /// Stop spawning and freeze cuts. Ropes in flight keep simulating until
    /// [`GameState::clear_ropes`].
    pub fn end_session(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.spawner.stop();
        self.timer.stop();
        self.phase = GamePhase::Ended;
        let summary = self.summary();
        log::info!(
            "Session ended: score {} max combo {} treasures {}",
            summary.score,
            summary.max_combo,
            summary.treasures_cut
        );
        self.events.push(GameEvent::SessionEnded(summary));
    }

    pub fn summary(&self) -> SessionSummary {
        let score = self.ledger.state();
        SessionSummary {
            score: score.current,
            max_combo: score.max_combo,
            treasures_cut: score.total_treasures,
            ropes_spawned: self.ropes_spawned,
            duration: self.timer.elapsed(),
        }
    }

    pub fn score(&self) -> ScoreState {
        self.ledger.state()
    }

    /// Build an assembly for a spawn request, entering at the request's side
    pub fn spawn_rope(&mut self, request: SpawnRequest) -> RopeId {
        let field = &self.config.field;
        let anchor = Vec3::new(request.side.entry_sign() * field.spawn_x, field.anchor_height, 0.0);
        self.spawn_rope_at(request, anchor)
    }

    /// Build an assembly with its anchor at an explicit position
    pub fn spawn_rope_at(&mut self, request: SpawnRequest, anchor: Vec3) -> RopeId {
        let id = self.next_rope_id();
        let rope = Rope::spawn(
            &mut self.physics,
            id,
            request.side,
            request.speed,
            anchor,
            &self.config.rope,
            request.treasure,
        );
        self.ropes.push(rope);
        self.ropes_spawned += 1;
        log::info!(
            "Spawned rope {:?} from {} at speed {:.2} ({:?})",
            id,
            request.side.as_str(),
            request.speed,
            request.treasure
        );
        self.events.push(GameEvent::RopeSpawned {
            id,
            side: request.side,
            speed: request.speed,
            treasure: request.treasure,
        });
        id
    }

    pub fn rope(&self, id: RopeId) -> Option<&Rope> {
        self.ropes.iter().find(|r| r.id == id)
    }

    /// Slide every anchor along its track
    pub fn advance_ropes(&mut self, dt: f32) {
        for rope in &mut self.ropes {
            rope.advance(&mut self.physics, dt);
        }
    }

    /// Tear down every assembly whose anchor left the field
    pub fn despawn_out_of_bounds(&mut self) {
        let limit = self.config.field.despawn_x;
        let (gone, kept): (Vec<Rope>, Vec<Rope>) = std::mem::take(&mut self.ropes)
            .into_iter()
            .partition(|r| r.is_out_of_bounds(limit));
        self.ropes = kept;
        for rope in gone {
            self.despawn(rope);
        }
    }

    /// Tear down every assembly
    pub fn clear_ropes(&mut self) {
        for rope in std::mem::take(&mut self.ropes) {
            self.despawn(rope);
        }
    }

    fn despawn(&mut self, rope: Rope) {
        let id = rope.id;
        let was_cut = rope.is_cut();
        rope.despawn(&mut self.physics);
        log::debug!("Despawned rope {:?} (cut: {})", id, was_cut);
        self.events.push(GameEvent::RopeDespawned { id, was_cut });
    }

    fn record_cut(&mut self, outcome: CutOutcome) {
        self.events.push(GameEvent::RopeCut {
            id: outcome.rope,
            segment: outcome.segment,
            point: outcome.point,
            score: outcome.score,
            source: outcome.source,
        });
    }

    /// Resolve a click at pixel `screen`. Only cuts while playing.
    pub fn resolve_pointer(&mut self, screen: Vec2) -> Option<CutOutcome> {
        if self.phase != GamePhase::Playing {
            log::warn!("Ignoring click outside a running session");
            return None;
        }
        let ray = self.camera.screen_ray(screen);
        let now = self.session_time();
        let outcome = interaction::resolve_pointer(&mut self.ropes, &mut self.physics, &mut self.ledger, &ray, now)?;
        self.record_cut(outcome);
        Some(outcome)
    }

    /// Resolve a gesture cut at a hand's last known world position
    pub fn resolve_gesture(&mut self, hand: Handedness, position: Vec3) -> Option<CutOutcome> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let now = self.session_time();
        let radius = self.config.gesture.cut_radius;
        let outcome = interaction::resolve_gesture(
            &mut self.ropes,
            &mut self.physics,
            &mut self.ledger,
            hand,
            position,
            radius,
            now,
        )?;
        self.record_cut(outcome);
        Some(outcome)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Ask the spawner whether an assembly is due and build it if so
    pub fn evaluate_spawn(&mut self, dt: f32) -> Option<RopeId> {
        let elapsed = self.timer.elapsed();
        let request = self.spawner.update(dt, elapsed, &mut self.rng)?;
        Some(self.spawn_rope(request))
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
