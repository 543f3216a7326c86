//! Fixed timestep simulation tick
//!
//! One call runs the per-frame pipeline in a fixed order:
//! 1. spawn/difficulty evaluation
//! 2. lateral movement and out-of-bounds teardown
//! 3. interaction resolution (clicks, then the hand frame)
//! 4. physics step
//! 5. combo decay check
//!
//! Cuts only ever touch live bodies: interaction runs after teardown and
//! before the step.

use glam::Vec2;

use super::gesture::HandSample;
use super::state::{GameEvent, GamePhase, GameState};

/// Input gathered since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer clicks in screen pixels, in arrival order
    pub clicks: Vec<Vec2>,
    /// Latest hand tracking frame, if the tracker produced one
    pub hands: Option<Vec<HandSample>>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Time-up stops the spawner before it is evaluated again
    if state.timer.update(dt) {
        log::info!("Time up");
        state.end_session();
    }

    // 1. Spawn
    if state.phase == GamePhase::Playing {
        state.evaluate_spawn(dt);
    }

    // 2. Move anchors, drop whatever left the field
    state.advance_ropes(dt);
    state.despawn_out_of_bounds();

    // 3. Interaction
    for &click in &input.clicks {
        state.resolve_pointer(click);
    }
    if let Some(samples) = &input.hands {
        let updates = state.hands.process_frame(samples, &state.camera);
        for update in updates {
            log::debug!(
                "{:?} hand: {:?} -> {:?}",
                update.hand,
                update.transition.from,
                update.transition.to
            );
            state.push_event(GameEvent::GestureChanged {
                hand: update.hand,
                from: update.transition.from,
                to: update.transition.to,
            });
            if !update.transition.cut {
                continue;
            }
            match update.position {
                Some(position) => {
                    state.resolve_gesture(update.hand, position);
                }
                None => log::debug!("{:?} hand left the ready pose off the rope plane", update.hand),
            }
        }
    }

    // 4. Physics
    state.physics.step();

    // 5. Combo decay
    let now = state.session_time();
    state.ledger.update(now);

    state.time_ticks += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::GameConfig;
    use crate::sim::gesture::{Gesture, Handedness};
    use crate::sim::rope::{Side, TreasureKind};
    use crate::sim::spawn::SpawnRequest;
    use glam::Vec3;

    fn request(side: Side, speed: f32) -> SpawnRequest {
        SpawnRequest {
            side,
            speed,
            treasure: TreasureKind::Silver,
        }
    }

    fn run(state: &mut GameState, ticks: usize) {
        let input = TickInput::default();
        for _ in 0..ticks {
            tick(state, &input, SIM_DT);
        }
    }

    fn click_at(state: &GameState, world: Vec3) -> TickInput {
        TickInput {
            clicks: vec![state.camera.world_to_screen(world)],
            ..Default::default()
        }
    }

    #[test]
    fn test_anchor_travels_at_speed() {
        let mut state = GameState::new(GameConfig::default());
        let id = state.spawn_rope(request(Side::Left, 1.0));
        run(&mut state, 600);
        let x = state.rope(id).expect("still on the field").anchor_position().x;
        assert!((x - 2.0).abs() < 0.05, "anchor at {x}");
        assert_eq!(state.time_ticks, 600);
    }

    #[test]
    fn test_fast_rope_removed_after_leaving_field() {
        let mut state = GameState::new(GameConfig::default());
        let id = state.spawn_rope(request(Side::Left, 2.0));
        run(&mut state, 600);
        assert!(state.rope(id).is_none());
        assert!(state.ropes.is_empty());
        assert_eq!(state.physics.body_count(), 0);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::RopeDespawned { id, was_cut: false })
        );
    }

    #[test]
    fn test_session_spawns_and_times_out() {
        let mut config = GameConfig::default();
        config.session.duration_secs = 5.0;
        let mut state = GameState::new(config);
        state.start_session();
        run(&mut state, 6 * 60);

        assert_eq!(state.phase, GamePhase::Ended);
        assert!(!state.spawner.is_running());
        let events = state.drain_events();
        let spawned = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RopeSpawned { .. }))
            .count();
        assert!(spawned >= 2, "expected spawns within 5s, got {spawned}");
        let ended = events
            .iter()
            .filter(|e| matches!(e, GameEvent::SessionEnded(_)))
            .count();
        assert_eq!(ended, 1);

        // No spawns after the end; ropes in flight keep simulating
        let before = state.summary().ropes_spawned;
        run(&mut state, 120);
        assert_eq!(state.summary().ropes_spawned, before);

        state.clear_ropes();
        assert_eq!(state.physics.body_count(), 0);
        assert_eq!(state.physics.joint_count(), 0);
    }

    #[test]
    fn test_determinism() {
        let spawns = |seed: u64| {
            let mut config = GameConfig::default();
            config.seed = seed;
            let mut state = GameState::new(config);
            state.start_session();
            run(&mut state, 10 * 60);
            state
                .drain_events()
                .into_iter()
                .filter_map(|e| match e {
                    GameEvent::RopeSpawned { side, treasure, .. } => Some((side, treasure)),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };
        let first = spawns(42);
        assert!(!first.is_empty());
        assert_eq!(first, spawns(42));
    }

    #[test]
    fn test_click_cuts_during_session() {
        let mut state = GameState::new(GameConfig::default());
        state.start_session();
        let id = state.spawn_rope_at(request(Side::Left, 0.0), Vec3::new(0.0, 4.0, 0.0));
        let input = click_at(&state, Vec3::new(0.0, 3.2, 0.0));
        tick(&mut state, &input, SIM_DT);

        assert!(state.rope(id).unwrap().is_cut());
        assert_eq!(state.score().current, 250);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::RopeCut { id: cut, .. } if *cut == id))
        );
    }

    #[test]
    fn test_cut_rope_torn_down_at_bound() {
        let mut state = GameState::new(GameConfig::default());
        state.start_session();
        let id = state.spawn_rope_at(request(Side::Left, 5.0), Vec3::new(0.0, 4.0, 0.0));
        let input = click_at(&state, Vec3::new(0.0, 3.2, 0.0));
        tick(&mut state, &input, SIM_DT);
        assert!(state.rope(id).unwrap().is_cut());

        // No new spawns; the cut rope keeps travelling until it leaves
        state.end_session();
        run(&mut state, 3 * 60);

        assert!(state.rope(id).is_none());
        assert_eq!(state.physics.body_count(), 0);
        assert_eq!(state.physics.joint_count(), 0);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::RopeDespawned { id, was_cut: true }));
        assert_eq!(state.summary().treasures_cut, 1);
    }

    #[test]
    fn test_clicks_after_session_do_not_cut() {
        let mut state = GameState::new(GameConfig::default());
        state.start_session();
        state.end_session();
        let id = state.spawn_rope_at(request(Side::Left, 0.0), Vec3::new(0.0, 4.0, 0.0));
        let input = click_at(&state, Vec3::new(0.0, 3.2, 0.0));
        tick(&mut state, &input, SIM_DT);

        assert!(!state.rope(id).unwrap().is_cut());
        assert_eq!(state.score().current, 0);
    }

    #[test]
    fn test_hand_leaving_ready_pose_cuts_rope_under_it() {
        let mut state = GameState::new(GameConfig::default());
        state.start_session();
        let id = state.spawn_rope_at(request(Side::Left, 0.0), Vec3::new(0.0, 4.0, 0.0));

        // Normalized video coords of a point on the rope
        let screen = state.camera.world_to_screen(Vec3::new(0.0, 3.0, 0.0));
        let mut normalized = screen / state.camera.viewport();
        if state.config.camera.mirror_tracking {
            normalized.x = 1.0 - normalized.x;
        }
        let frame = |gesture: Gesture| TickInput {
            hands: Some(vec![HandSample {
                handedness: Handedness::Right,
                position: normalized,
                gesture,
                confidence: 0.9,
            }]),
            ..Default::default()
        };

        tick(&mut state, &frame(Gesture::Victory), SIM_DT);
        assert!(!state.rope(id).unwrap().is_cut());
        tick(&mut state, &frame(Gesture::ClosedFist), SIM_DT);
        assert!(state.rope(id).unwrap().is_cut());

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GestureChanged {
            hand: Handedness::Right,
            from: Gesture::Victory,
            to: Gesture::ClosedFist,
        }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::RopeCut { .. })));
    }

    #[test]
    fn test_combo_decays_in_pipeline() {
        let mut state = GameState::new(GameConfig::default());
        state.start_session();
        state.spawn_rope_at(request(Side::Left, 0.0), Vec3::new(0.0, 4.0, 0.0));
        let input = click_at(&state, Vec3::new(0.0, 3.2, 0.0));
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.score().combo, 1);

        run(&mut state, 4 * 60);
        assert_eq!(state.score().combo, 0);
        assert_eq!(state.score().max_combo, 1);
        assert_eq!(state.score().current, 250);
    }
}
