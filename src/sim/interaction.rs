//! Turning pointer clicks and hand gestures into cuts
//!
//! Both entry points share one routine: find the first uncut rope (spawn
//! order) with a segment under the click or hand, sever the joint above that
//! segment and score the treasure. First match wins, not closest.
//!
//! Each rope is queried on its own through the physics world, so a later
//! rope never shadows an earlier one that is also under the cursor.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::camera::Ray;
use super::gesture::Handedness;
use super::physics::PhysicsWorld;
use super::rope::{Rope, RopeId};
use super::score::{ScoreEvent, ScoreLedger};

/// What triggered a cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutSource {
    Pointer,
    Gesture(Handedness),
}

/// A query that found a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index into the rope slice
    pub rope_index: usize,
    pub segment: usize,
    pub point: Vec3,
}

/// A completed cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutOutcome {
    pub rope: RopeId,
    pub segment: usize,
    pub point: Vec3,
    pub score: ScoreEvent,
    pub source: CutSource,
}

/// First uncut rope hit by `ray`; within that rope the segment nearest the
/// ray origin
pub fn pick_with_ray(ropes: &[Rope], physics: &mut PhysicsWorld, ray: &Ray) -> Option<Hit> {
    ropes.iter().enumerate().filter(|(_, r)| !r.is_cut()).find_map(|(rope_index, rope)| {
        let hit = physics.cast_ray(ray.origin, ray.dir, &rope.segment_bodies())?;
        Some(Hit {
            rope_index,
            segment: rope.segment_index(hit.body)?,
            point: hit.point,
        })
    })
}

/// First uncut rope overlapping the sphere; within that rope the segment
/// penetrated deepest
pub fn pick_with_sphere(ropes: &[Rope], physics: &mut PhysicsWorld, center: Vec3, radius: f32) -> Option<Hit> {
    ropes.iter().enumerate().filter(|(_, r)| !r.is_cut()).find_map(|(rope_index, rope)| {
        let hit = physics.intersect_sphere(center, radius, &rope.segment_bodies())?;
        Some(Hit {
            rope_index,
            segment: rope.segment_index(hit.body)?,
            point: hit.point,
        })
    })
}

/// Cut the hit rope and score its treasure
pub fn apply_cut(
    ropes: &mut [Rope],
    physics: &mut PhysicsWorld,
    ledger: &mut ScoreLedger,
    hit: Hit,
    source: CutSource,
    now: f64,
) -> CutOutcome {
    let rope = &mut ropes[hit.rope_index];
    rope.cut_at_segment(physics, hit.segment);
    let score = ledger.add_score(rope.treasure().kind, now);
    log::info!(
        "Cut rope {:?} at segment {} ({:?}): +{} x{}",
        rope.id,
        hit.segment,
        source,
        score.points,
        score.combo
    );
    CutOutcome {
        rope: rope.id,
        segment: hit.segment,
        point: hit.point,
        score,
        source,
    }
}

/// Resolve a pointer click given the camera ray through it
pub fn resolve_pointer(
    ropes: &mut [Rope],
    physics: &mut PhysicsWorld,
    ledger: &mut ScoreLedger,
    ray: &Ray,
    now: f64,
) -> Option<CutOutcome> {
    let hit = pick_with_ray(ropes, physics, ray)?;
    Some(apply_cut(ropes, physics, ledger, hit, CutSource::Pointer, now))
}

/// Resolve a gesture cut around the hand's last known world position
pub fn resolve_gesture(
    ropes: &mut [Rope],
    physics: &mut PhysicsWorld,
    ledger: &mut ScoreLedger,
    hand: Handedness,
    position: Vec3,
    radius: f32,
    now: f64,
) -> Option<CutOutcome> {
    let hit = pick_with_sphere(ropes, physics, position, radius)?;
    Some(apply_cut(ropes, physics, ledger, hit, CutSource::Gesture(hand), now))
}
