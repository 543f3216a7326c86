//! Rope assemblies: anchor, segment chain, joints and treasure
//!
//! An assembly is the atomic spawn/despawn unit. It is built in one call,
//! mutated only by lateral anchor motion and at most one cut, and released in
//! one call that consumes it, so callers never observe a half-torn-down rope.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::physics::{BodyId, JointId, PhysicsWorld};
use crate::settings::RopeConfig;

/// Stable identity of an assembly (allocated in spawn order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RopeId(pub u32);

/// Side of the field an assembly enters from; it travels toward the other side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sign of the anchor's x velocity
    #[inline]
    pub fn travel_sign(&self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    /// Sign of the x coordinate the assembly enters at
    #[inline]
    pub fn entry_sign(&self) -> f32 {
        -self.travel_sign()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Treasure tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreasureKind {
    Bronze,
    Silver,
    Gold,
}

impl TreasureKind {
    pub const ALL: [TreasureKind; 3] = [TreasureKind::Bronze, TreasureKind::Silver, TreasureKind::Gold];

    /// Points awarded before combo bonus
    pub fn base_score(&self) -> u64 {
        match self {
            TreasureKind::Bronze => 100,
            TreasureKind::Silver => 250,
            TreasureKind::Gold => 500,
        }
    }

    pub fn mass(&self) -> f32 {
        match self {
            TreasureKind::Bronze => 0.5,
            TreasureKind::Silver => 1.0,
            TreasureKind::Gold => 1.5,
        }
    }

    /// Radius of the treasure ball, also its attachment offset
    pub fn radius(&self) -> f32 {
        match self {
            TreasureKind::Bronze => 0.25,
            TreasureKind::Silver => 0.3,
            TreasureKind::Gold => 0.35,
        }
    }
}

/// Treasure hanging from the last segment
#[derive(Debug, Clone, Copy)]
pub struct Treasure {
    pub kind: TreasureKind,
    pub body: BodyId,
}

/// One capsule link in the chain
#[derive(Debug, Clone, Copy)]
pub struct RopeSegment {
    pub body: BodyId,
    pub length: f32,
    pub radius: f32,
}

/// Anchor + segments + treasure + joints, moving laterally as one unit
#[derive(Debug)]
pub struct Rope {
    pub id: RopeId,
    pub side: Side,
    pub speed: f32,
    anchor: BodyId,
    anchor_pos: Vec3,
    segments: Vec<RopeSegment>,
    /// joints[0] anchor-segment0, joints[i] segment(i-1)-segment(i),
    /// joints[n] last segment-treasure
    joints: Vec<JointId>,
    treasure: Treasure,
    /// Index of the removed joint once cut
    cut_joint: Option<usize>,
}

impl Rope {
    /// Build a hanging chain below `anchor_pos`.
    ///
    /// Panics on a zero-segment config: the treasure would have nothing to
    /// hang from.
    pub fn spawn(
        physics: &mut PhysicsWorld,
        id: RopeId,
        side: Side,
        speed: f32,
        anchor_pos: Vec3,
        config: &RopeConfig,
        kind: TreasureKind,
    ) -> Self {
        assert!(config.segment_count > 0, "a rope needs at least one segment");

        let (bodies, anchor) = physics.create_rope(anchor_pos, config);
        let mut joints = physics.connect(anchor, &bodies, config.segment_length);

        let chain_bottom = anchor_pos - Vec3::Y * (config.segment_length * config.segment_count as f32);
        let treasure_center = chain_bottom - Vec3::Y * kind.radius();
        let treasure_body = physics.create_treasure(treasure_center, kind.radius(), kind.mass());
        let last = bodies[bodies.len() - 1];
        joints.push(physics.attach(last, config.segment_length, treasure_body, kind.radius()));

        let segments = bodies
            .into_iter()
            .map(|body| RopeSegment {
                body,
                length: config.segment_length,
                radius: config.segment_radius,
            })
            .collect();

        let rope = Self {
            id,
            side,
            speed,
            anchor,
            anchor_pos,
            segments,
            joints,
            treasure: Treasure {
                kind,
                body: treasure_body,
            },
            cut_joint: None,
        };
        debug_assert_eq!(rope.joints.len(), rope.segments.len() + 1);
        rope
    }

    pub fn is_cut(&self) -> bool {
        self.cut_joint.is_some()
    }

    /// Index of the joint removed by the cut, if any
    pub fn cut_joint(&self) -> Option<usize> {
        self.cut_joint
    }

    pub fn anchor_position(&self) -> Vec3 {
        self.anchor_pos
    }

    pub fn segments(&self) -> &[RopeSegment] {
        &self.segments
    }

    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    pub fn treasure(&self) -> &Treasure {
        &self.treasure
    }

    pub fn treasure_position(&self, physics: &PhysicsWorld) -> Vec3 {
        physics.position(self.treasure.body)
    }

    /// Slide the anchor along its travel direction.
    ///
    /// The anchor keeps moving after a cut so the assembly still leaves the
    /// field; the detached sub-chain is no longer connected to it.
    pub fn advance(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        self.anchor_pos.x += self.side.travel_sign() * self.speed * dt;
        physics.move_kinematic(self.anchor, self.anchor_pos);
    }

    /// True once the anchor has travelled past `limit` on either side
    pub fn is_out_of_bounds(&self, limit: f32) -> bool {
        self.anchor_pos.x.abs() > limit
    }

    /// Segment bodies, top to bottom
    pub fn segment_bodies(&self) -> Vec<BodyId> {
        self.segments.iter().map(|seg| seg.body).collect()
    }

    /// Index of the segment owning `body`, if it is one of ours
    pub fn segment_index(&self, body: BodyId) -> Option<usize> {
        self.segments.iter().position(|seg| seg.body == body)
    }

    /// World-space center of every segment, top to bottom
    pub fn segment_positions(&self, physics: &PhysicsWorld) -> Vec<Vec3> {
        self.segments.iter().map(|seg| physics.position(seg.body)).collect()
    }

    /// Sever the joint above `segment_index`, dropping that segment and
    /// everything below it (as one connected sub-chain) off the anchor.
    ///
    /// Panics if the rope is already cut or the index is out of range.
    pub fn cut_at_segment(&mut self, physics: &mut PhysicsWorld, segment_index: usize) {
        assert!(!self.is_cut(), "rope {:?} is already cut", self.id);
        assert!(
            segment_index < self.segments.len(),
            "segment {segment_index} out of range for rope {:?} with {} segments",
            self.id,
            self.segments.len()
        );
        physics.cut(self.joints[segment_index]);
        self.cut_joint = Some(segment_index);
    }

    /// Release every body (and with them every remaining joint)
    pub fn despawn(self, physics: &mut PhysicsWorld) {
        physics.destroy_body(self.treasure.body);
        for seg in &self.segments {
            physics.destroy_body(seg.body);
        }
        physics.destroy_body(self.anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;

    fn spawn_rope(physics: &mut PhysicsWorld, segment_count: usize) -> Rope {
        let config = RopeConfig {
            segment_count,
            ..RopeConfig::default()
        };
        Rope::spawn(
            physics,
            RopeId(1),
            Side::Left,
            1.0,
            Vec3::new(-8.0, 4.0, 0.0),
            &config,
            TreasureKind::Silver,
        )
    }

    #[test]
    fn test_spawn_joint_count_invariant() {
        for n in 1..=6 {
            let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
            let rope = spawn_rope(&mut physics, n);
            assert_eq!(rope.segments().len(), n);
            assert_eq!(rope.joints().len(), n + 1);
            assert!(!rope.is_cut());
            // anchor + segments + treasure
            assert_eq!(physics.body_count(), n + 2);
            assert_eq!(physics.joint_count(), n + 1);
        }
    }

    #[test]
    #[should_panic(expected = "at least one segment")]
    fn test_spawn_zero_segments_panics() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        spawn_rope(&mut physics, 0);
    }

    #[test]
    fn test_treasure_hangs_below_chain() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let rope = spawn_rope(&mut physics, 5);
        let expected_y = 4.0 - 5.0 * 0.5 - TreasureKind::Silver.radius();
        let p = rope.treasure_position(&physics);
        assert!((p.y - expected_y).abs() < 1e-5, "treasure at {p}");
    }

    #[test]
    fn test_segments_stack_vertically() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let rope = spawn_rope(&mut physics, 3);
        let centers = rope.segment_positions(&physics);
        assert_eq!(centers.len(), 3);
        assert!(centers[0].abs_diff_eq(Vec3::new(-8.0, 3.75, 0.0), 1e-5));
        for pair in centers.windows(2) {
            assert!((pair[0] - pair[1]).abs_diff_eq(Vec3::Y * 0.5, 1e-5));
        }
    }

    #[test]
    fn test_segment_index_maps_bodies_back() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let rope = spawn_rope(&mut physics, 4);
        for (i, body) in rope.segment_bodies().into_iter().enumerate() {
            assert_eq!(rope.segment_index(body), Some(i));
        }
        assert_eq!(rope.segment_index(rope.treasure().body), None);
    }

    #[test]
    fn test_advance_moves_anchor_by_side() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let mut rope = spawn_rope(&mut physics, 2);
        rope.advance(&mut physics, 0.5);
        assert!((rope.anchor_position().x - -7.5).abs() < 1e-6);

        rope.side = Side::Right;
        rope.advance(&mut physics, 1.0);
        assert!((rope.anchor_position().x - -8.5).abs() < 1e-6);
        assert!(!rope.is_out_of_bounds(10.0));
        assert!(rope.is_out_of_bounds(8.0));
    }

    #[test]
    fn test_cut_removes_joint_above_segment() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let mut rope = spawn_rope(&mut physics, 5);
        rope.cut_at_segment(&mut physics, 2);

        assert!(rope.is_cut());
        assert_eq!(rope.cut_joint(), Some(2));
        assert!(!physics.contains_joint(rope.joints()[2]));
        for (i, &j) in rope.joints().iter().enumerate() {
            if i != 2 {
                assert!(physics.contains_joint(j), "joint {i} should survive");
            }
        }
        // Handles stay recorded so the invariant still holds
        assert_eq!(rope.joints().len(), rope.segments().len() + 1);
    }

    #[test]
    fn test_cut_sub_chain_falls_together() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let mut rope = spawn_rope(&mut physics, 4);
        rope.cut_at_segment(&mut physics, 1);

        let treasure_start = rope.treasure_position(&physics);
        let top_start = physics.position(rope.segments()[0].body);
        for _ in 0..60 {
            rope.advance(&mut physics, SIM_DT);
            physics.step();
        }

        let treasure_end = rope.treasure_position(&physics);
        let top_end = physics.position(rope.segments()[0].body);
        assert!(treasure_end.y < treasure_start.y - 2.0, "treasure should fall");
        // Segment 0 is still hinged to the anchor
        assert!((top_end.y - top_start.y).abs() < 0.5, "upper segment should stay up");

        // Detached segments remain linked to each other
        let s1 = physics.position(rope.segments()[1].body);
        let s2 = physics.position(rope.segments()[2].body);
        assert!(s1.distance(s2) < 0.5 + 0.1);
    }

    #[test]
    #[should_panic(expected = "already cut")]
    fn test_double_cut_panics() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let mut rope = spawn_rope(&mut physics, 3);
        rope.cut_at_segment(&mut physics, 0);
        rope.cut_at_segment(&mut physics, 1);
    }

    #[test]
    fn test_despawn_releases_everything() {
        let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
        let mut rope = spawn_rope(&mut physics, 5);
        rope.cut_at_segment(&mut physics, 3);
        rope.despawn(&mut physics);
        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.joint_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_cut_removes_only_the_joint_above(n in 1usize..8, pick in 0usize..8) {
            let segment = pick % n;
            let mut physics = PhysicsWorld::new(-9.81, SIM_DT);
            let mut rope = spawn_rope(&mut physics, n);
            rope.cut_at_segment(&mut physics, segment);

            prop_assert_eq!(rope.cut_joint(), Some(segment));
            prop_assert_eq!(physics.joint_count(), n);
            for (i, &joint) in rope.joints().iter().enumerate() {
                prop_assert_eq!(physics.contains_joint(joint), i != segment);
            }

            rope.despawn(&mut physics);
            prop_assert_eq!(physics.body_count(), 0);
            prop_assert_eq!(physics.joint_count(), 0);
        }
    }
}
