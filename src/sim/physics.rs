//! Physical world adapter
//!
//! Sole owner of the rapier world. Everything else creates, moves, cuts and
//! destroys bodies through the opaque handles handed out here, so rope and
//! interaction code never touches solver types.
//!
//! Stale handles are caller bugs (double cut, use after teardown) and panic.
//!
//! Hit tests run through rapier's query pipeline against the live colliders.

use glam::{Quat, Vec3};
use rapier3d::parry::query::{PointQuery, Ray};
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;

use crate::settings::RopeConfig;

/// Rope bodies only hang and swing; they never collide with anything.
fn rope_groups() -> InteractionGroups {
    InteractionGroups::new(Group::GROUP_1, Group::NONE)
}

/// Handle to a rigid body owned by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(RigidBodyHandle);

/// Handle to a joint owned by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointId(ImpulseJointHandle);

/// Clicks further than this from the camera never hit
const MAX_RAY_DISTANCE: Real = 1000.0;

/// A query that landed on one of the candidate bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit {
    pub body: BodyId,
    /// Along the ray for ray casts, center to surface for spheres
    pub distance: f32,
    /// Point on the collider surface
    pub point: Vec3,
}

/// Accept only colliders attached to one of `bodies`
fn attached_to(bodies: &[BodyId]) -> impl Fn(ColliderHandle, &Collider) -> bool + '_ {
    move |_: ColliderHandle, collider: &Collider| {
        collider
            .parent()
            .is_some_and(|parent| bodies.iter().any(|b| b.0 == parent))
    }
}

#[inline]
fn from_point(p: &Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

/// Rapier world plus the stepping machinery
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Initialize a world with vertical gravity `gravity_y` stepping by `dt`
    pub fn new(gravity_y: f32, dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };
        Self {
            gravity: vector![0.0, gravity_y, 0.0],
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Fixed timestep this world advances by
    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Advance the simulation by one fixed timestep
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Lay out a vertical chain of capsule segments below `anchor_position`,
    /// plus the kinematic anchor that will drive it.
    ///
    /// Segments are not yet joined; see [`PhysicsWorld::connect`].
    pub fn create_rope(&mut self, anchor_position: Vec3, config: &RopeConfig) -> (Vec<BodyId>, BodyId) {
        assert!(config.segment_count > 0, "a rope needs at least one segment");
        assert!(
            config.segment_length > 0.0 && config.segment_radius > 0.0 && config.segment_mass > 0.0,
            "rope segments need positive length, radius and mass"
        );

        let anchor = self.create_anchor(anchor_position);
        let half = config.segment_length / 2.0;
        let segments = (0..config.segment_count)
            .map(|i| {
                let center = anchor_position - Vec3::Y * (half + i as f32 * config.segment_length);
                self.create_segment(center, half, config.segment_radius, config.segment_mass)
            })
            .collect();
        (segments, anchor)
    }

    /// Hinge the anchor to the first segment and each segment to the next.
    ///
    /// Returns `segments.len()` joints, top to bottom. The vector has room
    /// for one more so the treasure joint from [`PhysicsWorld::attach`] can
    /// be pushed without reallocating.
    pub fn connect(&mut self, anchor: BodyId, segments: &[BodyId], segment_length: f32) -> Vec<JointId> {
        let half = segment_length / 2.0;
        let mut joints = Vec::with_capacity(segments.len() + 1);
        let mut above = anchor;
        let mut above_offset = Vec3::ZERO;
        for &segment in segments {
            joints.push(self.hinge(above, above_offset, segment, Vec3::Y * half));
            above = segment;
            above_offset = -Vec3::Y * half;
        }
        joints
    }

    /// Hinge the bottom of `last_segment` to the top of the treasure
    pub fn attach(
        &mut self,
        last_segment: BodyId,
        segment_length: f32,
        treasure: BodyId,
        treasure_half_size: f32,
    ) -> JointId {
        self.hinge(
            last_segment,
            -Vec3::Y * (segment_length / 2.0),
            treasure,
            Vec3::Y * treasure_half_size,
        )
    }

    /// Kinematic body with no collider, moved explicitly every frame
    pub fn create_anchor(&mut self, position: Vec3) -> BodyId {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .build();
        BodyId(self.bodies.insert(body))
    }

    /// Dynamic capsule standing along its local Y axis
    pub fn create_segment(&mut self, center: Vec3, half_length: f32, radius: f32, mass: f32) -> BodyId {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(center))
            .linear_damping(0.1)
            .angular_damping(0.5)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::capsule_y(half_length, radius)
            .mass(mass)
            .collision_groups(rope_groups())
            .build();
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        BodyId(handle)
    }

    /// Dynamic ball hanging at the end of a rope
    pub fn create_treasure(&mut self, center: Vec3, radius: f32, mass: f32) -> BodyId {
        assert!(radius > 0.0 && mass > 0.0, "treasure needs positive size and mass");
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(center))
            .linear_damping(0.1)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .mass(mass)
            .collision_groups(rope_groups())
            .build();
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        BodyId(handle)
    }

    /// Single-axis hinge swinging in the XY plane. Offsets are in each
    /// body's local frame.
    pub fn hinge(&mut self, body1: BodyId, offset1: Vec3, body2: BodyId, offset2: Vec3) -> JointId {
        let joint = RevoluteJointBuilder::new(Vector::z_axis())
            .local_anchor1(to_point(offset1))
            .local_anchor2(to_point(offset2))
            .build();
        JointId(self.impulse_joints.insert(body1.0, body2.0, joint, true))
    }

    /// Remove one joint. Irreversible; cutting the same joint twice panics.
    pub fn cut(&mut self, joint: JointId) {
        if self.impulse_joints.remove(joint.0, true).is_none() {
            panic!("cut on a joint that is not in the world: {joint:?}");
        }
    }

    /// Remove a body with its colliders and any joints still attached to it
    pub fn destroy_body(&mut self, body: BodyId) {
        let removed = self.bodies.remove(
            body.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_none() {
            panic!("destroy on a body that is not in the world: {body:?}");
        }
    }

    /// Set where a kinematic body will be after the next step
    pub fn move_kinematic(&mut self, body: BodyId, translation: Vec3) {
        match self.bodies.get_mut(body.0) {
            Some(rb) => rb.set_next_kinematic_translation(to_vector(translation)),
            None => panic!("move on a body that is not in the world: {body:?}"),
        }
    }

    /// World-space position and orientation of a body
    pub fn pose(&self, body: BodyId) -> (Vec3, Quat) {
        let rb = self.body(body);
        let t = rb.translation();
        let q = rb.rotation().coords;
        (Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(q.x, q.y, q.z, q.w))
    }

    /// World-space position of a body
    pub fn position(&self, body: BodyId) -> Vec3 {
        self.pose(body).0
    }

    pub fn contains_joint(&self, joint: JointId) -> bool {
        self.impulse_joints.contains(joint.0)
    }

    /// Bring the query structure in line with bodies spawned, moved or
    /// destroyed since the last step
    fn sync_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    /// Nearest collider of `candidates` along the ray from `origin`
    pub fn cast_ray(&mut self, origin: Vec3, dir: Vec3, candidates: &[BodyId]) -> Option<QueryHit> {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO || candidates.is_empty() {
            return None;
        }
        self.sync_queries();

        let ray = Ray::new(to_point(origin), to_vector(dir));
        let predicate = attached_to(candidates);
        let filter = QueryFilter::default().predicate(&predicate);
        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            MAX_RAY_DISTANCE,
            true,
            filter,
        )?;
        let body = self.colliders.get(handle)?.parent()?;
        Some(QueryHit {
            body: BodyId(body),
            distance: toi,
            point: origin + dir * toi,
        })
    }

    /// Collider of `candidates` overlapping the sphere whose surface is
    /// nearest `center`, i.e. the one it penetrates deepest
    pub fn intersect_sphere(&mut self, center: Vec3, radius: f32, candidates: &[BodyId]) -> Option<QueryHit> {
        if radius <= 0.0 || candidates.is_empty() {
            return None;
        }
        self.sync_queries();

        let ball = Ball::new(radius);
        let ball_pos: Isometry<Real> = Isometry::translation(center.x, center.y, center.z);
        let query_point = to_point(center);
        let predicate = attached_to(candidates);
        let filter = QueryFilter::default().predicate(&predicate);

        let colliders = &self.colliders;
        let mut best: Option<QueryHit> = None;
        self.query_pipeline
            .intersections_with_shape(&self.bodies, colliders, &ball_pos, &ball, filter, |handle| {
                let Some(collider) = colliders.get(handle) else {
                    return true;
                };
                let Some(parent) = collider.parent() else {
                    return true;
                };
                let projection = collider.shape().project_point(collider.position(), &query_point, true);
                let point = from_point(&projection.point);
                let distance = point.distance(center);
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(QueryHit {
                        body: BodyId(parent),
                        distance,
                        point,
                    });
                }
                true
            });
        best
    }

    /// Bodies currently alive (leak checks)
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Joints currently alive (leak checks)
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    fn body(&self, body: BodyId) -> &RigidBody {
        match self.bodies.get(body.0) {
            Some(rb) => rb,
            None => panic!("body is not in the world: {body:?}"),
        }
    }
}
