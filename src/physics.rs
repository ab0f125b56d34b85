use crate::body::{BodyDefinition, ShapeKind};
use crate::roller::{ImpulseTarget, ImpulseVector};
use anyhow::{anyhow, bail, Result};
use glam::{Quat, Vec3};
use rapier3d::geometry::{CollisionEvent, CollisionEventFlags};
use rapier3d::pipeline::{ActiveEvents, EventHandler};
use rapier3d::prelude::{
    AngVector, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, ContactPair, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    Point, QueryPipeline, Real, RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};
use std::collections::HashMap;
use std::sync::Mutex;

const REST_LINEAR_SPEED: f32 = 0.05;
const REST_ANGULAR_SPEED: f32 = 0.05;

/// Index of a body in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(u32);

impl BodyId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

pub enum CollisionEventKind {
    Started,
    Stopped,
}

struct CollisionEventCollector {
    collision_events: Mutex<Vec<CollisionEvent>>,
}

impl CollisionEventCollector {
    fn new() -> Self {
        Self { collision_events: Mutex::new(Vec::new()) }
    }

    fn drain(&self) -> Vec<CollisionEvent> {
        if let Ok(mut events) = self.collision_events.lock() {
            std::mem::take(&mut *events)
        } else {
            Vec::new()
        }
    }
}

impl EventHandler for CollisionEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.collision_events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// rapier3d stand-in for the external physics engine: owns the simulation and hands out
/// impulse targets for spawned bodies.
pub struct PhysicsBridge {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    handles: Vec<RigidBodyHandle>,
    collider_bodies: HashMap<ColliderHandle, BodyId>,
    event_collector: CollisionEventCollector,
}

impl PhysicsBridge {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vec_to_rapier(gravity),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            handles: Vec::new(),
            collider_bodies: HashMap::new(),
            event_collector: CollisionEventCollector::new(),
        }
    }

    pub fn spawn(&mut self, definition: &BodyDefinition) -> Result<BodyId> {
        let collider = match &definition.shape {
            ShapeKind::Plane => ColliderBuilder::halfspace(Vector::z_axis()).restitution(0.4).friction(0.8),
            ShapeKind::Box { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).restitution(0.3).friction(0.6)
            }
            ShapeKind::ConvexPolyhedron { points } => {
                let points: Vec<Point<Real>> = points.iter().map(|p| Point::new(p.x, p.y, p.z)).collect();
                ColliderBuilder::convex_hull(&points)
                    .ok_or_else(|| anyhow!("Convex hull for '{}' could not be built", definition.name))?
                    .restitution(0.3)
                    .friction(0.6)
            }
        };

        let builder =
            if definition.is_dynamic() { RigidBodyBuilder::dynamic() } else { RigidBodyBuilder::fixed() };
        let body = builder
            .translation(vec_to_rapier(definition.pose.position))
            .rotation(quat_to_scaled_axis(definition.pose.quat()))
            .build();
        let body_handle = self.bodies.insert(body);

        let mut collider = collider.active_events(ActiveEvents::COLLISION_EVENTS);
        if definition.is_dynamic() {
            collider = collider.mass(definition.mass);
        }
        let collider_handle = self.colliders.insert_with_parent(collider.build(), body_handle, &mut self.bodies);

        let id = BodyId(self.handles.len() as u32);
        self.handles.push(body_handle);
        self.collider_bodies.insert(collider_handle, id);
        tracing::debug!(body = %definition.name, id = id.index(), shape = definition.shape.label(), "spawned body");
        Ok(id)
    }

    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    fn rigid_body(&self, id: BodyId) -> Option<&RigidBody> {
        self.handles.get(id.0 as usize).and_then(|handle| self.bodies.get(*handle))
    }

    /// Applies `impulse` at its body-local application point.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: ImpulseVector) -> Result<()> {
        let handle = *self.handles.get(id.0 as usize).ok_or_else(|| anyhow!("Unknown body {}", id.0))?;
        let body = self.bodies.get_mut(handle).ok_or_else(|| anyhow!("Body {} was removed", id.0))?;
        if !body.is_dynamic() {
            bail!("Body {} is not dynamic and cannot take impulses", id.0);
        }
        let local = impulse.application_point;
        let world_point = body.position().transform_point(&Point::new(local.x, local.y, local.z));
        body.apply_impulse_at_point(vec_to_rapier(impulse.direction), world_point, true);
        Ok(())
    }

    /// Impulse target bound to one body.
    pub fn target(&mut self, id: BodyId) -> BodyTarget<'_> {
        BodyTarget { bridge: self, id }
    }

    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        let hooks = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &self.event_collector,
        );
    }

    pub fn drain_collision_events(&mut self) -> Vec<(CollisionEventKind, BodyId, BodyId)> {
        let mut out = Vec::new();
        for event in self.event_collector.drain() {
            let (kind, a, b, flags) = match event {
                CollisionEvent::Started(a, b, flags) => (CollisionEventKind::Started, a, b, flags),
                CollisionEvent::Stopped(a, b, flags) => (CollisionEventKind::Stopped, a, b, flags),
            };
            if flags.contains(CollisionEventFlags::SENSOR) {
                continue;
            }
            if let (Some(body_a), Some(body_b)) = (self.collider_bodies.get(&a), self.collider_bodies.get(&b)) {
                out.push((kind, *body_a, *body_b));
            }
        }
        out
    }

    pub fn pose(&self, id: BodyId) -> Option<(Vec3, Quat)> {
        let body = self.rigid_body(id)?;
        let t = body.translation();
        let q = body.rotation().coords;
        Some((Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(q.x, q.y, q.z, q.w)))
    }

    pub fn linear_velocity(&self, id: BodyId) -> Option<Vec3> {
        let v = self.rigid_body(id)?.linvel();
        Some(Vec3::new(v.x, v.y, v.z))
    }

    /// Sleeping, or slow enough in both linear and angular terms to count as resting.
    pub fn is_resting(&self, id: BodyId) -> bool {
        match self.rigid_body(id) {
            Some(body) => {
                body.is_sleeping()
                    || (body.linvel().norm() < REST_LINEAR_SPEED && body.angvel().norm() < REST_ANGULAR_SPEED)
            }
            None => false,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }
}

pub struct BodyTarget<'a> {
    bridge: &'a mut PhysicsBridge,
    id: BodyId,
}

impl ImpulseTarget for BodyTarget<'_> {
    fn apply_impulse(&mut self, impulse: ImpulseVector) -> Result<()> {
        self.bridge.apply_impulse(self.id, impulse)
    }
}

/// Index of the face whose rotated normal points most along `up`.
pub fn face_up(rotation: Quat, face_normals: &[Vec3], up: Vec3) -> Option<usize> {
    face_normals
        .iter()
        .enumerate()
        .map(|(i, normal)| (i, (rotation * *normal).dot(up)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn vec_to_rapier(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn quat_to_scaled_axis(q: Quat) -> AngVector<Real> {
    let (axis, angle) = q.to_axis_angle();
    vec_to_rapier(axis * angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_up_picks_most_aligned_normal() {
        let normals = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        assert_eq!(face_up(Quat::IDENTITY, &normals, Vec3::Z), Some(4));
        let tipped = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        // +X rotated a quarter turn about Y points down; -X points up.
        assert_eq!(face_up(tipped, &normals, Vec3::Z), Some(1));
        assert_eq!(face_up(Quat::IDENTITY, &[], Vec3::Z), None);
    }

    #[test]
    fn scaled_axis_roundtrip() {
        let q = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.2, 1.1);
        let axis = quat_to_scaled_axis(q);
        let v = Vec3::new(axis.x, axis.y, axis.z);
        let back = Quat::from_scaled_axis(v);
        assert!(back.dot(q).abs() > 1.0 - 1e-5);
    }
}
