mod runtime_loop;

use crate::body::BodyDefinition;
use crate::config::AppConfig;
use crate::events::{DiceEvent, EventBus};
use crate::physics::{face_up, BodyId, CollisionEventKind, PhysicsBridge};
use crate::scene::{SceneComposer, SceneDefinition};
use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use runtime_loop::RuntimeLoop;
use std::collections::HashSet;

/// Headless dice toy: a composed scene spawned into the physics bridge, with clicks routed to
/// each die's roller.
pub struct DiceApp {
    scene: SceneDefinition,
    bridge: PhysicsBridge,
    bodies: Vec<BodyId>,
    rng: StdRng,
    events: EventBus,
    runtime: RuntimeLoop,
    resting: HashSet<BodyId>,
}

impl DiceApp {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let scene = SceneComposer::new(config)?.compose()?;
        Self::from_scene(
            scene,
            StdRng::seed_from_u64(config.run.seed),
            config.physics.fixed_dt,
            config.physics.max_backlog,
        )
    }

    pub fn from_scene(scene: SceneDefinition, rng: StdRng, fixed_dt: f32, max_backlog: f32) -> Result<Self> {
        if !fixed_dt.is_finite() || fixed_dt <= 0.0 {
            return Err(anyhow!("Fixed timestep {fixed_dt} must be positive"));
        }
        let mut bridge = PhysicsBridge::new(scene.gravity);
        let mut events = EventBus::default();
        let mut bodies = Vec::with_capacity(scene.body_count());
        for definition in scene.bodies() {
            let id = bridge.spawn(definition).with_context(|| format!("spawning '{}'", definition.name))?;
            events.push(DiceEvent::BodySpawned { body: id, name: definition.name.clone() });
            bodies.push(id);
        }
        Ok(Self {
            scene,
            bridge,
            bodies,
            rng,
            events,
            runtime: RuntimeLoop::new(fixed_dt, max_backlog),
            resting: HashSet::new(),
        })
    }

    pub fn scene(&self) -> &SceneDefinition {
        &self.scene
    }

    pub fn bridge(&self) -> &PhysicsBridge {
        &self.bridge
    }

    pub fn definition(&self, id: BodyId) -> Option<&BodyDefinition> {
        body_definition(&self.scene, &self.bodies, id)
    }

    /// Ids of every dynamic body, in scene order.
    pub fn dice(&self) -> Vec<BodyId> {
        self.scene.bodies().zip(&self.bodies).filter(|(def, _)| def.is_dynamic()).map(|(_, id)| *id).collect()
    }

    /// Click handler: rolls the body's impulse table and applies one impulse.
    pub fn click(&mut self, id: BodyId) -> Result<u32> {
        let definition = body_definition(&self.scene, &self.bodies, id)
            .ok_or_else(|| anyhow!("Click on unknown body {}", id.index()))?;
        let roller =
            definition.roller.as_ref().ok_or_else(|| anyhow!("Body '{}' does not react to clicks", definition.name))?;
        let outcome = roller.roll_and_apply(&mut self.rng, &mut self.bridge.target(id))?;
        let impulse = roller.impulse_for(outcome).map(|i| i.direction).unwrap_or(Vec3::ZERO);
        tracing::info!(body = %definition.name, outcome, "rolled");
        self.resting.remove(&id);
        self.events.push(DiceEvent::Rolled { body: id, outcome, impulse });
        Ok(outcome)
    }

    /// Feeds a frame delta into the fixed-step loop. Returns how many steps ran.
    pub fn advance(&mut self, dt: f32) -> usize {
        let tick = self.runtime.tick(dt);
        if let Some(dropped) = tick.dropped_backlog {
            tracing::warn!(dropped, frame_dt = tick.dt, "simulation fell behind; dropping backlog");
        }
        let mut steps = 0;
        while let Some(step_dt) = self.runtime.pop_fixed_step() {
            self.step_with(step_dt);
            steps += 1;
        }
        steps
    }

    pub fn step_fixed(&mut self) {
        let dt = self.runtime.fixed_dt();
        self.step_with(dt);
    }

    fn step_with(&mut self, dt: f32) {
        self.bridge.step(dt);
        for (kind, a, b) in self.bridge.drain_collision_events() {
            let event = match kind {
                CollisionEventKind::Started => DiceEvent::collision_started(a, b),
                CollisionEventKind::Stopped => DiceEvent::collision_ended(a, b),
            };
            self.events.push(event);
        }
        for id in self.dice() {
            if self.bridge.is_resting(id) {
                if self.resting.insert(id) {
                    let face = self.face_up(id);
                    self.events.push(DiceEvent::Settled { body: id, face });
                }
            } else {
                self.resting.remove(&id);
            }
        }
    }

    /// Steps until every die is resting or `max_steps` is reached. Returns the steps taken.
    pub fn run_until_rest(&mut self, max_steps: u32) -> u32 {
        for step in 0..max_steps {
            self.step_fixed();
            if self.all_dice_resting() {
                return step + 1;
            }
        }
        max_steps
    }

    pub fn all_dice_resting(&self) -> bool {
        self.dice().iter().all(|id| self.resting.contains(id))
    }

    /// 1-based material slot of the face pointing against gravity.
    pub fn face_up(&self, id: BodyId) -> Option<u32> {
        let definition = self.definition(id)?;
        let (_, rotation) = self.bridge.pose(id)?;
        let up = (-self.bridge.gravity()).try_normalize().unwrap_or(Vec3::Z);
        face_up(rotation, &definition.mesh.face_normals(), up).map(|index| index as u32 + 1)
    }

    pub fn drain_events(&mut self) -> Vec<DiceEvent> {
        self.events.drain()
    }
}

fn body_definition<'a>(scene: &'a SceneDefinition, bodies: &[BodyId], id: BodyId) -> Option<&'a BodyDefinition> {
    let index = bodies.iter().position(|candidate| *candidate == id)?;
    scene.bodies().nth(index)
}
