//! Headless demo scene
//!
//! A few moving and static drawables plus a short process chain, enough to
//! exercise every subsystem without a window.

use crate::engine::Engine;
use cinder_core::as_any::AsAny;
use cinder_core::entity::{
    Component, ComponentContext, Drawable, Entity, EntityError, EntityId, RenderDepth,
    RenderTarget, Transform,
};
use cinder_core::physics::PhysicsWorld;
use cinder_core::process::{ProcessBehavior, ProcessError, ProcessId, ProcessSignal};
use cinder_render::HeadlessTarget;
use glam::Vec2;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("{name} refused to initialize")]
    Refused { name: String },
}

/// Physics world that only tracks simulated time.
#[derive(Debug, Default)]
pub struct DemoWorld {
    steps: u64,
    simulated: f32,
}

impl DemoWorld {
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn simulated_time(&self) -> f32 {
        self.simulated
    }
}

impl PhysicsWorld for DemoWorld {
    fn step(&mut self, dt: f32) {
        self.steps += 1;
        self.simulated += dt;
    }
}

/// Transform that drifts and spins at a constant rate.
pub struct Body {
    owner: EntityId,
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    spin: f32,
}

impl Body {
    pub fn new(owner: EntityId, position: Vec2) -> Self {
        Self {
            owner,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            spin: 0.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Radians per second.
    pub fn with_spin(mut self, spin: f32) -> Self {
        self.spin = spin;
        self
    }
}

impl Transform for Body {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }
}

impl Component for Body {
    fn owner(&self) -> EntityId {
        self.owner
    }

    fn needs_update(&self) -> bool {
        self.velocity != Vec2::ZERO || self.spin != 0.0
    }

    fn update(&mut self, delta: f32) {
        self.translate(self.velocity * delta);
        self.rotate(self.spin * delta);
    }

    fn as_transform(&self) -> Option<&(dyn Transform + 'static)> {
        Some(self)
    }

    fn as_transform_mut(&mut self) -> Option<&mut (dyn Transform + 'static)> {
        Some(self)
    }
}

/// Drawable that reports one draw call to a [`HeadlessTarget`].
pub struct Marker {
    owner: EntityId,
    depth: i32,
}

impl Marker {
    pub fn new(owner: EntityId, depth: i32) -> Self {
        Self { owner, depth }
    }
}

impl Drawable for Marker {
    fn render_depth(&self) -> i32 {
        self.depth
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        if let Some(headless) = target.as_any_mut().downcast_mut::<HeadlessTarget>() {
            headless.record_draw();
        }
    }
}

impl Component for Marker {
    fn owner(&self) -> EntityId {
        self.owner
    }

    fn on_initialize(&mut self, ctx: &ComponentContext<'_>) -> bool {
        if !ctx.has_transform && self.depth != RenderDepth::GUI {
            debug!("{} draws at the origin", ctx.entity_name);
        }
        true
    }

    fn as_drawable(&self) -> Option<&(dyn Drawable + 'static)> {
        Some(self)
    }
}

/// Succeeds once `duration` seconds of running time have passed.
pub struct Delay {
    duration: f32,
    elapsed: f32,
}

impl Delay {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }
}

impl ProcessBehavior for Delay {
    fn on_update(&mut self, delta: f32) -> ProcessSignal {
        self.elapsed += delta;
        if self.elapsed >= self.duration {
            ProcessSignal::Succeed
        } else {
            ProcessSignal::Continue
        }
    }
}

/// Logs a message on its first update and succeeds.
pub struct Announce {
    message: String,
}

impl Announce {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ProcessBehavior for Announce {
    fn on_update(&mut self, _delta: f32) -> ProcessSignal {
        info!("{}", self.message);
        ProcessSignal::Succeed
    }
}

/// Ids of everything the demo created.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub entities: Vec<EntityId>,
    /// First and last process of the chain.
    pub chain: (ProcessId, ProcessId),
}

/// Populate `engine` with the demo entities and process chain.
pub fn build_scene(
    engine: &mut Engine<DemoWorld, HeadlessTarget>,
) -> Result<DemoScene, DemoError> {
    let mut entities = Vec::new();

    let layout = [
        ("Terrain", RenderDepth::TERRAIN, Vec2::ZERO, Vec2::ZERO, 0.0),
        ("Tank", RenderDepth::VEHICLE, Vec2::new(-4.0, 0.0), Vec2::new(1.5, 0.0), 0.0),
        ("Shell", RenderDepth::PROJECTILE, Vec2::new(-3.0, 0.5), Vec2::new(12.0, 0.0), 6.0),
    ];
    for (name, depth, position, velocity, spin) in layout {
        let mut entity = engine.entities_mut().create_entity(name);
        let owner = entity.id();
        entity.add_component(
            Body::new(owner, position)
                .with_velocity(velocity)
                .with_spin(spin),
        )?;
        entity.add_component(Marker::new(owner, depth))?;
        entities.push(add_and_activate(engine, entity)?);
    }

    // no transform: drawn at the origin
    let mut hud = engine.entities_mut().create_entity("Hud");
    let owner = hud.id();
    hud.add_component(Marker::new(owner, RenderDepth::GUI))?;
    entities.push(add_and_activate(engine, hud)?);

    let processes = engine.processes_mut();
    let head = processes.spawn("warm-up", Delay::new(0.5));
    let announce = processes.spawn("announce", Announce::new("Demo warm-up complete"));
    let cool_down = processes.spawn("cool-down", Delay::new(1.0));
    let tail = processes.spawn("finish", Announce::new("Demo process chain finished"));

    let arena = processes.arena_mut();
    for child in [announce, cool_down, tail] {
        arena.attach_child(head, child)?;
    }
    let process = arena
        .get_mut(head)
        .ok_or(ProcessError::Unknown { id: head })?;
    if !process.initialize()? {
        return Err(DemoError::Refused {
            name: process.name().to_string(),
        });
    }
    processes.add_process(head)?;

    info!(
        "Demo scene built with {} entities and a {}-step process chain",
        entities.len(),
        processes.arena().chain(head).len()
    );
    Ok(DemoScene {
        entities,
        chain: (head, tail),
    })
}

fn add_and_activate(
    engine: &mut Engine<DemoWorld, HeadlessTarget>,
    mut entity: Entity,
) -> Result<EntityId, DemoError> {
    if !entity.initialize()? {
        return Err(DemoError::Refused {
            name: entity.name().to_string(),
        });
    }
    let id = engine.add_entity(entity)?;
    engine.entities_mut().activate_entity(id)?;
    Ok(id)
}
