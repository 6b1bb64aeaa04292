//! Engine driver
//!
//! Owns every manager and ticks them in a fixed order: events, physics,
//! processes, entities, rendering. Shutdown runs in reverse.

use crate::stats::{FrameStats, Subsystem};
use cinder_core::entity::{Entity, EntityError, EntityId, EntityManager, RenderTarget};
use cinder_core::event::{EventQueue, ListenerId};
use cinder_core::physics::{PhysicsManager, PhysicsWorld};
use cinder_core::process::ProcessManager;
use cinder_render::{RenderError, RenderManager};
use cinder_services::input::GamePaused;
use cinder_services::settings::{EngineSettings, Settings};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("render update failed")]
    Render(#[from] RenderError),

    #[error("engine was already shut down")]
    ShutDown,
}

pub struct Engine<W, T> {
    settings: EngineSettings,
    events: EventQueue,
    physics: PhysicsManager<W>,
    processes: ProcessManager,
    entities: EntityManager,
    render: RenderManager,
    target: T,
    paused: bool,
    pause_request: Rc<Cell<Option<bool>>>,
    pause_listener: Option<ListenerId>,
    stop: bool,
    shut_down: bool,
    stats: FrameStats,
}

impl<W: PhysicsWorld, T: RenderTarget> Engine<W, T> {
    /// Build and wire every manager. Applies `start_paused` before returning.
    pub fn new(settings: &Settings, world: W, target: T) -> Self {
        let mut events = EventQueue::new();
        let mut render = RenderManager::new(settings.render.target_frame_rate);
        render.post_initialize(&mut events);

        let pause_request = Rc::new(Cell::new(None));
        let request = pause_request.clone();
        let pause_listener = events.add_listener::<GamePaused, _>(move |event, _| {
            request.set(Some(event.paused));
        });

        let mut engine = Self {
            settings: settings.engine.clone(),
            events,
            physics: PhysicsManager::with_rate(world, settings.physics.step_rate_hz),
            processes: ProcessManager::new(),
            entities: EntityManager::new(),
            render,
            target,
            paused: false,
            pause_request,
            pause_listener: Some(pause_listener),
            stop: false,
            shut_down: false,
            stats: FrameStats::default(),
        };

        engine.set_paused(settings.engine.start_paused);
        debug!("Engine initialized");
        engine
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume every pausable subsystem and announce the change with
    /// [`GamePaused`]. The event queue itself never pauses.
    pub fn set_paused(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }

        self.paused = paused;
        self.physics.set_paused(paused);
        self.processes.set_paused(paused);
        self.entities.set_paused(paused);
        self.render.set_paused(paused);
        info!("Engine {}", if paused { "paused" } else { "resumed" });

        self.events.trigger_event(GamePaused { paused });
        // our own announcement is not a request
        self.pause_request.set(None);
    }

    fn apply_pause_request(&mut self) {
        if let Some(paused) = self.pause_request.take() {
            self.set_paused(paused);
        }
    }

    /// Advance every subsystem by `delta` seconds.
    pub fn tick(&mut self, delta: f32) -> Result<(), EngineError> {
        if self.shut_down {
            return Err(EngineError::ShutDown);
        }

        let budget = self.settings.event_budget();
        let report = self
            .stats
            .time(Subsystem::Events, || self.events.process(budget));
        self.stats.record_events(report.dispatched, report.deferred);
        self.apply_pause_request();

        self.stats
            .time(Subsystem::Physics, || self.physics.update(delta));
        self.stats
            .time(Subsystem::Processes, || self.processes.update(delta));
        self.stats
            .time(Subsystem::Entities, || self.entities.update(delta));

        let start = Instant::now();
        let drawn = self
            .render
            .update(delta, &mut self.entities, &mut self.target);
        self.stats.record(Subsystem::Render, start.elapsed());
        drawn?;

        Ok(())
    }

    /// Tick until stopped or `frames` frames have run. Returns the number of
    /// frames run.
    pub fn run(&mut self, frames: Option<u64>) -> Result<u64, EngineError> {
        let frame_time_limit = self.settings.min_frame_time();
        let mut last_frame = Duration::ZERO;
        let mut count = 0;

        while !self.stop && frames.map_or(true, |max| count < max) {
            let delta = if self.settings.use_wall_time {
                last_frame.as_secs_f32()
            } else {
                self.settings.fixed_frame_time
            };
            let frame_timer = Instant::now();

            self.tick(delta)?;
            count += 1;

            if self.settings.limit_cpu_usage && frame_timer.elapsed() < frame_time_limit {
                std::thread::sleep(Duration::from_millis(1));
            }

            last_frame = frame_timer.elapsed();
            self.stats.record_frame(last_frame);
        }

        debug!("Engine ran {} frames", count);
        Ok(count)
    }

    /// Ask [`run`](Self::run) to return after the current frame.
    pub fn stop(&mut self) {
        self.stop = true;
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stop
    }

    /// Register an initialized entity. The render manager picks it up on the
    /// next tick.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId, EntityError> {
        self.entities.add_entity(entity, &mut self.events)
    }

    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        self.entities.destroy_entity(id, &mut self.events)
    }

    /// Shut subsystems down in reverse tick order. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }

        self.render.shutdown(&mut self.events, &mut self.entities);
        self.entities.shutdown();
        self.processes.shutdown();
        self.physics.shutdown();
        if let Some(listener) = self.pause_listener.take() {
            self.events.remove_listener::<GamePaused>(listener);
        }
        self.events.shutdown();

        self.shut_down = true;
        info!("Engine shut down");
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn physics(&self) -> &PhysicsManager<W> {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsManager<W> {
        &mut self.physics
    }

    pub fn processes(&self) -> &ProcessManager {
        &self.processes
    }

    pub fn processes_mut(&mut self) -> &mut ProcessManager {
        &mut self.processes
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn render(&self) -> &RenderManager {
        &self.render
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
