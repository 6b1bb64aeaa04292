// manager.rs - Drawable tracking and depth-sorted frame drawing
//
// New entities are announced through `EntityAdded`. The manager then watches
// the lifecycle of every drawable component on them: activation starts
// tracking, deactivation or destruction stops it. Lifecycle callbacks only
// record changes; they are applied at the start of the next drawn frame.

use crate::{RenderError, TARGET_FRAME_RATE};
use cinder_core::entity::{
    ComponentKey, DrawableCapability, EntityAdded, EntityId, EntityManager, RenderTarget,
};
use cinder_core::event::{EventQueue, ListenerId};
use cinder_core::glam::Affine2;
use cinder_core::lifecycle::{LifecycleEvent, LifecycleState};
use cinder_core::observer::ObserverId;
use cinder_core::time::FixedStep;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::rc::Rc;
use tracing::{debug, error, trace};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Change {
    Track,
    Untrack,
}

type Shared<T> = Rc<RefCell<Vec<T>>>;

#[derive(Debug, Copy, Clone)]
struct Tracked {
    entity: EntityId,
    component: ComponentKey,
    depth: i32,
}

#[derive(Debug)]
pub struct RenderManager {
    throttle: FixedStep,
    paused: bool,
    listener: Option<ListenerId>,
    added: Shared<EntityId>,
    changes: Shared<(EntityId, ComponentKey, Change)>,
    watched: Vec<(EntityId, ComponentKey, ObserverId)>,
    drawables: Vec<Tracked>,
    frames: u64,
}

impl RenderManager {
    pub fn new(target_frame_rate: u32) -> Self {
        Self {
            throttle: FixedStep::from_rate(target_frame_rate),
            paused: false,
            listener: None,
            added: Rc::new(RefCell::new(Vec::new())),
            changes: Rc::new(RefCell::new(Vec::new())),
            watched: Vec::new(),
            drawables: Vec::new(),
            frames: 0,
        }
    }

    /// Start listening for new entities.
    pub fn post_initialize(&mut self, events: &mut EventQueue) {
        let added = Rc::clone(&self.added);
        let listener = events.add_listener::<EntityAdded, _>(move |event, _| {
            added.borrow_mut().push(event.entity);
        });
        self.listener = Some(listener);
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Frames drawn so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds between drawn frames.
    pub fn frame_interval(&self) -> f32 {
        self.throttle.interval()
    }

    /// Tracked drawables in draw order, deepest first. Changes recorded since
    /// the last drawn frame are not reflected yet.
    pub fn tracked(&self) -> Vec<(EntityId, ComponentKey)> {
        self.drawables
            .iter()
            .map(|tracked| (tracked.entity, tracked.component))
            .collect()
    }

    /// Watch newly added entities and draw a frame if one is due.
    ///
    /// Returns whether a frame was drawn.
    pub fn update(
        &mut self,
        delta: f32,
        entities: &mut EntityManager,
        target: &mut dyn RenderTarget,
    ) -> Result<bool, RenderError> {
        if self.paused {
            return Ok(false);
        }

        self.watch_added(entities)?;

        self.throttle.accumulate(delta);
        if !self.throttle.next_step() {
            return Ok(false);
        }

        self.draw_frame(entities, target)?;
        target.present();
        Ok(true)
    }

    /// Apply pending tracking changes, then clear the target and draw every
    /// enabled drawable with its entity's transform.
    pub fn draw_frame(
        &mut self,
        entities: &EntityManager,
        target: &mut dyn RenderTarget,
    ) -> Result<(), RenderError> {
        self.apply_changes(entities)?;

        target.clear();
        for tracked in &self.drawables {
            let Some(entity) = entities.get_entity(tracked.entity) else {
                continue;
            };
            let Some(drawable) = entity
                .component(tracked.component)
                .and_then(|component| component.as_drawable())
            else {
                continue;
            };
            if !drawable.drawing_enabled() {
                continue;
            }

            let transform = entity
                .transform()
                .map_or(Affine2::IDENTITY, |transform| transform.matrix());
            target.set_transform(transform);
            drawable.draw(target);
        }

        self.frames += 1;
        Ok(())
    }

    /// Stop listening and detach every lifecycle observer.
    pub fn shutdown(&mut self, events: &mut EventQueue, entities: &mut EntityManager) {
        if let Some(listener) = self.listener.take() {
            events.remove_listener::<EntityAdded>(listener);
        }

        for (entity, component, observer) in self.watched.drain(..) {
            if let Some(entity) = entities.get_entity_mut(entity) {
                entity.unsubscribe_component(component, observer);
            }
        }

        self.added.borrow_mut().clear();
        self.changes.borrow_mut().clear();
        self.drawables.clear();
        debug!("Render manager shut down after {} frames", self.frames);
    }

    fn watch_added(&mut self, entities: &mut EntityManager) -> Result<(), RenderError> {
        let added: Vec<EntityId> = self.added.borrow_mut().drain(..).collect();

        for id in added {
            if self.watched.iter().any(|(entity, _, _)| *entity == id) {
                return Err(RenderError::AlreadyWatched { entity: id });
            }
            let Some(entity) = entities.get_entity_mut(id) else {
                error!("Entity {} not found", id);
                continue;
            };

            let keys = entity.component_keys_by_capability::<DrawableCapability>();
            for &key in &keys {
                let changes = Rc::clone(&self.changes);
                let observer = entity.subscribe_component(key, move |event| {
                    let change = match event {
                        LifecycleEvent::Activated => Change::Track,
                        LifecycleEvent::Deactivated | LifecycleEvent::Destroyed => {
                            Change::Untrack
                        }
                        LifecycleEvent::Initialized => return,
                    };
                    changes.borrow_mut().push((id, key, change));
                });
                if let Some(observer) = observer {
                    self.watched.push((id, key, observer));
                }

                if entity.component_state_by_key(key) == Some(LifecycleState::Active) {
                    self.changes.borrow_mut().push((id, key, Change::Track));
                }
            }

            if !keys.is_empty() {
                trace!("Watching {} drawables from {}", keys.len(), entity.name());
            }
        }
        Ok(())
    }

    fn apply_changes(&mut self, entities: &EntityManager) -> Result<(), RenderError> {
        let changes: Vec<_> = self.changes.borrow_mut().drain(..).collect();
        if changes.is_empty() {
            return Ok(());
        }

        let mut duplicate = None;
        for (entity, component, change) in changes {
            let position = self
                .drawables
                .iter()
                .position(|t| t.entity == entity && t.component == component);

            match (change, position) {
                (Change::Track, Some(_)) => {
                    let name = entities
                        .get_entity(entity)
                        .and_then(|e| e.component(component))
                        .map_or("component", |c| c.type_name());
                    error!("{} of entity {} tracked twice", name, entity);
                    duplicate.get_or_insert(RenderError::AlreadyTracked {
                        entity,
                        component: name,
                    });
                }
                (Change::Track, None) => {
                    let depth = entities
                        .get_entity(entity)
                        .and_then(|e| e.component(component))
                        .and_then(|c| c.as_drawable())
                        .map(|d| d.render_depth());
                    if let Some(depth) = depth {
                        self.drawables.push(Tracked {
                            entity,
                            component,
                            depth,
                        });
                    }
                }
                (Change::Untrack, Some(index)) => {
                    self.drawables.remove(index);
                }
                (Change::Untrack, None) => {}
            }

            // Destroyed components never come back, so their observers go too.
            let gone = entities
                .get_entity(entity)
                .and_then(|e| e.component_state_by_key(component))
                .map_or(true, |state| state == LifecycleState::Destroyed);
            if change == Change::Untrack && gone {
                self.watched
                    .retain(|(e, c, _)| !(*e == entity && *c == component));
            }
        }

        self.drawables.sort_by_key(|tracked| Reverse(tracked.depth));
        duplicate.map_or(Ok(()), Err)
    }
}

impl Default for RenderManager {
    fn default() -> Self {
        Self::new(TARGET_FRAME_RATE)
    }
}
