//! Entity: a keyed container of components
//!
//! An entity holds at most one component per concrete type and drives their
//! lifecycle. Components may only be added before initialization.
//! Initialization validates the structure (at least one component, at most one
//! transform), then initializes components in registration order. If any of
//! them fails, the entity destroys itself and every component with it.

use crate::as_any::AsAny;
use crate::entity::{
    Capability, Component, ComponentContext, ComponentKey, ComponentSlot, EntityError, Transform,
};
use crate::lifecycle::{Lifecycle, LifecycleError, LifecycleEvent, LifecycleState};
use crate::observer::ObserverId;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, trace, warn};

/// Entity identifier, unique within its manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct Entity {
    id: EntityId,
    name: String,
    lifecycle: Lifecycle,
    slots: Vec<ComponentSlot>,
    index: HashMap<ComponentKey, usize>,
    transform: Option<usize>,
    update_subscribers: Vec<usize>,
}

impl Entity {
    /// Create an empty, uninitialized entity.
    ///
    /// The display name is `"Entity {id}"`, followed by `name` when it is not
    /// empty.
    pub fn new(id: EntityId, name: &str) -> Self {
        let name = if name.is_empty() {
            format!("Entity {id}")
        } else {
            format!("Entity {id} {name}")
        };

        Self {
            id,
            name,
            lifecycle: Lifecycle::new(),
            slots: Vec::new(),
            index: HashMap::new(),
            transform: None,
            update_subscribers: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    /// True once initialized with at least one component that needs updates.
    #[inline]
    pub fn needs_update(&self) -> bool {
        !self.update_subscribers.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.slots.len()
    }

    /// Register a component. Must happen before initialization.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<(), EntityError> {
        // A component's own lifecycle starts with its slot, so it can never
        // arrive here already initialized.
        if self.state() != LifecycleState::NotInitialized {
            return Err(EntityError::AddAfterInitialize {
                entity: self.name.clone(),
                state: self.state(),
            });
        }

        let type_name = component.type_name();
        if component.owner() != self.id {
            return Err(EntityError::OwnerMismatch {
                entity: self.name.clone(),
                component: type_name,
                owner: component.owner(),
            });
        }

        let key = ComponentKey::of::<T>();
        if self.index.contains_key(&key) {
            return Err(EntityError::DuplicateComponent {
                entity: self.name.clone(),
                component: type_name,
            });
        }

        self.index.insert(key, self.slots.len());
        self.slots.push(ComponentSlot::new(component));
        trace!("{} added {}", self.name, type_name);
        Ok(())
    }

    /// Validate and initialize the entity and all of its components.
    ///
    /// Structural problems are returned as errors and leave the entity
    /// untouched. `Ok(false)` means a component refused to initialize; the
    /// entity has then already destroyed itself.
    pub fn initialize(&mut self) -> Result<bool, EntityError> {
        self.lifecycle
            .check_initialize()
            .map_err(|source| self.lifecycle_error(source))?;

        if self.slots.is_empty() {
            return Err(EntityError::NoComponents {
                entity: self.name.clone(),
            });
        }

        let transforms: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.component().as_transform().is_some())
            .map(|(index, _)| index)
            .collect();

        match transforms.as_slice() {
            [] => warn!("{} initialized with no transform component", self.name),
            [index] => self.transform = Some(*index),
            many => {
                let components: Vec<&'static str> =
                    many.iter().map(|&index| self.slots[index].name()).collect();
                error!(
                    "{} initialized with {} transform components: {:?}",
                    self.name,
                    components.len(),
                    components
                );
                return Err(EntityError::MultipleTransforms {
                    entity: self.name.clone(),
                    components,
                });
            }
        }

        let ctx = ComponentContext {
            entity: self.id,
            entity_name: &self.name,
            has_transform: self.transform.is_some(),
        };
        let slots = &mut self.slots;
        let subscribers = &mut self.update_subscribers;

        let initialized = self
            .lifecycle
            .initialize(|| {
                for (index, slot) in slots.iter_mut().enumerate() {
                    match slot.initialize(&ctx) {
                        Ok(true) => {}
                        Ok(false) => {
                            error!("Failed to initialize {} in {}", slot.name(), ctx.entity_name);
                            return false;
                        }
                        Err(err) => {
                            error!("{} in {}: {}", slot.name(), ctx.entity_name, err);
                            return false;
                        }
                    }

                    if slot.component().needs_update() {
                        subscribers.push(index);
                    }
                }
                true
            })
            .map_err(|source| EntityError::Lifecycle {
                entity: ctx.entity_name.to_string(),
                source,
            })?;

        if !initialized {
            self.update_subscribers.clear();
            self.destroy();
            return Ok(false);
        }

        trace!("{} initialized {} components", self.name, self.slots.len());
        Ok(true)
    }

    /// Activate the entity and then every component, in registration order.
    pub fn activate(&mut self) -> Result<(), EntityError> {
        let name = &self.name;
        let slots = &mut self.slots;
        let changed = self
            .lifecycle
            .activate(|| {
                for slot in slots.iter_mut() {
                    slot.activate(name);
                }
            })
            .map_err(|source| EntityError::Lifecycle {
                entity: name.clone(),
                source,
            })?;

        if changed {
            trace!("{} activated", self.name);
        }
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<(), EntityError> {
        let name = &self.name;
        let slots = &mut self.slots;
        let changed = self
            .lifecycle
            .deactivate(|| {
                for slot in slots.iter_mut() {
                    slot.deactivate(name);
                }
            })
            .map_err(|source| EntityError::Lifecycle {
                entity: name.clone(),
                source,
            })?;

        if changed {
            trace!("{} deactivated", self.name);
        }
        Ok(())
    }

    /// Destroy every component, then the entity. Valid from any state.
    pub fn destroy(&mut self) {
        let name = &self.name;
        let slots = &mut self.slots;
        self.lifecycle.destroy(|| {
            for slot in slots.iter_mut() {
                slot.destroy(name);
            }
        });
        trace!("{} destroyed", self.name);
    }

    /// Release component resources and empty the registry. Does not change
    /// the lifecycle state.
    pub fn dispose(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.dispose();
        }
        self.slots.clear();
        self.index.clear();
        self.update_subscribers.clear();
        self.transform = None;
    }

    /// Forward a frame update to every component that asked for one.
    pub fn update(&mut self, delta: f32) -> Result<(), EntityError> {
        if !self.is_active() {
            return Err(EntityError::NotActive {
                entity: self.name.clone(),
                state: self.state(),
            });
        }
        if !self.needs_update() {
            return Err(EntityError::UpdateNotNeeded {
                entity: self.name.clone(),
            });
        }

        for &index in &self.update_subscribers {
            self.slots[index].component_mut().update(delta);
        }
        Ok(())
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.index.contains_key(&ComponentKey::of::<T>())
    }

    /// Look up a component without logging a miss.
    pub fn try_get_component<T: Component>(&self) -> Option<&T> {
        let index = *self.index.get(&ComponentKey::of::<T>())?;
        self.slots[index].component().as_any().downcast_ref::<T>()
    }

    pub fn try_get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        let index = *self.index.get(&ComponentKey::of::<T>())?;
        self.slots[index]
            .component_mut()
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Look up a component. A miss is a normal outcome and is logged at debug.
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        let component = self.try_get_component::<T>();
        if component.is_none() {
            self.log_missing::<T>();
        }
        component
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        if !self.has_component::<T>() {
            self.log_missing::<T>();
            return None;
        }
        self.try_get_component_mut::<T>()
    }

    /// Look up a component by registry key.
    pub fn component(&self, key: ComponentKey) -> Option<&dyn Component> {
        let index = *self.index.get(&key)?;
        Some(self.slots[index].component())
    }

    /// Every component exposing capability `C`, in registration order.
    pub fn components_by_capability<C: Capability>(&self) -> Vec<&C::Target> {
        self.slots
            .iter()
            .filter_map(|slot| C::query(slot.component()))
            .collect()
    }

    /// Registry keys of the components exposing capability `C`.
    pub fn component_keys_by_capability<C: Capability>(&self) -> Vec<ComponentKey> {
        self.slots
            .iter()
            .filter(|slot| C::query(slot.component()).is_some())
            .map(|slot| slot.key())
            .collect()
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> + '_ {
        self.slots.iter().map(|slot| slot.component())
    }

    /// The cached transform, set during initialization.
    pub fn transform(&self) -> Option<&dyn Transform> {
        let index = self.transform?;
        self.slots[index].component().as_transform()
    }

    pub fn transform_mut(&mut self) -> Option<&mut (dyn Transform + 'static)> {
        let index = self.transform?;
        self.slots[index].component_mut().as_transform_mut()
    }

    pub fn component_state<T: Component>(&self) -> Option<LifecycleState> {
        self.component_state_by_key(ComponentKey::of::<T>())
    }

    pub fn component_state_by_key(&self, key: ComponentKey) -> Option<LifecycleState> {
        let index = *self.index.get(&key)?;
        Some(self.slots[index].state())
    }

    /// Observe the entity's own transitions. Fired after the component
    /// fan-out completes.
    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&LifecycleEvent) + 'static,
    {
        self.lifecycle.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.lifecycle.unsubscribe(id)
    }

    /// Observe the transitions of one component. `None` if it is not present.
    pub fn subscribe_component<F>(&mut self, key: ComponentKey, callback: F) -> Option<ObserverId>
    where
        F: FnMut(&LifecycleEvent) + 'static,
    {
        let index = *self.index.get(&key)?;
        Some(self.slots[index].lifecycle_mut().subscribe(callback))
    }

    pub fn unsubscribe_component(&mut self, key: ComponentKey, id: ObserverId) -> bool {
        match self.index.get(&key) {
            Some(&index) => self.slots[index].lifecycle_mut().unsubscribe(id),
            None => false,
        }
    }

    fn log_missing<T: Component>(&self) {
        debug!(
            "{} does not have requested component {}",
            self.name,
            type_name::<T>()
        );
    }

    fn lifecycle_error(&self, source: LifecycleError) -> EntityError {
        EntityError::Lifecycle {
            entity: self.name.clone(),
            source,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field(
                "components",
                &self.slots.iter().map(|slot| slot.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
