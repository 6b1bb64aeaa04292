// component.rs - Behavior units attached to an entity
//
// Components are keyed by their concrete Rust type. The owning entity keeps a
// lifecycle per component and drives every transition; a component never
// changes state on its own.

use crate::as_any::AsAny;
use crate::entity::{Drawable, EntityId, Transform};
use crate::lifecycle::{Lifecycle, LifecycleError, LifecycleState};
use std::any::{type_name, TypeId};
use tracing::{trace, warn};

/// A unit of entity behavior.
///
/// Implementations record the id of the entity they were built for and return
/// it from [`owner`](Component::owner); an entity rejects components built for
/// another entity.
pub trait Component: AsAny {
    /// The entity this component was constructed for.
    fn owner(&self) -> EntityId;

    /// If true, the entity forwards frame updates while active. Fixed for the
    /// lifetime of the component.
    fn needs_update(&self) -> bool {
        false
    }

    /// Returns false to fail initialization of the whole entity.
    fn on_initialize(&mut self, _ctx: &ComponentContext<'_>) -> bool {
        true
    }

    fn on_activate(&mut self) {}

    fn on_deactivate(&mut self) {}

    fn on_destroy(&mut self) {}

    /// Release owned resources. May be called more than once.
    fn dispose(&mut self) {}

    fn update(&mut self, _delta: f32) {}

    /// Transform capability.
    fn as_transform(&self) -> Option<&(dyn Transform + 'static)> {
        None
    }

    fn as_transform_mut(&mut self) -> Option<&mut (dyn Transform + 'static)> {
        None
    }

    /// Drawable capability.
    fn as_drawable(&self) -> Option<&(dyn Drawable + 'static)> {
        None
    }

    fn type_name(&self) -> &'static str {
        short_type_name(type_name::<Self>())
    }
}

/// What a component can see of its entity while initializing.
#[derive(Debug, Clone, Copy)]
pub struct ComponentContext<'a> {
    pub entity: EntityId,
    pub entity_name: &'a str,
    pub has_transform: bool,
}

/// Registry key of a component: its concrete type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey(TypeId);

impl ComponentKey {
    pub fn of<T: Component>() -> Self {
        Self(TypeId::of::<T>())
    }
}

/// A registered component and the lifecycle the entity drives for it.
pub(crate) struct ComponentSlot {
    key: ComponentKey,
    name: &'static str,
    lifecycle: Lifecycle,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub(crate) fn new<T: Component>(component: T) -> Self {
        let name = component.type_name();
        Self {
            key: ComponentKey::of::<T>(),
            name,
            lifecycle: Lifecycle::new(),
            component: Box::new(component),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> ComponentKey {
        self.key
    }

    #[inline]
    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub(crate) fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[inline]
    pub(crate) fn component(&self) -> &dyn Component {
        &*self.component
    }

    #[inline]
    pub(crate) fn component_mut(&mut self) -> &mut dyn Component {
        &mut *self.component
    }

    pub(crate) fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    pub(crate) fn initialize(&mut self, ctx: &ComponentContext<'_>) -> Result<bool, LifecycleError> {
        let component = &mut self.component;
        let initialized = self.lifecycle.initialize(|| component.on_initialize(ctx))?;
        if initialized {
            trace!("{} {} initialized", ctx.entity_name, self.name);
        }
        Ok(initialized)
    }

    pub(crate) fn activate(&mut self, entity_name: &str) {
        let component = &mut self.component;
        match self.lifecycle.activate(|| component.on_activate()) {
            Ok(true) => trace!("{} {} activated", entity_name, self.name),
            Ok(false) => {}
            Err(err) => warn!("{} {}: {}", entity_name, self.name, err),
        }
    }

    pub(crate) fn deactivate(&mut self, entity_name: &str) {
        let component = &mut self.component;
        match self.lifecycle.deactivate(|| component.on_deactivate()) {
            Ok(true) => trace!("{} {} deactivated", entity_name, self.name),
            Ok(false) => {}
            Err(err) => warn!("{} {}: {}", entity_name, self.name, err),
        }
    }

    pub(crate) fn destroy(&mut self, entity_name: &str) {
        let component = &mut self.component;
        self.lifecycle.destroy(|| component.on_destroy());
        trace!("{} {} destroyed", entity_name, self.name);
    }

    pub(crate) fn dispose(&mut self) {
        self.component.dispose();
    }
}

pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    // Keep generic arguments intact, strip the module path of the outer type.
    let outer = full.split('<').next().unwrap_or(full);
    match outer.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
