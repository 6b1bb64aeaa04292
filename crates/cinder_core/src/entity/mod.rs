//! Entities and their components.
//!
//! An [`Entity`] is a container of [`Component`]s keyed by concrete type. The
//! [`EntityManager`] owns initialized entities, forwards frame updates to the
//! active ones and announces additions and removals on the event queue.

mod capability;
mod component;
#[allow(clippy::module_inception)]
mod entity;
mod error;
mod events;
mod manager;

pub use capability::{
    Capability, Drawable, DrawableCapability, RenderDepth, RenderTarget, Transform,
    TransformCapability,
};
pub use component::{Component, ComponentContext, ComponentKey};
pub(crate) use component::{short_type_name, ComponentSlot};
pub use entity::{Entity, EntityId};
pub use error::EntityError;
pub use events::{EntityAdded, EntityRemoved};
pub use manager::EntityManager;
