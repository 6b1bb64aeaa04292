use crate::entity::EntityId;
use crate::lifecycle::{LifecycleError, LifecycleState};
use thiserror::Error;

/// Structural misuse of an entity or the entity manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("{entity} is {state}; components can only be added before initialization")]
    AddAfterInitialize {
        entity: String,
        state: LifecycleState,
    },

    #[error("tried to add {component} to {entity} but it belongs to entity {owner}")]
    OwnerMismatch {
        entity: String,
        component: &'static str,
        owner: EntityId,
    },

    #[error("{entity} already has a {component}")]
    DuplicateComponent {
        entity: String,
        component: &'static str,
    },

    #[error("{entity} has no components")]
    NoComponents { entity: String },

    #[error("{entity} initialized with {} transform components: {components:?}", .components.len())]
    MultipleTransforms {
        entity: String,
        components: Vec<&'static str>,
    },

    #[error("{entity} is {state}; updates require an active entity")]
    NotActive {
        entity: String,
        state: LifecycleState,
    },

    #[error("{entity} has no components that need updates")]
    UpdateNotNeeded { entity: String },

    #[error("{entity} is not initialized")]
    NotInitialized { entity: String },

    #[error("entity id {id} already exists")]
    DuplicateId { id: EntityId },

    #[error("{entity}: {source}")]
    Lifecycle {
        entity: String,
        #[source]
        source: LifecycleError,
    },
}
