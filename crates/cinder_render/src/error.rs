use cinder_core::entity::EntityId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("{component} of entity {entity} is already tracked")]
    AlreadyTracked {
        entity: EntityId,
        component: &'static str,
    },

    #[error("drawables of entity {entity} are already watched")]
    AlreadyWatched { entity: EntityId },
}
