use crate::entity::EntityId;
use crate::event::Event;

/// Queued by [`EntityManager::add_entity`](crate::entity::EntityManager::add_entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntityAdded {
    pub entity: EntityId,
}

impl Event for EntityAdded {}

/// Queued by [`EntityManager::destroy_entity`](crate::entity::EntityManager::destroy_entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntityRemoved {
    pub entity: EntityId,
}

impl Event for EntityRemoved {}
