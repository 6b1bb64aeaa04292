// manager.rs - Owns the live entities and forwards frame updates

use crate::entity::{Entity, EntityAdded, EntityError, EntityId, EntityRemoved};
use crate::event::EventQueue;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Registry of initialized entities, keyed by id.
///
/// Iteration and updates run in id order.
#[derive(Debug)]
pub struct EntityManager {
    next_entity_id: u32,
    entities: BTreeMap<EntityId, Entity>,
    paused: bool,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            next_entity_id: 1,
            entities: BTreeMap::new(),
            paused: false,
        }
    }

    /// Build an empty entity with the next free id. The entity is not
    /// registered until [`add_entity`](Self::add_entity).
    pub fn create_entity(&mut self, name: &str) -> Entity {
        let mut id = EntityId::new(self.next_entity_id);
        while self.entities.contains_key(&id) {
            self.next_entity_id += 1;
            id = EntityId::new(self.next_entity_id);
        }
        self.next_entity_id += 1;
        Entity::new(id, name)
    }

    /// Register an initialized entity and queue [`EntityAdded`].
    pub fn add_entity(
        &mut self,
        entity: Entity,
        events: &mut EventQueue,
    ) -> Result<EntityId, EntityError> {
        if !entity.is_initialized() {
            return Err(EntityError::NotInitialized {
                entity: entity.name().to_string(),
            });
        }

        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(EntityError::DuplicateId { id });
        }

        debug!("Added {}", entity.name());
        self.entities.insert(id, entity);
        events.queue_event(EntityAdded { entity: id });
        Ok(id)
    }

    /// Returns `Ok(false)` for an unknown id.
    pub fn activate_entity(&mut self, id: EntityId) -> Result<bool, EntityError> {
        match self.entities.get_mut(&id) {
            Some(entity) => entity.activate().map(|()| true),
            None => Ok(false),
        }
    }

    /// Returns `Ok(false)` for an unknown id.
    pub fn deactivate_entity(&mut self, id: EntityId) -> Result<bool, EntityError> {
        match self.entities.get_mut(&id) {
            Some(entity) => entity.deactivate().map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove, destroy and dispose an entity, then queue [`EntityRemoved`].
    pub fn destroy_entity(&mut self, id: EntityId, events: &mut EventQueue) -> bool {
        let Some(mut entity) = self.entities.remove(&id) else {
            return false;
        };

        entity.destroy();
        entity.dispose();
        debug!("Removed {}", entity.name());
        events.queue_event(EntityRemoved { entity: id });
        true
    }

    /// Update every active entity that has updatable components.
    pub fn update(&mut self, delta: f32) {
        if self.paused {
            return;
        }

        for entity in self.entities.values_mut() {
            if !entity.is_active() || !entity.needs_update() {
                continue;
            }
            if let Err(err) = entity.update(delta) {
                warn!("{}", err);
            }
        }
    }

    /// Destroy and dispose every entity.
    pub fn shutdown(&mut self) {
        let count = self.entities.len();
        for entity in self.entities.values_mut() {
            entity.destroy();
            entity.dispose();
        }
        self.entities.clear();
        debug!("Entity manager shut down, destroyed {} entities", count);
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Component, ComponentContext};
    use crate::lifecycle::LifecycleState;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Ticker {
        owner: EntityId,
        ticks: Rc<Cell<u32>>,
    }

    impl Component for Ticker {
        fn owner(&self) -> EntityId {
            self.owner
        }
        fn needs_update(&self) -> bool {
            true
        }
        fn on_initialize(&mut self, _ctx: &ComponentContext<'_>) -> bool {
            true
        }
        fn update(&mut self, _delta: f32) {
            self.ticks.set(self.ticks.get() + 1);
        }
    }

    fn ticking_entity(manager: &mut EntityManager) -> (Entity, Rc<Cell<u32>>) {
        let mut entity = manager.create_entity("ticker");
        let ticks = Rc::new(Cell::new(0));
        entity
            .add_component(Ticker {
                owner: entity.id(),
                ticks: Rc::clone(&ticks),
            })
            .unwrap();
        entity.initialize().unwrap();
        (entity, ticks)
    }

    #[test]
    fn create_entity_allocates_sequential_ids() {
        let mut manager = EntityManager::new();

        assert_eq!(manager.create_entity("").id(), EntityId::new(1));
        assert_eq!(manager.create_entity("").id(), EntityId::new(2));
    }

    #[test]
    fn add_entity_queues_added_event() {
        let mut manager = EntityManager::new();
        let mut events = EventQueue::new();
        let (entity, _) = ticking_entity(&mut manager);

        let id = manager.add_entity(entity, &mut events).unwrap();

        assert_eq!(manager.len(), 1);
        let pending: Vec<EntityAdded> = events
            .pending_events()
            .filter_map(|e| e.downcast_ref::<EntityAdded>().copied())
            .collect();
        assert_eq!(pending, vec![EntityAdded { entity: id }]);
    }

    #[test]
    fn add_entity_rejects_uninitialized_and_duplicates() {
        let mut manager = EntityManager::new();
        let mut events = EventQueue::new();
        let raw = manager.create_entity("raw");

        assert!(matches!(
            manager.add_entity(raw, &mut events),
            Err(EntityError::NotInitialized { .. })
        ));

        let (entity, _) = ticking_entity(&mut manager);
        let id = manager.add_entity(entity, &mut events).unwrap();

        let mut twin = Entity::new(id, "twin");
        twin.add_component(Ticker {
            owner: id,
            ticks: Rc::new(Cell::new(0)),
        })
        .unwrap();
        twin.initialize().unwrap();

        assert_eq!(
            manager.add_entity(twin, &mut events),
            Err(EntityError::DuplicateId { id })
        );
        assert_eq!(events.pending_count(), 1);
    }

    #[test]
    fn update_only_reaches_active_entities() {
        let mut manager = EntityManager::new();
        let mut events = EventQueue::new();
        let (entity, ticks) = ticking_entity(&mut manager);
        let id = manager.add_entity(entity, &mut events).unwrap();

        manager.update(0.1);
        assert_eq!(ticks.get(), 0);

        assert_eq!(manager.activate_entity(id), Ok(true));
        manager.update(0.1);
        assert_eq!(ticks.get(), 1);

        manager.set_paused(true);
        manager.update(0.1);
        assert_eq!(ticks.get(), 1);

        manager.set_paused(false);
        assert_eq!(manager.deactivate_entity(id), Ok(true));
        manager.update(0.1);
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn unknown_ids_are_noops() {
        let mut manager = EntityManager::new();
        let mut events = EventQueue::new();
        let missing = EntityId::new(42);

        assert_eq!(manager.activate_entity(missing), Ok(false));
        assert_eq!(manager.deactivate_entity(missing), Ok(false));
        assert!(!manager.destroy_entity(missing, &mut events));
        assert_eq!(events.pending_count(), 0);
    }

    #[test]
    fn destroy_entity_removes_and_queues_removed() {
        let mut manager = EntityManager::new();
        let mut events = EventQueue::new();
        let (entity, _) = ticking_entity(&mut manager);
        let id = manager.add_entity(entity, &mut events).unwrap();
        events.abort_all_events();

        assert!(manager.destroy_entity(id, &mut events));

        assert!(manager.get_entity(id).is_none());
        assert!(events
            .pending_events()
            .any(|e| e.downcast_ref::<EntityRemoved>() == Some(&EntityRemoved { entity: id })));
    }

    #[test]
    fn shutdown_destroys_everything() {
        let mut manager = EntityManager::new();
        let mut events = EventQueue::new();
        let (entity, _) = ticking_entity(&mut manager);
        let id = manager.add_entity(entity, &mut events).unwrap();
        manager.activate_entity(id).unwrap();
        assert_eq!(
            manager.get_entity(id).map(Entity::state),
            Some(LifecycleState::Active)
        );

        manager.shutdown();

        assert!(manager.is_empty());
    }
}
