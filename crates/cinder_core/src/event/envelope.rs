// envelope.rs - Type-erased event plus creation timestamp

use crate::as_any::AsAny;
use crate::entity::short_type_name;
use crate::event::Event;
use std::any::{type_name, TypeId};
use std::fmt;
use std::time::{Duration, Instant};

/// Identifies an event type. Listeners are registered per kind.
#[derive(Debug, Copy, Clone)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: short_type_name(type_name::<E>()),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl std::hash::Hash for EventKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An event waiting in, or travelling through, an [`EventQueue`](crate::event::EventQueue).
pub struct EventEnvelope {
    kind: EventKind,
    created_at: Instant,
    payload: Box<dyn Event>,
}

impl EventEnvelope {
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            kind: EventKind::of::<E>(),
            created_at: Instant::now(),
            payload: Box::new(event),
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since the event was constructed.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is<E: Event>(&self) -> bool {
        self.kind == EventKind::of::<E>()
    }

    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        (*self.payload).as_any().downcast_ref::<E>()
    }
}

impl fmt::Debug for EventEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEnvelope")
            .field("kind", &self.kind.name)
            .field("payload", &self.payload)
            .finish()
    }
}
