//! Double-buffered event queue
//!
//! Events are plain `'static` values tagged with the [`Event`] marker. They
//! can be dispatched immediately with [`EventQueue::trigger_event`] or queued
//! for the next [`EventQueue::process`] pass. Queues alternate between a read
//! and a write buffer, so events raised while a pass is dispatching are always
//! delivered on the following pass.

mod envelope;
mod queue;

pub use envelope::{EventEnvelope, EventKind};
pub use queue::{DispatchReport, EventContext, EventQueue, ListenerId};

use crate::as_any::AsAny;
use std::fmt::Debug;

/// Marker for values that can travel through an [`EventQueue`].
pub trait Event: AsAny + Debug {}
