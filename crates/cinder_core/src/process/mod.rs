//! Processes: multi-frame units of work.
//!
//! A [`Process`] wraps a [`ProcessBehavior`] in a small state machine
//! (`NotInitialized -> Running <-> Paused -> Succeeded | Failed | Aborted`).
//! Processes live in a [`ProcessArena`] and can be chained: when a parent
//! terminates, the [`ProcessManager`] activates its child or aborts the rest of
//! the chain, depending on the outcome.

mod arena;
mod error;
mod manager;
#[allow(clippy::module_inception)]
mod process;

pub use arena::ProcessArena;
pub use error::ProcessError;
pub use manager::ProcessManager;
pub use process::{
    Process, ProcessBehavior, ProcessEvent, ProcessId, ProcessSignal, ProcessState,
};
