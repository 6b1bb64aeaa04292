use crate::process::{ProcessId, ProcessState};
use thiserror::Error;

/// Misuse of a process, a process chain or the process manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("process {id} does not exist")]
    Unknown { id: ProcessId },

    #[error("{process} is {state}; it can only be initialized once")]
    AlreadyInitialized {
        process: String,
        state: ProcessState,
    },

    #[error("{process} is {state}; {action} requires a live process")]
    NotAlive {
        process: String,
        state: ProcessState,
        action: &'static str,
    },

    #[error("{process} is {state}; updates require a running process")]
    NotRunning {
        process: String,
        state: ProcessState,
    },

    #[error("{process} is not initialized")]
    NotInitialized { process: String },

    #[error("{child} is {state}; only uninitialized processes can be attached as children")]
    ChildInitialized {
        child: String,
        state: ProcessState,
    },

    #[error("{child} is already the child of {parent}")]
    AlreadyAttached { child: ProcessId, parent: ProcessId },

    #[error("attaching {child} to {parent} would create a cycle")]
    ChainCycle { parent: ProcessId, child: ProcessId },

    #[error("process id {id} is already managed")]
    DuplicateId { id: ProcessId },
}
