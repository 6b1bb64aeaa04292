// arena.rs - Process storage addressed by id, plus chain operations
//
// A chain is a singly linked list through `Process::child`. The arena owns
// every process; chains only hold ids, so a child lives in the arena while it
// waits for its parent to finish.

use crate::process::{Process, ProcessBehavior, ProcessError, ProcessId};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug)]
pub struct ProcessArena {
    next_process_id: u32,
    processes: HashMap<ProcessId, Process>,
}

impl ProcessArena {
    pub fn new() -> Self {
        Self {
            next_process_id: 1,
            processes: HashMap::new(),
        }
    }

    /// Store a new, uninitialized process and return its id.
    pub fn spawn<B: ProcessBehavior>(&mut self, name: &str, behavior: B) -> ProcessId {
        let id = ProcessId::new(self.next_process_id);
        self.next_process_id += 1;

        let process = Process::new(id, name, behavior);
        trace!("Spawned {}", process.name());
        self.processes.insert(id, process);
        id
    }

    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(&id)
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        self.processes.get_mut(&id)
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.processes.contains_key(&id)
    }

    /// Drop a process from the arena. Its child, if any, stays.
    pub fn remove(&mut self, id: ProcessId) -> Option<Process> {
        self.processes.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Append `child` to the end of `parent`'s chain.
    ///
    /// The child must be uninitialized and must not already belong to a chain.
    pub fn attach_child(&mut self, parent: ProcessId, child: ProcessId) -> Result<(), ProcessError> {
        let child_process = self
            .processes
            .get(&child)
            .ok_or(ProcessError::Unknown { id: child })?;
        if child_process.is_initialized() {
            return Err(ProcessError::ChildInitialized {
                child: child_process.name().to_string(),
                state: child_process.state(),
            });
        }
        if !self.processes.contains_key(&parent) {
            return Err(ProcessError::Unknown { id: parent });
        }

        if let Some(owner) = self
            .processes
            .values()
            .find(|process| process.child() == Some(child))
        {
            return Err(ProcessError::AlreadyAttached {
                child,
                parent: owner.id(),
            });
        }

        let tail = self.tail(parent);
        if self.chain(child).contains(&parent) || self.chain(parent).contains(&child) {
            return Err(ProcessError::ChainCycle { parent, child });
        }

        if let Some(process) = self.processes.get_mut(&tail) {
            process.set_child(child);
            trace!("{} attached to {}", child, tail);
        }
        Ok(())
    }

    /// Detach and return the immediate child of `parent`.
    pub fn remove_child(&mut self, parent: ProcessId) -> Option<ProcessId> {
        self.processes.get_mut(&parent)?.take_child()
    }

    /// `id` followed by every process chained after it.
    pub fn chain(&self, id: ProcessId) -> Vec<ProcessId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(next) = current {
            let Some(process) = self.processes.get(&next) else {
                break;
            };
            chain.push(next);
            current = process.child();
        }
        chain
    }

    /// Abort `id` and its whole remaining chain, unlinking each link.
    ///
    /// Returns the ids that were part of the chain, in order.
    pub fn abort_all(&mut self, id: ProcessId) -> Vec<ProcessId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(next) = current {
            let Some(process) = self.processes.get_mut(&next) else {
                break;
            };
            process.abort();
            current = process.take_child();
            chain.push(next);
        }
        chain
    }

    fn tail(&self, id: ProcessId) -> ProcessId {
        self.chain(id).last().copied().unwrap_or(id)
    }
}

impl Default for ProcessArena {
    fn default() -> Self {
        Self::new()
    }
}
