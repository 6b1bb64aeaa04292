// manager.rs - Advances top-level processes and hands over to their children

use crate::process::{Process, ProcessArena, ProcessBehavior, ProcessError, ProcessId};
use tracing::{debug, error, trace, warn};

/// Owns the process arena and the ordered set of top-level processes.
///
/// A chained child is represented only by its parent until the parent
/// terminates. Terminated processes leave the top-level set at the end of the
/// update that observed them and are dropped from the arena at the start of
/// the next one.
#[derive(Debug, Default)]
pub struct ProcessManager {
    arena: ProcessArena,
    processes: Vec<ProcessId>,
    to_add: Vec<ProcessId>,
    to_remove: Vec<ProcessId>,
    retired: Vec<ProcessId>,
    paused: bool,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a process in the arena. It is not managed until initialized and
    /// passed to [`add_process`](Self::add_process), or chained to a managed
    /// process.
    pub fn spawn<B: ProcessBehavior>(&mut self, name: &str, behavior: B) -> ProcessId {
        self.arena.spawn(name, behavior)
    }

    pub fn arena(&self) -> &ProcessArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ProcessArena {
        &mut self.arena
    }

    /// Start managing an initialized process.
    pub fn add_process(&mut self, id: ProcessId) -> Result<(), ProcessError> {
        let process = self.arena.get(id).ok_or(ProcessError::Unknown { id })?;
        self.check_addable(process)?;

        debug!("Added {}", process.name());
        self.processes.push(id);
        Ok(())
    }

    /// A managed top-level process.
    pub fn get_process(&self, id: ProcessId) -> Option<&Process> {
        if !self.processes.contains(&id) {
            return None;
        }
        self.arena.get(id)
    }

    pub fn get_process_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        if !self.processes.contains(&id) {
            return None;
        }
        self.arena.get_mut(id)
    }

    /// Top-level process ids in the order they were added.
    pub fn processes(&self) -> &[ProcessId] {
        &self.processes
    }

    /// Top-level processes whose behavior is a `T`.
    pub fn processes_of<T: ProcessBehavior>(&self) -> Vec<ProcessId> {
        self.processes
            .iter()
            .copied()
            .filter(|&id| {
                self.arena
                    .get(id)
                    .is_some_and(|process| process.behavior::<T>().is_some())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn update(&mut self, delta: f32) {
        if self.paused {
            return;
        }

        for id in self.retired.drain(..) {
            if let Some(process) = self.arena.remove(id) {
                trace!("{} removed", process.name());
            }
        }

        for &id in &self.processes {
            let Some(process) = self.arena.get_mut(id) else {
                continue;
            };
            if process.is_running() {
                if let Err(err) = process.update(delta) {
                    warn!("{}", err);
                }
            }
        }

        let terminated: Vec<ProcessId> = self
            .processes
            .iter()
            .copied()
            .filter(|&id| self.arena.get(id).is_some_and(Process::is_terminated))
            .collect();

        for id in terminated {
            self.finish(id);
        }

        self.flush();
    }

    /// Abort every managed chain and forget the managed set.
    pub fn shutdown(&mut self) {
        let processes = std::mem::take(&mut self.processes);
        for id in processes.into_iter().chain(self.to_add.drain(..)) {
            let chain = self.arena.abort_all(id);
            self.retired.extend(chain);
        }
        self.to_remove.clear();
        debug!("Process manager shut down");
    }

    /// Hand a terminated process over to its child and stage it for removal.
    fn finish(&mut self, id: ProcessId) {
        let Some(process) = self.arena.get_mut(id) else {
            return;
        };
        let activate = process.should_activate_child();
        let child = process.take_child();
        let name = process.name().to_string();

        self.to_remove.push(id);
        self.retired.push(id);

        let Some(child) = child else {
            return;
        };
        if activate {
            self.activate_child(&name, child);
        } else {
            trace!("{} ended {}, aborting its children", name, self.state_of(id));
            self.abort_chain(child);
        }
    }

    fn activate_child(&mut self, parent: &str, child: ProcessId) {
        if self.is_managed(child) {
            debug!("{} already running, detached from {}", child, parent);
            return;
        }

        let Some(process) = self.arena.get_mut(child) else {
            error!("Child {} of {} does not exist", child, parent);
            return;
        };

        if !process.is_initialized() {
            match process.initialize() {
                Ok(true) => {}
                Ok(false) => {
                    error!("{} failed initialization, aborting its chain", process.name());
                    self.abort_chain(child);
                    return;
                }
                Err(err) => {
                    error!("{}", err);
                    self.abort_chain(child);
                    return;
                }
            }
        }

        let Some(process) = self.arena.get(child) else {
            return;
        };
        if let Err(err) = self.check_addable(process) {
            error!("Cannot activate child of {}: {}", parent, err);
            self.abort_chain(child);
            return;
        }

        debug!("Activating {}, child of {}", process.name(), parent);
        self.to_add.push(child);
    }

    fn check_addable(&self, process: &Process) -> Result<(), ProcessError> {
        let id = process.id();
        if self.is_managed(id) {
            return Err(ProcessError::DuplicateId { id });
        }
        if !process.is_initialized() {
            return Err(ProcessError::NotInitialized {
                process: process.name().to_string(),
            });
        }
        Ok(())
    }

    fn is_managed(&self, id: ProcessId) -> bool {
        self.processes.contains(&id) || self.to_add.contains(&id)
    }

    /// Abort a chain. Members that were also added directly leave the
    /// managed set when the pass is flushed.
    fn abort_chain(&mut self, id: ProcessId) {
        let chain = self.arena.abort_all(id);
        for &aborted in &chain {
            if self.processes.contains(&aborted) {
                self.to_remove.push(aborted);
            }
        }
        self.to_add.retain(|queued| !chain.contains(queued));
        self.retired.extend(chain);
    }

    fn state_of(&self, id: ProcessId) -> String {
        self.arena
            .get(id)
            .map_or_else(String::new, |process| process.state().to_string())
    }

    fn flush(&mut self) {
        if !self.to_remove.is_empty() {
            let to_remove = std::mem::take(&mut self.to_remove);
            self.processes.retain(|id| !to_remove.contains(id));
        }
        self.processes.append(&mut self.to_add);
    }
}
