// process.rs - Multi-frame unit of work with pause/resume and terminal outcomes

use crate::as_any::AsAny;
use crate::entity::short_type_name;
use crate::observer::{ObserverId, Observers};
use crate::process::ProcessError;
use std::any::type_name;
use std::fmt;
use tracing::{error, trace};

/// Process identifier, unique within its arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u32);

impl ProcessId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum ProcessState {
    /// Initial, inactive.
    #[default]
    NotInitialized,
    Running,
    /// Alive but not advancing.
    Paused,
    Succeeded,
    Failed,
    /// Stopped before completing.
    Aborted,
}

impl ProcessState {
    #[inline]
    pub fn is_initialized(self) -> bool {
        self != Self::NotInitialized
    }

    /// Running or paused.
    #[inline]
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Any terminal state.
    #[inline]
    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotInitialized => "not initialized",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Notification fired after a process changes state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProcessEvent {
    Paused,
    Resumed,
    Succeeded,
    Failed,
    Aborted,
}

/// Outcome reported by [`ProcessBehavior::on_update`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ProcessSignal {
    #[default]
    Continue,
    Succeed,
    Fail,
}

/// The work a process performs. Every hook except `on_update` defaults to a
/// no-op.
pub trait ProcessBehavior: AsAny {
    /// Returns false to fail initialization.
    fn on_initialize(&mut self) -> bool {
        true
    }

    fn on_update(&mut self, delta: f32) -> ProcessSignal;

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}

    fn on_succeed(&mut self) {}

    fn on_fail(&mut self) {}

    fn on_abort(&mut self) {}
}

pub struct Process {
    id: ProcessId,
    name: String,
    kind: &'static str,
    state: ProcessState,
    running_time: f32,
    begin_paused: bool,
    activate_child_on_failure: bool,
    activate_child_on_abort: bool,
    child: Option<ProcessId>,
    observers: Observers<ProcessEvent>,
    behavior: Box<dyn ProcessBehavior>,
}

impl Process {
    /// Display name is `"{kind} {id}"`, with `": {name}"` appended when
    /// `name` is not empty. `kind` is the behavior's type name.
    pub(crate) fn new<B: ProcessBehavior>(id: ProcessId, name: &str, behavior: B) -> Self {
        let kind = short_type_name(type_name::<B>());
        let name = if name.is_empty() {
            format!("{kind} {id}")
        } else {
            format!("{kind} {id}: {name}")
        };

        Self {
            id,
            name,
            kind,
            state: ProcessState::NotInitialized,
            running_time: 0.0,
            begin_paused: false,
            activate_child_on_failure: false,
            activate_child_on_abort: false,
            child: None,
            observers: Observers::new(),
            behavior: Box::new(behavior),
        }
    }

    #[inline]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Total time spent in `Running`, accumulated by updates.
    #[inline]
    pub fn running_time(&self) -> f32 {
        self.running_time
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == ProcessState::Paused
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    pub fn has_succeeded(&self) -> bool {
        self.state == ProcessState::Succeeded
    }

    pub fn has_failed(&self) -> bool {
        self.state == ProcessState::Failed
    }

    pub fn was_aborted(&self) -> bool {
        self.state == ProcessState::Aborted
    }

    pub fn begin_paused(&self) -> bool {
        self.begin_paused
    }

    /// Enter `Paused` instead of `Running` on initialization.
    pub fn set_begin_paused(&mut self, begin_paused: bool) {
        self.begin_paused = begin_paused;
    }

    pub fn activate_child_on_failure(&self) -> bool {
        self.activate_child_on_failure
    }

    pub fn set_activate_child_on_failure(&mut self, activate: bool) {
        self.activate_child_on_failure = activate;
    }

    pub fn activate_child_on_abort(&self) -> bool {
        self.activate_child_on_abort
    }

    pub fn set_activate_child_on_abort(&mut self, activate: bool) {
        self.activate_child_on_abort = activate;
    }

    /// Whether the terminal state reached should hand over to the child.
    pub fn should_activate_child(&self) -> bool {
        match self.state {
            ProcessState::Succeeded => true,
            ProcessState::Failed => self.activate_child_on_failure,
            ProcessState::Aborted => self.activate_child_on_abort,
            _ => false,
        }
    }

    /// The immediate child, if any.
    #[inline]
    pub fn child(&self) -> Option<ProcessId> {
        self.child
    }

    pub(crate) fn set_child(&mut self, child: ProcessId) {
        self.child = Some(child);
    }

    pub(crate) fn take_child(&mut self) -> Option<ProcessId> {
        self.child.take()
    }

    pub fn behavior<T: ProcessBehavior>(&self) -> Option<&T> {
        (*self.behavior).as_any().downcast_ref::<T>()
    }

    pub fn behavior_mut<T: ProcessBehavior>(&mut self) -> Option<&mut T> {
        (*self.behavior).as_any_mut().downcast_mut::<T>()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&ProcessEvent) + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Run setup and enter `Running`, or `Paused` when `begin_paused` is set.
    ///
    /// `Ok(false)` means the behavior refused to initialize; the state is left
    /// unchanged.
    pub fn initialize(&mut self) -> Result<bool, ProcessError> {
        if self.is_initialized() {
            return Err(ProcessError::AlreadyInitialized {
                process: self.name.clone(),
                state: self.state,
            });
        }

        if !self.behavior.on_initialize() {
            error!("{} failed initialization", self.name);
            return Ok(false);
        }

        trace!("{} initialized", self.name);
        if self.begin_paused {
            self.state = ProcessState::Paused;
            self.behavior.on_pause();
            self.observers.notify(&ProcessEvent::Paused);
        } else {
            self.state = ProcessState::Running;
        }
        Ok(true)
    }

    /// Advance a running process. A signal from the behavior ends the process
    /// in the same call.
    pub fn update(&mut self, delta: f32) -> Result<(), ProcessError> {
        if !self.is_running() {
            return Err(ProcessError::NotRunning {
                process: self.name.clone(),
                state: self.state,
            });
        }

        self.running_time += delta;
        match self.behavior.on_update(delta) {
            ProcessSignal::Continue => Ok(()),
            ProcessSignal::Succeed => self.succeed(),
            ProcessSignal::Fail => self.fail(),
        }
    }

    /// No-op when already paused.
    pub fn pause(&mut self) -> Result<(), ProcessError> {
        self.ensure_alive("pause")?;
        if self.is_paused() {
            return Ok(());
        }

        self.state = ProcessState::Paused;
        self.behavior.on_pause();
        self.observers.notify(&ProcessEvent::Paused);
        trace!("{} paused", self.name);
        Ok(())
    }

    /// No-op when already running.
    pub fn resume(&mut self) -> Result<(), ProcessError> {
        self.ensure_alive("resume")?;
        if self.is_running() {
            return Ok(());
        }

        self.state = ProcessState::Running;
        self.behavior.on_resume();
        self.observers.notify(&ProcessEvent::Resumed);
        trace!("{} resumed", self.name);
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) -> Result<(), ProcessError> {
        if paused {
            self.pause()
        } else {
            self.resume()
        }
    }

    pub fn succeed(&mut self) -> Result<(), ProcessError> {
        self.ensure_alive("succeed")?;

        trace!("{} succeeded", self.name);
        self.state = ProcessState::Succeeded;
        self.behavior.on_succeed();
        self.observers.notify(&ProcessEvent::Succeeded);
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), ProcessError> {
        self.ensure_alive("fail")?;

        trace!("{} failed", self.name);
        self.state = ProcessState::Failed;
        self.behavior.on_fail();
        self.observers.notify(&ProcessEvent::Failed);
        Ok(())
    }

    /// Abort from any non-terminal state, including `NotInitialized`.
    ///
    /// Returns false if the process had already terminated.
    pub fn abort(&mut self) -> bool {
        if self.is_terminated() {
            return false;
        }

        trace!("{} aborted", self.name);
        self.state = ProcessState::Aborted;
        self.behavior.on_abort();
        self.observers.notify(&ProcessEvent::Aborted);
        true
    }

    fn ensure_alive(&self, action: &'static str) -> Result<(), ProcessError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(ProcessError::NotAlive {
                process: self.name.clone(),
                state: self.state,
                action,
            })
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("running_time", &self.running_time)
            .field("child", &self.child)
            .finish()
    }
}
