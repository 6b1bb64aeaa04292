//! Shared lifecycle state machine
//!
//! Entities and components move through the same states:
//!
//! ```text
//! NotInitialized --initialize--> Deactivated <--activate/deactivate--> Active
//!        \______________________________\__________________________\____--destroy--> Destroyed
//! ```
//!
//! `Lifecycle` is a plain value owned by each stateful object. The owner passes
//! its own hook as a closure to every transition, so entities can fan out to
//! their components without a shared base type.

use crate::observer::{ObserverId, Observers};
use std::fmt;
use thiserror::Error;

/// The current state of a lifecycle object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Initial, inactive state.
    #[default]
    NotInitialized,
    /// Initialized but inactive. Can be activated again.
    Deactivated,
    /// Initialized and running.
    Active,
    /// Terminal.
    Destroyed,
}

impl LifecycleState {
    /// Initialized and not destroyed.
    #[inline]
    pub fn is_initialized(self) -> bool {
        matches!(self, Self::Active | Self::Deactivated)
    }

    #[inline]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    #[inline]
    pub fn is_deactivated(self) -> bool {
        self == Self::Deactivated
    }

    #[inline]
    pub fn is_destroyed(self) -> bool {
        self == Self::Destroyed
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotInitialized => "not initialized",
            Self::Deactivated => "deactivated",
            Self::Active => "active",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Notification fired after a successful transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Initialized,
    Activated,
    Deactivated,
    Destroyed,
}

/// Transitions requested from a state that does not allow them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot initialize: already {state}")]
    AlreadyInitialized { state: LifecycleState },

    #[error("cannot {action}: not initialized")]
    NotInitialized { action: &'static str },

    #[error("cannot {action}: already destroyed")]
    Destroyed { action: &'static str },
}

/// Lifecycle state plus the observers notified on each transition.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
    observers: Observers<LifecycleEvent>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    #[inline]
    pub fn is_deactivated(&self) -> bool {
        self.state.is_deactivated()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&LifecycleEvent) + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Whether `initialize` would be accepted from the current state.
    pub fn check_initialize(&self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::NotInitialized => Ok(()),
            LifecycleState::Destroyed => Err(LifecycleError::Destroyed {
                action: "initialize",
            }),
            state => Err(LifecycleError::AlreadyInitialized { state }),
        }
    }

    /// Run `hook` and move to `Deactivated` if it reports success.
    ///
    /// A failed hook leaves the state untouched and fires no notification.
    pub fn initialize<F>(&mut self, hook: F) -> Result<bool, LifecycleError>
    where
        F: FnOnce() -> bool,
    {
        self.check_initialize()?;

        if !hook() {
            return Ok(false);
        }

        self.state = LifecycleState::Deactivated;
        self.observers.notify(&LifecycleEvent::Initialized);
        Ok(true)
    }

    /// Move to `Active`. Returns `Ok(false)` when already active.
    pub fn activate<F>(&mut self, hook: F) -> Result<bool, LifecycleError>
    where
        F: FnOnce(),
    {
        self.ensure_initialized("activate")?;
        if self.state.is_active() {
            return Ok(false);
        }

        self.state = LifecycleState::Active;
        hook();
        self.observers.notify(&LifecycleEvent::Activated);
        Ok(true)
    }

    /// Move to `Deactivated`. Returns `Ok(false)` when already deactivated.
    pub fn deactivate<F>(&mut self, hook: F) -> Result<bool, LifecycleError>
    where
        F: FnOnce(),
    {
        self.ensure_initialized("deactivate")?;
        if self.state.is_deactivated() {
            return Ok(false);
        }

        self.state = LifecycleState::Deactivated;
        hook();
        self.observers.notify(&LifecycleEvent::Deactivated);
        Ok(true)
    }

    /// Move to `Destroyed` from any state, including `NotInitialized`.
    ///
    /// The hook and notification run on every call.
    pub fn destroy<F>(&mut self, hook: F)
    where
        F: FnOnce(),
    {
        self.state = LifecycleState::Destroyed;
        hook();
        self.observers.notify(&LifecycleEvent::Destroyed);
    }

    fn ensure_initialized(&self, action: &'static str) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::NotInitialized => Err(LifecycleError::NotInitialized { action }),
            LifecycleState::Destroyed => Err(LifecycleError::Destroyed { action }),
            _ => Ok(()),
        }
    }
}
