//! Cinder Engine Core
//!
//! Contains the runtime coordination primitives:
//! - Shared lifecycle state machine and observer lists
//! - Entities composed of typed components
//! - Double-buffered, time-budgeted event queue
//! - Chainable processes and their manager
//! - Fixed-step time and the physics boundary

pub mod as_any;
pub mod entity;
pub mod event;
pub mod lifecycle;
pub mod observer;
pub mod physics;
pub mod process;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
