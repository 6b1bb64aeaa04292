//! Cinder Engine Runtime
//!
//! Wires the core managers into a frame loop. The `cinder` binary drives a
//! headless demo scene through it.

pub mod demo;
pub mod engine;
pub mod stats;

pub use demo::DemoError;
pub use engine::{Engine, EngineError};
pub use stats::{FrameStats, Subsystem};
