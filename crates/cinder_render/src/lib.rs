//! Cinder Render System
//!
//! Tracks drawable components of live entities and draws them, deepest first,
//! onto an opaque [`RenderTarget`](cinder_core::entity::RenderTarget).

pub mod error;
pub mod headless;
pub mod manager;

pub use error::RenderError;
pub use headless::HeadlessTarget;
pub use manager::RenderManager;

/// Default frame rate the render manager throttles to.
pub const TARGET_FRAME_RATE: u32 = 60;
