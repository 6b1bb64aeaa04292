//! Cinder Services Layer
//!
//! Settings loading and the input event vocabulary shared by gameplay code
//! and the runtime.

pub mod input;
pub mod settings;

pub use input::{GamePaused, Move, MoveAction, Select, ViewDrag, ViewZoom, WindowResize};
pub use settings::{EngineSettings, PhysicsSettings, RenderSettings, Settings, SettingsError};
