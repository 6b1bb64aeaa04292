//! Settings management
//!
//! Settings are read from an optional JSON file. Every field has a default, so
//! a file only needs to name what it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub render: RenderSettings,
    pub physics: PhysicsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Measure frame time with the wall clock instead of `fixed_frame_time`.
    pub use_wall_time: bool,
    /// Seconds per frame when `use_wall_time` is off.
    pub fixed_frame_time: f32,
    /// Sleep away the rest of short frames.
    pub limit_cpu_usage: bool,
    /// Minimum frame duration in seconds when `limit_cpu_usage` is on.
    pub frame_time_limit: f32,
    pub start_paused: bool,
    /// Time budget for one event queue pass. `None` drains everything.
    pub event_budget_ms: Option<f32>,
    /// Stop after this many frames. `None` runs until asked to stop.
    pub max_frames: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            use_wall_time: true,
            fixed_frame_time: 1.0 / 30.0,
            limit_cpu_usage: true,
            frame_time_limit: DEFAULT_FRAME_TIME_LIMIT,
            start_paused: false,
            event_budget_ms: Some(2.0),
            max_frames: None,
        }
    }
}

impl EngineSettings {
    /// Event queue budget. Values that do not fit a `Duration` fall back to
    /// the default budget.
    pub fn event_budget(&self) -> Option<Duration> {
        let ms = self.event_budget_ms?;
        match Duration::try_from_secs_f32(ms / 1000.0) {
            Ok(budget) => Some(budget),
            Err(err) => {
                warn!("event_budget_ms {} is unusable ({}), using default", ms, err);
                Self::default().event_budget_ms.and_then(millis)
            }
        }
    }

    /// Minimum frame duration. Values that do not fit a `Duration` fall back
    /// to the default limit.
    pub fn min_frame_time(&self) -> Duration {
        Duration::try_from_secs_f32(self.frame_time_limit).unwrap_or_else(|err| {
            warn!(
                "frame_time_limit {} is unusable ({}), using default",
                self.frame_time_limit, err
            );
            Duration::try_from_secs_f32(DEFAULT_FRAME_TIME_LIMIT).unwrap_or_default()
        })
    }
}

const DEFAULT_FRAME_TIME_LIMIT: f32 = 1.0 / 60.0 - 0.001;

fn millis(ms: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(ms / 1000.0).ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub target_frame_rate: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_frame_rate: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub step_rate_hz: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self { step_rate_hz: 60 }
    }
}

impl Settings {
    /// Read and validate settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        settings.validate()?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    /// Unreadable or malformed files are still errors.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                warn!("Settings file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let engine = &self.engine;
        if !engine.fixed_frame_time.is_finite() || engine.fixed_frame_time <= 0.0 {
            return Err(SettingsError::Invalid {
                field: "engine.fixed_frame_time",
                reason: "must be positive",
            });
        }
        if Duration::try_from_secs_f32(engine.frame_time_limit).is_err() {
            return Err(SettingsError::Invalid {
                field: "engine.frame_time_limit",
                reason: "must be a finite, non-negative number of seconds",
            });
        }
        if engine.event_budget_ms.is_some_and(|ms| millis(ms).is_none()) {
            return Err(SettingsError::Invalid {
                field: "engine.event_budget_ms",
                reason: "must be a finite, non-negative number of milliseconds",
            });
        }
        if self.render.target_frame_rate == 0 {
            return Err(SettingsError::Invalid {
                field: "render.target_frame_rate",
                reason: "must be at least 1",
            });
        }
        if self.physics.step_rate_hz == 0 {
            return Err(SettingsError::Invalid {
                field: "physics.step_rate_hz",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
