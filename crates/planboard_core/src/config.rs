//! Engine configuration.
//!
//! # Responsibility
//! - Hold the tunable limits of the edit engine with production defaults.
//! - Accept host-provided JSON overrides; missing fields keep defaults.
//!
//! # Invariants
//! - A config is validated before an engine is built from it.

use crate::history::manager::DEFAULT_HISTORY_LIMIT;
use crate::model::item::MINUTE_MS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shortest allowed item duration.
pub const DEFAULT_MIN_DURATION_MINUTES: i64 = 15;
/// Longest allowed item duration.
pub const DEFAULT_MAX_DURATION_MINUTES: i64 = 24 * 60;
/// Pointer-driven time changes snap to this grid.
pub const DEFAULT_SNAP_MINUTES: i64 = 15;

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Payload is not a JSON object with the expected field types.
    Parse(String),
    ZeroHistoryLimit,
    InvalidDurationBounds { min: i64, max: i64 },
    NonPositiveSnap(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid engine config: {message}"),
            Self::ZeroHistoryLimit => write!(f, "history limit must be at least 1"),
            Self::InvalidDurationBounds { min, max } => write!(
                f,
                "duration bounds must satisfy 0 < min <= max in range, got min={min} max={max}"
            ),
            Self::NonPositiveSnap(value) => {
                write!(f, "snap interval must be positive and in range, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Tunables of [`crate::EditEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Per-entity undo stack bound.
    pub history_limit: usize,
    /// Inclusive lower bound on item duration.
    pub min_duration_minutes: i64,
    /// Inclusive upper bound on item duration.
    pub max_duration_minutes: i64,
    /// Grid for pointer-driven time changes.
    pub snap_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            min_duration_minutes: DEFAULT_MIN_DURATION_MINUTES,
            max_duration_minutes: DEFAULT_MAX_DURATION_MINUTES,
            snap_minutes: DEFAULT_SNAP_MINUTES,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON override document.
    pub fn from_json(payload: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(payload).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        if self.min_duration_minutes <= 0
            || self.min_duration_minutes > self.max_duration_minutes
            || self.max_duration_minutes.checked_mul(MINUTE_MS).is_none()
        {
            return Err(ConfigError::InvalidDurationBounds {
                min: self.min_duration_minutes,
                max: self.max_duration_minutes,
            });
        }
        if self.snap_minutes <= 0 || self.snap_minutes.checked_mul(MINUTE_MS).is_none() {
            return Err(ConfigError::NonPositiveSnap(self.snap_minutes));
        }
        Ok(())
    }
}
