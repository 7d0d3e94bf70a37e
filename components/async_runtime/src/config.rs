//! Runtime configuration.
//!
//! Settings shared by every promise created on an event loop. Loaded from
//! JSON or built in code; unset fields fall back to [`RuntimeConfig::default`].

use serde::Deserialize;
use thiserror::Error;

/// How the resolution procedure detects thenable adoption cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDetection {
    /// Reject when a thenable fulfills with a value already seen earlier in
    /// the same adoption chain (compared with strict equality).
    #[default]
    SeenValues,
    /// No value history; only `max_adoption_steps` bounds a chain.
    Disabled,
}

/// Configuration for the promise runtime.
///
/// # Examples
///
/// ```
/// use async_runtime::{CycleDetection, RuntimeConfig};
///
/// let config = RuntimeConfig::from_json(r#"{ "max_adoption_steps": 64 }"#).unwrap();
/// assert_eq!(config.max_adoption_steps, Some(64));
/// assert_eq!(config.cycle_detection, CycleDetection::SeenValues);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Cycle detection strategy for thenable adoption
    pub cycle_detection: CycleDetection,
    /// Maximum resolution steps per adoption chain (None = bounded only by
    /// the length of the chain)
    pub max_adoption_steps: Option<usize>,
    /// Log settlements at debug level instead of trace
    pub trace_settlements: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_detection: CycleDetection::SeenValues,
            max_adoption_steps: None,
            trace_settlements: false,
        }
    }
}

/// Errors produced while loading a [`RuntimeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed
    #[error("invalid runtime config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A step limit of zero would reject every resolution
    #[error("max_adoption_steps must be greater than zero")]
    ZeroAdoptionLimit,
}

impl RuntimeConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_adoption_steps == Some(0) {
            return Err(ConfigError::ZeroAdoptionLimit);
        }
        Ok(())
    }
}
