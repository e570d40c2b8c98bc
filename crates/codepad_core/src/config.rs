//! Engine configuration

use crate::markup::{SCRIPT_SENTINEL, STYLESHEET_SENTINEL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub execution: ExecutionSettings,
    pub preview: PreviewSettings,
    pub markup: MarkupSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Wall-clock budget for one evaluation; 0 disables the deadline.
    pub timeout_ms: u64,
    /// Timer callbacks a run may fire after its body; a run with timers still
    /// due past this fails.
    pub max_timer_turns: u32,
    /// Promise jobs a run may drain between timer turns before it fails.
    pub max_pending_jobs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Quiet period before a debounced preview renders.
    pub quiet_period_ms: u64,
    /// Buffered preview updates per subscriber before it lags.
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupSettings {
    pub stylesheet_sentinel: String,
    pub script_sentinel: String,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl ExecutionSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl PreviewSettings {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_timer_turns: 10_000,
            max_pending_jobs: 100_000,
        }
    }
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            quiet_period_ms: 500,
            channel_capacity: 16,
        }
    }
}

impl Default for MarkupSettings {
    fn default() -> Self {
        Self {
            stylesheet_sentinel: STYLESHEET_SENTINEL.to_string(),
            script_sentinel: SCRIPT_SENTINEL.to_string(),
        }
    }
}
