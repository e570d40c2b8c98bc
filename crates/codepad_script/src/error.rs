//! Script error types

use std::time::Duration;
use thiserror::Error;

/// A fault raised while evaluating a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn timed_out(limit: Duration) -> Self {
        Self::new(format!(
            "execution timed out after {} ms",
            limit.as_millis()
        ))
    }

    /// More `setTimeout`/`setInterval` callbacks were due than the run allows.
    pub fn timer_budget(turns: u32) -> Self {
        Self::new(format!("timer budget of {turns} callbacks exhausted"))
    }

    pub fn job_budget(jobs: u32) -> Self {
        Self::new(format!("promise job budget of {jobs} jobs exhausted"))
    }
}

/// Failures setting up or driving the QuickJS engine itself.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script engine error: {0}")]
    Engine(#[from] rquickjs::Error),
}

impl From<ScriptError> for RuntimeError {
    fn from(error: ScriptError) -> Self {
        RuntimeError::new(error.to_string())
    }
}
