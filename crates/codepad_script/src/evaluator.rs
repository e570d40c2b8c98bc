//! Sandboxed evaluation
//!
//! Wraps one [`ScriptRuntime`] in a capture session: fresh engine state in,
//! captured console lines (or the fault that stopped the script) out.

use crate::capture::CaptureSession;
use crate::error::RuntimeError;
use crate::runtime::ScriptRuntime;
use codepad_core::config::ExecutionSettings;
use std::time::{Duration, Instant};

/// Bounds applied to a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    /// Wall-clock deadline; `None` lets the script run until it returns.
    pub timeout: Option<Duration>,
    pub max_timer_turns: u32,
    pub max_pending_jobs: u32,
}

impl From<&ExecutionSettings> for EvalLimits {
    fn from(settings: &ExecutionSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            max_timer_turns: settings.max_timer_turns,
            max_pending_jobs: settings.max_pending_jobs,
        }
    }
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self::from(&ExecutionSettings::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    limits: EvalLimits,
}

impl Evaluator {
    pub fn new(limits: EvalLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    /// Evaluate JavaScript source and return its console lines.
    ///
    /// `Ok` with no lines means the script ran and printed nothing. Lines
    /// printed before a fault are discarded with the session.
    ///
    /// # Panics
    ///
    /// Panics if called while a capture session is already active on this
    /// thread.
    pub fn evaluate(&self, source: &str) -> Result<Vec<String>, RuntimeError> {
        let started = Instant::now();
        let session = CaptureSession::begin();
        let outcome = ScriptRuntime::new(self.limits)
            .map_err(RuntimeError::from)
            .and_then(|runtime| runtime.execute(source));
        let lines = session.finish();

        tracing::debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            lines = lines.len(),
            ok = outcome.is_ok(),
            "evaluation finished"
        );

        outcome.map(|()| lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{is_capturing, with_capture};

    #[test]
    fn test_lines_in_emission_order() {
        let evaluator = Evaluator::default();
        let lines = evaluator
            .evaluate("console.log('one'); console.log('two', 2); console.log([1, 2], {});")
            .unwrap();
        assert_eq!(lines, vec!["one", "two 2", "1,2 [object Object]"]);
    }

    #[test]
    fn test_silent_success_is_not_failure() {
        let evaluator = Evaluator::default();
        assert_eq!(evaluator.evaluate("const x = 1 + 1;"), Ok(Vec::new()));
    }

    #[test]
    fn test_thrown_error_message() {
        let evaluator = Evaluator::default();
        let err = evaluator
            .evaluate("console.log('before'); throw new Error('Something broke');")
            .unwrap_err();
        assert_eq!(err.message, "Something broke");
        assert!(!is_capturing());
    }

    #[test]
    fn test_syntax_error_is_runtime_error() {
        let evaluator = Evaluator::default();
        assert!(evaluator.evaluate("let = ;").is_err());
    }

    #[test]
    fn test_runs_share_no_state() {
        let evaluator = Evaluator::default();
        evaluator.evaluate("var leaked = 'first run';").unwrap();
        let lines = evaluator
            .evaluate("console.log(typeof leaked);")
            .unwrap();
        assert_eq!(lines, vec!["undefined"]);
    }

    #[test]
    fn test_sink_restored_after_failure() {
        let evaluator = Evaluator::default();
        let _ = evaluator.evaluate("throw new TypeError('bad');");
        let lines = evaluator.evaluate("console.log('still captured');").unwrap();
        assert_eq!(lines, vec!["still captured"]);
    }

    #[test]
    #[should_panic(expected = "not reentrant")]
    fn test_evaluate_inside_capture_panics() {
        let evaluator = Evaluator::default();
        let _ = with_capture(|| evaluator.evaluate("1"));
    }
}
