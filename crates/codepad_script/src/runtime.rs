//! Script runtime management
//!
//! One [`ScriptRuntime`] per evaluation: a fresh QuickJS runtime and context
//! with the console prelude installed and an optional wall-clock deadline
//! enforced through the interrupt handler.

use crate::capture;
use crate::error::{RuntimeError, ScriptError};
use crate::evaluator::EvalLimits;
use crate::rejection::RejectionLog;
use rquickjs::{Coerced, Context, Ctx, Function, Object, Runtime, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

const PRELUDE: &str = include_str!("prelude.js");

/// Isolated script execution context
pub struct ScriptRuntime {
    context: Context,
    #[allow(dead_code)] // Kept alive for context lifetime
    runtime: Runtime,
    limits: EvalLimits,
    timed_out: Arc<AtomicBool>,
    // Dropped after `runtime`, which holds a pointer to it.
    rejections: Box<RejectionLog>,
}

impl ScriptRuntime {
    pub fn new(limits: EvalLimits) -> Result<Self, ScriptError> {
        let runtime = Runtime::new()?;
        let timed_out = Arc::new(AtomicBool::new(false));

        if let Some(timeout) = limits.timeout {
            let deadline = Instant::now() + timeout;
            let flag = Arc::clone(&timed_out);
            runtime.set_interrupt_handler(Some(Box::new(move || {
                let expired = Instant::now() >= deadline;
                if expired {
                    flag.store(true, Ordering::Relaxed);
                }
                expired
            })));
        }

        let context = Context::full(&runtime)?;
        let rejections = Box::<RejectionLog>::default();
        // SAFETY: the box is never moved out of and is dropped after `runtime`.
        context.with(|ctx| unsafe { RejectionLog::install(&ctx, &rejections) });

        Ok(Self {
            context,
            runtime,
            limits,
            timed_out,
            rejections,
        })
    }

    /// Evaluate `source` as a global script, then settle promise jobs and
    /// timers. Console output goes to the current capture sink.
    pub fn execute(&self, source: &str) -> Result<(), RuntimeError> {
        let halted = self.context.with(|ctx| match self.drive(&ctx, source) {
            Ok(halted) => halted,
            Err(error) => Some(RuntimeError::new(caught_message(&ctx, error))),
        });

        match self.limits.timeout {
            Some(limit) if self.timed_out.load(Ordering::Relaxed) => {
                tracing::warn!(limit_ms = limit.as_millis() as u64, "script interrupted by deadline");
                Err(RuntimeError::timed_out(limit))
            }
            _ => halted.map_or(Ok(()), Err),
        }
    }

    /// Returns the fault that stopped the script, if any.
    fn drive<'js>(&self, ctx: &Ctx<'js>, source: &str) -> rquickjs::Result<Option<RuntimeError>> {
        let harness = install_prelude(ctx)?;
        let run: Function = harness.get("run")?;
        let pending_timers: Function = harness.get("pendingTimers")?;
        let fire_next_timer: Function = harness.get("fireNextTimer")?;

        if let Some(message) = run.call::<_, Option<String>>((source,))? {
            return Ok(Some(RuntimeError::new(message)));
        }

        let mut turns = 0;
        loop {
            if let Some(exhausted) = self.drain_jobs(ctx) {
                return Ok(Some(exhausted));
            }
            if let Some(reason) = self.rejections.take_unhandled() {
                return Ok(Some(RuntimeError::new(reason)));
            }
            if pending_timers.call::<_, u32>(())? == 0 {
                return Ok(None);
            }
            if turns == self.limits.max_timer_turns {
                tracing::warn!(turns, "timer budget exhausted");
                return Ok(Some(RuntimeError::timer_budget(turns)));
            }
            if let Some(message) = fire_next_timer.call::<_, Option<String>>(())? {
                return Ok(Some(RuntimeError::new(message)));
            }
            turns += 1;
        }
    }

    /// Run queued promise jobs until the queue is empty or the budget is spent.
    fn drain_jobs(&self, ctx: &Ctx<'_>) -> Option<RuntimeError> {
        let mut jobs = 0;
        while ctx.execute_pending_job() {
            if jobs == self.limits.max_pending_jobs {
                tracing::warn!(jobs, "promise job budget exhausted");
                return Some(RuntimeError::job_budget(jobs));
            }
            jobs += 1;
        }
        None
    }
}

fn install_prelude<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let install: Function = ctx.eval(PRELUDE)?;
    let emit = Function::new(ctx.clone(), |line: String| capture::emit(line))?;
    install.call((emit,))
}

/// Message for an error that escaped the harness (interrupts, engine faults).
fn caught_message(ctx: &Ctx<'_>, error: rquickjs::Error) -> String {
    if !matches!(error, rquickjs::Error::Exception) {
        return error.to_string();
    }
    describe(&ctx.catch())
}

/// `error.message` for `Error` instances, `String(value)` for anything else.
pub(crate) fn describe(value: &Value<'_>) -> String {
    if let Some(message) = value.as_exception().and_then(|exception| exception.message()) {
        return message;
    }
    match value.get::<Coerced<String>>() {
        Ok(text) => text.0,
        Err(_) => {
            value.ctx().catch();
            "uncaught exception".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::with_capture;
    use std::time::Duration;

    fn limits() -> EvalLimits {
        EvalLimits {
            timeout: Some(Duration::from_secs(5)),
            max_timer_turns: 100,
            max_pending_jobs: 1_000,
        }
    }

    #[test]
    fn test_execute_captures_console() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, lines) = with_capture(|| runtime.execute("console.log('a', 1, true)"));
        assert!(outcome.is_ok());
        assert_eq!(lines, vec!["a 1 true"]);
    }

    #[test]
    fn test_promise_jobs_are_drained() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, lines) = with_capture(|| {
            runtime.execute("Promise.resolve(2).then((v) => console.log('then', v)); console.log('sync');")
        });
        assert!(outcome.is_ok());
        assert_eq!(lines, vec!["sync", "then 2"]);
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let source = r#"
            setTimeout(() => console.log("late"), 50);
            const id = setTimeout(() => console.log("cancelled"), 10);
            setTimeout(() => console.log("early"), 5);
            clearTimeout(id);
        "#;
        let (outcome, lines) = with_capture(|| runtime.execute(source));
        assert!(outcome.is_ok());
        assert_eq!(lines, vec!["early", "late"]);
    }

    #[test]
    fn test_throwing_timer_fails_run() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| {
            runtime.execute("setTimeout(() => { throw new Error('tick failed'); }, 1);")
        });
        assert_eq!(outcome, Err(RuntimeError::new("tick failed")));
    }

    #[test]
    fn test_non_error_throw_is_stringified() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| runtime.execute("throw 42;"));
        assert_eq!(outcome, Err(RuntimeError::new("42")));
    }

    #[test]
    fn test_deadline_interrupts_infinite_loop() {
        let runtime = ScriptRuntime::new(EvalLimits {
            timeout: Some(Duration::from_millis(50)),
            ..limits()
        })
        .unwrap();
        let (outcome, _) = with_capture(|| runtime.execute("while (true) {}"));
        assert_eq!(
            outcome,
            Err(RuntimeError::timed_out(Duration::from_millis(50)))
        );
    }

    #[test]
    fn test_async_throw_fails_run() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let source = "async function main() { console.log('start'); throw new Error('async boom'); } main();";
        let (outcome, lines) = with_capture(|| runtime.execute(source));
        assert_eq!(outcome, Err(RuntimeError::new("async boom")));
        assert_eq!(lines, vec!["start"]);
    }

    #[test]
    fn test_rejection_after_await_fails_run() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| {
            runtime.execute("(async () => { await null; throw new Error('later boom'); })();")
        });
        assert_eq!(outcome, Err(RuntimeError::new("later boom")));
    }

    #[test]
    fn test_unhandled_rejection_fails_run() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| runtime.execute("Promise.reject(new Error('rejected'));"));
        assert_eq!(outcome, Err(RuntimeError::new("rejected")));

        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| runtime.execute("Promise.reject('plain reason');"));
        assert_eq!(outcome, Err(RuntimeError::new("plain reason")));
    }

    #[test]
    fn test_caught_rejection_is_success() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let source = r#"
            Promise.reject(new Error("first")).catch((e) => console.log("caught", e.message));
            const later = Promise.reject(new Error("second"));
            later.catch(() => console.log("caught later"));
            (async () => {
                try { await Promise.reject(new Error("third")); } catch (e) { console.log("awaited", e.message); }
            })();
        "#;
        let (outcome, lines) = with_capture(|| runtime.execute(source));
        assert_eq!(outcome, Ok(()));
        assert_eq!(lines, vec!["caught first", "caught later", "awaited third"]);
    }

    #[test]
    fn test_rejection_inside_timer_fails_run() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| {
            runtime.execute("setTimeout(async () => { throw new Error('late tick'); }, 10);")
        });
        assert_eq!(outcome, Err(RuntimeError::new("late tick")));
    }

    #[test]
    fn test_timer_budget_exhaustion_is_error() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let source = "let n = 0; function tick() { n++; setTimeout(tick, 1); } tick(); setTimeout(() => console.log('never'), 1e9);";
        let (outcome, lines) = with_capture(|| runtime.execute(source));
        assert_eq!(outcome, Err(RuntimeError::timer_budget(100)));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_job_budget_exhaustion_is_error() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| {
            runtime.execute("function spin() { Promise.resolve().then(spin); } spin();")
        });
        assert_eq!(outcome, Err(RuntimeError::job_budget(1_000)));
    }

    #[test]
    fn test_interval_repeats_until_cleared() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let source = r#"
            let count = 0;
            const id = setInterval((label) => {
                count++;
                console.log(label, count);
                if (count === 3) clearInterval(id);
            }, 10, "tick");
            setTimeout(() => console.log("between"), 15);
        "#;
        let (outcome, lines) = with_capture(|| runtime.execute(source));
        assert_eq!(outcome, Ok(()));
        assert_eq!(lines, vec!["tick 1", "between", "tick 2", "tick 3"]);
    }

    #[test]
    fn test_endless_interval_hits_timer_budget() {
        let runtime = ScriptRuntime::new(limits()).unwrap();
        let (outcome, _) = with_capture(|| runtime.execute("setInterval(() => {}, 1000);"));
        assert_eq!(outcome, Err(RuntimeError::timer_budget(100)));
    }
}
