//! Console output capture
//!
//! Script `console.*` calls funnel into [`emit`], which writes to the sink of
//! the executing thread. By default the sink forwards lines to `tracing`. A
//! [`CaptureSession`] swaps in a buffering sink for its lifetime and puts the
//! previous sink back when dropped, so every exit path (normal return, early
//! `?` return, panic unwinding) restores it.
//!
//! Sessions do not nest. Opening a second session while one is live on the
//! same thread is a logic error and panics.

use std::cell::RefCell;
use std::marker::PhantomData;

enum Sink {
    Forward,
    Buffer(Vec<String>),
}

thread_local! {
    static SINK: RefCell<Sink> = const { RefCell::new(Sink::Forward) };
}

/// Write one console line to the current sink.
pub fn emit(line: String) {
    SINK.with(|sink| match &mut *sink.borrow_mut() {
        Sink::Forward => tracing::info!(target: "codepad::console", "{line}"),
        Sink::Buffer(lines) => {
            tracing::trace!(target: "codepad::console", "{line}");
            lines.push(line);
        }
    });
}

/// Whether a capture session is live on this thread.
pub fn is_capturing() -> bool {
    SINK.with(|sink| matches!(*sink.borrow(), Sink::Buffer(_)))
}

/// Scoped ownership of the console sink.
pub struct CaptureSession {
    previous: Option<Sink>,
    // Tied to the thread whose sink it replaced.
    _thread: PhantomData<*const ()>,
}

impl CaptureSession {
    /// Start capturing on this thread.
    ///
    /// # Panics
    ///
    /// Panics if a session is already live on this thread.
    pub fn begin() -> Self {
        let previous = SINK.with(|sink| {
            let mut sink = sink.borrow_mut();
            assert!(
                !matches!(*sink, Sink::Buffer(_)),
                "console capture is not reentrant: a capture session is already active"
            );
            std::mem::replace(&mut *sink, Sink::Buffer(Vec::new()))
        });

        Self {
            previous: Some(previous),
            _thread: PhantomData,
        }
    }

    /// End the session and return the captured lines in emission order.
    pub fn finish(mut self) -> Vec<String> {
        self.restore().unwrap_or_default()
    }

    fn restore(&mut self) -> Option<Vec<String>> {
        let previous = self.previous.take()?;
        let captured = SINK.with(|sink| std::mem::replace(&mut *sink.borrow_mut(), previous));
        match captured {
            Sink::Buffer(lines) => Some(lines),
            Sink::Forward => None,
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run `body` with console output captured.
pub fn with_capture<R>(body: impl FnOnce() -> R) -> (R, Vec<String>) {
    let session = CaptureSession::begin();
    let value = body();
    (value, session.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_captures_in_order() {
        let ((), lines) = with_capture(|| {
            emit("first".to_string());
            emit("second".to_string());
        });
        assert_eq!(lines, vec!["first", "second"]);
        assert!(!is_capturing());
    }

    #[test]
    fn test_empty_capture() {
        let (value, lines) = with_capture(|| 42);
        assert_eq!(value, 42);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_restored_after_panic() {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            with_capture(|| {
                emit("lost".to_string());
                panic!("body failed");
            })
        }));
        assert!(outcome.is_err());
        assert!(!is_capturing());

        let ((), lines) = with_capture(|| emit("after".to_string()));
        assert_eq!(lines, vec!["after"]);
    }

    #[test]
    fn test_early_drop_restores_sink() {
        {
            let _session = CaptureSession::begin();
            assert!(is_capturing());
        }
        assert!(!is_capturing());
    }

    #[test]
    #[should_panic(expected = "not reentrant")]
    fn test_nested_session_panics() {
        let _outer = CaptureSession::begin();
        let _inner = CaptureSession::begin();
    }

    #[test]
    fn test_sessions_are_per_thread() {
        let _session = CaptureSession::begin();
        let other = std::thread::spawn(|| {
            let ((), lines) = with_capture(|| emit("elsewhere".to_string()));
            lines
        })
        .join()
        .expect("thread finished");
        assert_eq!(other, vec!["elsewhere"]);
    }
}
