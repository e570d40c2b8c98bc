//! Execution state machine
//!
//! `Idle -> Running -> Idle`. Entering `Running` is a single compare-and-swap,
//! so of two concurrent callers exactly one wins. Leaving it is tied to a
//! guard's drop and happens on every exit path, panics included.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExecutionState {
    Idle = 0,
    Running = 1,
}

impl ExecutionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ExecutionState::Running,
            _ => ExecutionState::Idle,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(ExecutionState::Idle as u8))
    }

    pub fn load(&self) -> ExecutionState {
        ExecutionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Enter `Running`, or `None` if a run is already in flight.
    pub fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.0
            .compare_exchange(
                ExecutionState::Idle as u8,
                ExecutionState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| RunGuard { cell: self })
    }
}

/// Holds `Running` until dropped.
#[must_use = "the run ends as soon as the guard is dropped"]
pub(crate) struct RunGuard<'a> {
    cell: &'a StateCell,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.cell
            .0
            .store(ExecutionState::Idle as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        assert_eq!(StateCell::new().load(), ExecutionState::Idle);
    }

    #[test]
    fn test_second_begin_rejected_while_running() {
        let cell = StateCell::new();
        let guard = cell.try_begin().unwrap();
        assert_eq!(cell.load(), ExecutionState::Running);
        assert!(cell.try_begin().is_none());

        drop(guard);
        assert_eq!(cell.load(), ExecutionState::Idle);
        assert!(cell.try_begin().is_some());
    }

    #[test]
    fn test_guard_released_on_panic() {
        let cell = StateCell::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cell.try_begin().unwrap();
            panic!("evaluation blew up");
        }));
        assert!(outcome.is_err());
        assert_eq!(cell.load(), ExecutionState::Idle);
    }
}
