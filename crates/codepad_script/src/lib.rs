//! Codepad Scripting System
//!
//! JavaScript and TypeScript execution via QuickJS
//!
//! ## Architecture
//!
//! - **Capture:** `console.*` output lands in a scoped, thread-local sink
//! - **Runtime:** every evaluation gets a fresh QuickJS runtime and context
//! - **Transpile:** TypeScript is turned into JavaScript by erasing types
//!
//! Nothing survives between evaluations except what the capture sink
//! returned to the caller.

pub mod capture;
pub mod error;
pub mod evaluator;
mod rejection;
pub mod runtime;
pub mod transpile;

pub use capture::{with_capture, CaptureSession};
pub use error::{RuntimeError, ScriptError};
pub use evaluator::{EvalLimits, Evaluator};
pub use transpile::{transpile, TranspileError, Transpiler};

pub use rquickjs;
