//! Codepad Engine
//!
//! The caller-facing surface: dispatch a language to its pipeline, run it
//! under the single-execution state machine, and drive the live preview.
//!
//! ```text
//! run ──► resolve ──► Direct ────► evaluate ──────────┐
//!                 ├─► Transpile ─► erase ─► evaluate ─┤
//!                 ├─► Markup ────► assemble ──────────┼─► ExecutionResult
//!                 └─► Unsupported ────────────────────┘
//! ```

pub mod engine;
pub mod error;
pub mod state;

pub use engine::{Engine, LanguageSwitch};
pub use error::EngineError;
pub use state::ExecutionState;

pub use codepad_core::{
    ExecutionRequest, ExecutionResult, FailureKind, LanguageId, RenderableDocument, SourceBuffers,
};
pub use codepad_preview::{PreviewTarget, PreviewUpdate};
