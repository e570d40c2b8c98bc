//! Codepad Core
//!
//! Shared data model for the execution and preview engine:
//! - Language identifiers and pipeline dispatch
//! - Source buffers and execution requests/results
//! - Markup assembly (structure + style + behavior)
//! - Engine configuration and default buffers

pub mod buffers;
pub mod config;
pub mod defaults;
pub mod language;
pub mod markup;
pub mod result;

pub use buffers::{BufferRole, ExecutionRequest, SourceBuffer, SourceBuffers};
pub use config::{ConfigError, EngineConfig};
pub use language::{resolve, LanguageId, Pipeline, UnknownLanguage};
pub use defaults::default_buffers;
pub use markup::{
    MarkupAssembler, MarkupSources, PreviewViewport, RenderableDocument, SurfacePolicy,
    UnknownViewport,
};
pub use result::{ExecutionFailure, ExecutionResult, FailureKind, NO_OUTPUT_PLACEHOLDER};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
