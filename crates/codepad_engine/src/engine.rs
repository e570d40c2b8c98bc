//! Execution and preview engine

use crate::error::EngineError;
use crate::state::{ExecutionState, StateCell};
use codepad_core::{
    default_buffers, resolve, BufferRole, EngineConfig, ExecutionRequest, ExecutionResult,
    FailureKind, LanguageId, MarkupAssembler, Pipeline, RenderableDocument, SourceBuffers,
};
use codepad_preview::{PreviewScheduler, PreviewTarget, PreviewUpdate};
use codepad_script::{EvalLimits, Evaluator, Transpiler};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// Result of switching an editor to another language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSwitch {
    /// Fresh default buffers for the new language.
    pub buffers: SourceBuffers,
    /// Immediate render for markup mode.
    pub preview: Option<RenderableDocument>,
}

/// Polyglot execution engine
///
/// One engine serves any number of callers; at most one run executes at a
/// time and the rest are turned away with `AlreadyRunning`.
pub struct Engine {
    config: EngineConfig,
    state: StateCell,
    transpiler: Transpiler,
    evaluator: Evaluator,
    assembler: MarkupAssembler,
    scheduler: PreviewScheduler,
}

impl Engine {
    /// Create an engine whose preview timers run on the current tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let handle = Handle::try_current()?;
        Ok(Self::with_handle(config, handle))
    }

    pub fn with_handle(config: EngineConfig, handle: Handle) -> Self {
        let assembler = MarkupAssembler::new(&config.markup);
        let scheduler = PreviewScheduler::from_settings(handle, &config.preview, assembler.clone());
        let evaluator = Evaluator::new(EvalLimits::from(&config.execution));

        tracing::debug!(
            timeout_ms = config.execution.timeout_ms,
            quiet_period_ms = config.preview.quiet_period_ms,
            "engine ready"
        );

        Self {
            config,
            state: StateCell::new(),
            transpiler: Transpiler::new(),
            evaluator,
            assembler,
            scheduler,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> ExecutionState {
        self.state.load()
    }

    /// Run `buffers` as `language`.
    ///
    /// Never panics for classifiable input: every outcome, including
    /// rejection while another run is in flight, comes back as a result.
    pub fn run(&self, language: LanguageId, buffers: &SourceBuffers) -> ExecutionResult {
        let pipeline = resolve(language);
        if !pipeline.is_supported() {
            tracing::info!(language = %language, "no local execution pipeline");
            return ExecutionResult::unsupported(language.id());
        }

        let Some(_running) = self.state.try_begin() else {
            tracing::warn!(language = %language, "run rejected: an execution is already running");
            return ExecutionResult::already_running();
        };

        let started = Instant::now();
        let result = match pipeline {
            Pipeline::Direct => self.evaluate(buffers.text(BufferRole::Program)),
            Pipeline::Transpile => {
                match self.transpiler.transpile(buffers.text(BufferRole::Program)) {
                    Ok(javascript) => self.evaluate(&javascript),
                    Err(error) => ExecutionResult::failure(FailureKind::Transpile, error.to_string()),
                }
            }
            Pipeline::Markup => ExecutionResult::Document(self.preview_now(buffers)),
            Pipeline::Unsupported => ExecutionResult::unsupported(language.id()),
        };

        tracing::info!(
            language = %language,
            elapsed_ms = started.elapsed().as_millis() as u64,
            outcome = outcome_label(&result),
            "run finished"
        );
        result
    }

    /// Run a language given by name; names outside the known set are
    /// reported as unsupported rather than rejected.
    pub fn run_declared(&self, name: &str, buffers: &SourceBuffers) -> ExecutionResult {
        match name.parse::<LanguageId>() {
            Ok(language) => self.run(language, buffers),
            Err(unknown) => {
                tracing::info!("{unknown}");
                ExecutionResult::unsupported(name.trim())
            }
        }
    }

    pub fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        tracing::trace!(
            language = %request.language,
            queued_us = request.invoked_at.elapsed().as_micros() as u64,
            "executing request"
        );
        self.run(request.language, &request.buffers)
    }

    /// Assemble the markup buffers right away, bypassing the debounce.
    pub fn preview_now(&self, buffers: &SourceBuffers) -> RenderableDocument {
        self.assembler.assemble(
            buffers.text(BufferRole::Structure),
            buffers.text(BufferRole::Style),
            buffers.text(BufferRole::Behavior),
        )
    }

    /// Note an edit to `target`'s markup buffers; the debounced render
    /// arrives on [`Engine::subscribe`]. Returns the render's generation.
    pub fn on_edit(&self, target: &PreviewTarget, buffers: &SourceBuffers) -> u64 {
        self.scheduler.schedule(target.clone(), buffers.markup_sources())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreviewUpdate> {
        self.scheduler.subscribe()
    }

    /// Drop `target`'s pending render. Returns whether one was pending.
    pub fn cancel_all(&self, target: &PreviewTarget) -> bool {
        self.scheduler.cancel_all(target)
    }

    pub fn is_preview_pending(&self, target: &PreviewTarget) -> bool {
        self.scheduler.is_pending(target)
    }

    /// Default buffers for `language`. Touches no engine state.
    pub fn reset(&self, language: LanguageId) -> SourceBuffers {
        default_buffers(language)
    }

    /// Point `target` at a new language: its pending render is dropped, its
    /// buffers start over, and markup mode renders immediately.
    pub fn switch_language(&self, target: &PreviewTarget, language: LanguageId) -> LanguageSwitch {
        self.cancel_all(target);
        let buffers = self.reset(language);
        let preview = (resolve(language) == Pipeline::Markup).then(|| self.preview_now(&buffers));
        tracing::debug!(preview = %target, language = %language, "language switched");
        LanguageSwitch { buffers, preview }
    }

    fn evaluate(&self, source: &str) -> ExecutionResult {
        match self.evaluator.evaluate(source) {
            Ok(lines) => ExecutionResult::text(lines),
            Err(error) => ExecutionResult::failure(FailureKind::Runtime, error.message),
        }
    }
}

fn outcome_label(result: &ExecutionResult) -> &'static str {
    match result {
        ExecutionResult::TextOutput { .. } => "text",
        ExecutionResult::Document(_) => "document",
        ExecutionResult::Failure(failure) => match failure.kind {
            FailureKind::Transpile => "transpile_error",
            FailureKind::Runtime => "runtime_error",
            FailureKind::AlreadyRunning => "already_running",
        },
        ExecutionResult::Unsupported { .. } => "unsupported",
    }
}
