//! Source buffers and execution requests

use crate::language::LanguageId;
use crate::markup::MarkupSources;
use std::time::Instant;

/// Role a buffer plays in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// Single-file program (script languages)
    Program,
    /// Markup document (`index.html`)
    Structure,
    /// Stylesheet (`styles.css`)
    Style,
    /// Script attached to the markup (`script.js`)
    Behavior,
}

impl BufferRole {
    /// File name the editor shows for this buffer.
    pub fn file_name(self) -> &'static str {
        match self {
            BufferRole::Program => "main",
            BufferRole::Structure => "index.html",
            BufferRole::Style => "styles.css",
            BufferRole::Behavior => "script.js",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    pub role: BufferRole,
    pub text: String,
}

/// Snapshot of the caller's buffers for one call.
///
/// Each role appears at most once. A role that was never set reads as an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBuffers {
    buffers: Vec<SourceBuffer>,
}

impl SourceBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers for a single-file program.
    pub fn program(text: impl Into<String>) -> Self {
        Self::new().with(BufferRole::Program, text)
    }

    /// Buffers for markup mode.
    pub fn markup(
        structure: impl Into<String>,
        style: impl Into<String>,
        behavior: impl Into<String>,
    ) -> Self {
        Self::new()
            .with(BufferRole::Structure, structure)
            .with(BufferRole::Style, style)
            .with(BufferRole::Behavior, behavior)
    }

    /// Set (or replace) the buffer for `role`.
    pub fn with(mut self, role: BufferRole, text: impl Into<String>) -> Self {
        self.set(role, text);
        self
    }

    pub fn set(&mut self, role: BufferRole, text: impl Into<String>) {
        let text = text.into();
        match self.buffers.iter_mut().find(|buffer| buffer.role == role) {
            Some(buffer) => buffer.text = text,
            None => self.buffers.push(SourceBuffer { role, text }),
        }
    }

    pub fn get(&self, role: BufferRole) -> Option<&str> {
        self.buffers
            .iter()
            .find(|buffer| buffer.role == role)
            .map(|buffer| buffer.text.as_str())
    }

    /// Text for `role`, empty when absent.
    pub fn text(&self, role: BufferRole) -> &str {
        self.get(role).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceBuffer> {
        self.buffers.iter()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Owned copy of the three markup roles.
    pub fn markup_sources(&self) -> MarkupSources {
        MarkupSources {
            structure: self.text(BufferRole::Structure).to_string(),
            style: self.text(BufferRole::Style).to_string(),
            behavior: self.text(BufferRole::Behavior).to_string(),
        }
    }
}

/// One explicit run request.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub language: LanguageId,
    pub buffers: SourceBuffers,
    pub invoked_at: Instant,
}

impl ExecutionRequest {
    pub fn new(language: LanguageId, buffers: SourceBuffers) -> Self {
        Self {
            language,
            buffers,
            invoked_at: Instant::now(),
        }
    }
}
