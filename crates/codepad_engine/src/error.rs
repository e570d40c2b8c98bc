//! Engine construction errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("live preview needs a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
