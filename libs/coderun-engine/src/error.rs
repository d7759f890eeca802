//! Error types for engine operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or supervising an execution.
///
/// None of these leave the engine: [`crate::ExecutionEngine::run`] folds every
/// variant into an `ExecutionResult`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workspace could not be created or the source could not be written.
    #[error("failed to prepare workspace under {root}: {source}")]
    Workspace {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program could not be started (missing binary, permissions).
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child or reading its output failed.
    #[error("failed while supervising `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A profile produced an empty argument list.
    #[error("language profile `{0}` has an empty command")]
    EmptyCommand(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
