pub mod types;
pub mod config;

// Re-export commonly used types for convenience
pub use types::{ExecutionResult, ExecutionStatus, RunRequest, RunResponse};
pub use config::Config;
