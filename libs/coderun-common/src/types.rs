use serde::{Deserialize, Serialize};
use std::fmt;

/// Substituted for output that is empty after trimming
pub const NO_OUTPUT: &str = "No output";

/// Returned for any language id the registry does not know
pub const UNSUPPORTED_MESSAGE: &str = "This language is not supported yet.";

/// Returned in place of partial output when the run deadline expires
pub const TIMEOUT_MESSAGE: &str = "Error: Code took too long to run (timeout)";

/// Returned when the compile deadline expires
pub const COMPILE_TIMEOUT_MESSAGE: &str = "Error: Compilation took too long (timeout)";

/// Returned by the orchestrator for missing or empty inputs
pub const MISSING_INPUT_MESSAGE: &str = "Error: No code or language provided";

/// Prefix marking problems on our side rather than in the submitted program
pub const SERVER_ERROR_PREFIX: &str = "Server Error: ";

/// Incoming run request
///
/// Both fields are optional at the wire level so the orchestrator can
/// reject missing values with the same message as empty ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl RunRequest {
    /// Returns `(language, code)` when both are present and non-empty
    pub fn validated(self) -> Option<(String, String)> {
        match (self.language, self.code) {
            (Some(language), Some(code)) if !language.is_empty() && !code.is_empty() => {
                Some((language, code))
            }
            _ => None,
        }
    }
}

/// Outgoing response body, identical for every outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub output: String,
}

/// Execution State Machine (terminal states)
/// Every request ends in exactly one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    CompileFailed,
    TimedOut,
    LaunchFailed,
    Unsupported,
    InternalFault,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::CompileFailed => "compile_failed",
            ExecutionStatus::TimedOut => "timed_out",
            ExecutionStatus::LaunchFailed => "launch_failed",
            ExecutionStatus::Unsupported => "unsupported",
            ExecutionStatus::InternalFault => "internal_fault",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution Output
/// Produced once per request by the engine, rendered to text by the caller
///
/// ## Output Semantics:
/// - combined_output: stdout followed by stderr, never interleaved
/// - empty (after trim) output is replaced by [`NO_OUTPUT`]
/// - timed_out results never carry partial output
/// - execution_error is set for launch failures and internal faults only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub combined_output: String,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<String>,
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    pub fn completed(stdout: &str, stderr: &str, execution_time_ms: u64) -> Self {
        Self::with_output(ExecutionStatus::Completed, combine_output(stdout, stderr), execution_time_ms)
    }

    pub fn compile_failed(stdout: &str, stderr: &str, execution_time_ms: u64) -> Self {
        Self::with_output(
            ExecutionStatus::CompileFailed,
            combine_output(stdout, stderr),
            execution_time_ms,
        )
    }

    pub fn compile_timed_out(execution_time_ms: u64) -> Self {
        Self::with_output(
            ExecutionStatus::CompileFailed,
            COMPILE_TIMEOUT_MESSAGE.to_string(),
            execution_time_ms,
        )
    }

    pub fn timed_out(execution_time_ms: u64) -> Self {
        Self {
            status: ExecutionStatus::TimedOut,
            combined_output: String::new(),
            timed_out: true,
            execution_error: None,
            execution_time_ms,
        }
    }

    pub fn unsupported() -> Self {
        Self::with_output(ExecutionStatus::Unsupported, String::new(), 0)
    }

    pub fn launch_failed(error: impl Into<String>) -> Self {
        Self::with_error(ExecutionStatus::LaunchFailed, error.into())
    }

    pub fn internal_fault(error: impl Into<String>) -> Self {
        Self::with_error(ExecutionStatus::InternalFault, error.into())
    }

    fn with_output(status: ExecutionStatus, combined_output: String, execution_time_ms: u64) -> Self {
        Self {
            status,
            combined_output,
            timed_out: false,
            execution_error: None,
            execution_time_ms,
        }
    }

    fn with_error(status: ExecutionStatus, error: String) -> Self {
        Self {
            status,
            combined_output: String::new(),
            timed_out: false,
            execution_error: Some(error),
            execution_time_ms: 0,
        }
    }

    /// Render the user-facing text for this result
    pub fn output(&self) -> String {
        match self.status {
            ExecutionStatus::Completed | ExecutionStatus::CompileFailed => {
                self.combined_output.clone()
            }
            ExecutionStatus::TimedOut => TIMEOUT_MESSAGE.to_string(),
            ExecutionStatus::Unsupported => UNSUPPORTED_MESSAGE.to_string(),
            ExecutionStatus::LaunchFailed | ExecutionStatus::InternalFault => format!(
                "{}{}",
                SERVER_ERROR_PREFIX,
                self.execution_error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    pub fn into_response(self) -> RunResponse {
        RunResponse {
            output: self.output(),
        }
    }
}

/// Concatenate stdout and stderr in that fixed order
pub fn combine_output(stdout: &str, stderr: &str) -> String {
    let mut combined = String::with_capacity(stdout.len() + stderr.len());
    combined.push_str(stdout);
    combined.push_str(stderr);

    if combined.trim().is_empty() {
        NO_OUTPUT.to_string()
    } else {
        combined
    }
}
