/// Execution Engine - Abstraction for Code Execution
///
/// **Core Responsibility:**
/// Turn a `(language, source)` pair into captured console output.
///
/// **Request Path:**
/// 1. Resolve the language profile (unknown ids are a normal outcome)
/// 2. Acquire a private workspace and write the source into it
/// 3. Compile, if the profile has a compile step
/// 4. Run under the deadline, killing the whole process group on expiry
/// 5. Release the workspace on every path
///
/// **Critical Architectural Boundary:**
/// - Engine never returns an error to its caller
/// - Every outcome is folded into an `ExecutionResult`
/// - The HTTP layer only renders what it gets back
use crate::error::{EngineError, EngineResult};
use crate::process::{self, ProcessOutput};
use crate::registry::{LanguageProfile, Registry};
use crate::workspace::Workspace;
use async_trait::async_trait;
use coderun_common::types::{ExecutionResult, ExecutionStatus};
use coderun_common::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Execution engine trait
///
/// Any implementation must guarantee:
/// 1. Never panic or error for user-controlled input
/// 2. Respect the run deadline
/// 3. Leave no files or processes behind once `run` returns
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Execute `code` as `language` and return the normalised result
    async fn run(&self, language: &str, code: &str) -> ExecutionResult;

    /// Profiles this engine can execute
    fn registry(&self) -> &Registry;
}

/// Resource limits applied to every execution
#[derive(Debug, Clone)]
pub struct Limits {
    pub run_timeout: Duration,
    pub compile_timeout: Duration,
    pub max_output_bytes: usize,
    pub workspace_root: PathBuf,
}

impl Limits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            run_timeout: Duration::from_millis(config.run_timeout_ms),
            compile_timeout: Duration::from_millis(config.compile_timeout_ms),
            max_output_bytes: config.max_output_bytes,
            workspace_root: config.workspace_root.clone(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(5),
            compile_timeout: Duration::from_secs(30),
            max_output_bytes: 1024 * 1024,
            workspace_root: std::env::temp_dir(),
        }
    }
}

/// Local process execution engine
///
/// Holds the immutable registry and limits; shared by reference across
/// concurrent requests with no interior mutability.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    registry: Registry,
    limits: Limits,
}

impl LocalEngine {
    pub fn new(registry: Registry, limits: Limits) -> Self {
        Self { registry, limits }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Registry::builtin(), Limits::from_config(config))
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Compile (optionally) and run the source already written to `workspace`
    ///
    /// Compile failures and timeouts are results, not errors. Only launch
    /// and supervision failures come back as `Err`.
    pub async fn execute(
        &self,
        profile: &LanguageProfile,
        workspace: &Workspace,
    ) -> EngineResult<ExecutionResult> {
        let mut compile_ms = 0;

        if let Some(compile) = profile.compile {
            let argv = expand(compile, profile, workspace);
            debug!(?argv, "Compiling");

            let output = self
                .spawn(profile, &argv, workspace, self.limits.compile_timeout)
                .await?;
            compile_ms = output.elapsed_ms();

            if output.timed_out {
                return Ok(ExecutionResult::compile_timed_out(compile_ms));
            }
            if !output.success() {
                debug!(status = ?output.status, "Compilation failed");
                return Ok(ExecutionResult::compile_failed(
                    &output.stdout,
                    &output.stderr,
                    compile_ms,
                ));
            }
        }

        let argv = expand(profile.run, profile, workspace);
        debug!(?argv, "Running");

        let output = self
            .spawn(profile, &argv, workspace, self.limits.run_timeout)
            .await?;
        let total_ms = compile_ms + output.elapsed_ms();

        if output.timed_out {
            return Ok(ExecutionResult::timed_out(total_ms));
        }

        Ok(ExecutionResult::completed(&output.stdout, &output.stderr, total_ms))
    }

    async fn spawn(
        &self,
        profile: &LanguageProfile,
        argv: &[String],
        workspace: &Workspace,
        deadline: Duration,
    ) -> EngineResult<ProcessOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| EngineError::EmptyCommand(profile.id.to_string()))?;

        process::run_with_deadline(
            program,
            args,
            workspace.path(),
            deadline,
            self.limits.max_output_bytes,
        )
        .await
    }

    async fn run_profile(&self, profile: &LanguageProfile, code: &str) -> EngineResult<ExecutionResult> {
        let workspace = Workspace::acquire(&self.limits.workspace_root, profile, code)?;
        let result = self.execute(profile, &workspace).await;
        workspace.release();
        result
    }
}

#[async_trait]
impl ExecutionEngine for LocalEngine {
    async fn run(&self, language: &str, code: &str) -> ExecutionResult {
        let run_id = Uuid::new_v4();

        let Some(profile) = self.registry.resolve(language) else {
            info!(%run_id, language, "Language not supported");
            return ExecutionResult::unsupported();
        };

        let span = tracing::info_span!("run", %run_id, language = profile.id);

        async {
            debug!(source_bytes = code.len(), "Starting execution");

            let result = match self.run_profile(profile, code).await {
                Ok(result) => result,
                Err(e @ EngineError::Launch { .. }) => {
                    warn!(error = %e, "Toolchain could not be launched");
                    ExecutionResult::launch_failed(e.to_string())
                }
                Err(e) => {
                    error!(error = %e, "Execution failed unexpectedly");
                    ExecutionResult::internal_fault(e.to_string())
                }
            };

            match result.status {
                ExecutionStatus::Completed | ExecutionStatus::CompileFailed => info!(
                    status = %result.status,
                    execution_time_ms = result.execution_time_ms,
                    "Execution finished"
                ),
                _ => info!(status = %result.status, "Execution finished"),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Substitute workspace paths into a command template
fn expand(template: &[&str], profile: &LanguageProfile, workspace: &Workspace) -> Vec<String> {
    let source = workspace.source_path().to_string_lossy();
    let artifact = workspace.artifact_path().to_string_lossy();
    let dir = workspace.path().to_string_lossy();

    template
        .iter()
        .map(|arg| {
            arg.replace("{source}", &source)
                .replace("{artifact}", &artifact)
                .replace("{dir}", &dir)
                .replace("{stem}", profile.file_stem)
        })
        .collect()
}
