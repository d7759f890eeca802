//! Child process supervision
//!
//! Spawns one command in its own process group, captures stdout and stderr
//! separately, and enforces a wall-clock deadline. On expiry the whole group
//! is killed, not just the direct child.

use crate::error::{EngineError, EngineResult};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

const READ_CHUNK: usize = 8 * 1024;
const TRUNCATION_MARKER: &str = "\n[output truncated]\n";

/// Captured result of one supervised process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.map(|s| s.success()).unwrap_or(false)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis().min(u64::MAX as u128) as u64
    }
}

/// Run `program` with `args` inside `cwd` and wait at most `deadline`
///
/// Output from each stream is capped at `max_output` bytes; the remainder is
/// read and discarded so the child never stalls on a full pipe.
pub async fn run_with_deadline(
    program: &str,
    args: &[String],
    cwd: &Path,
    deadline: Duration,
    max_output: usize,
) -> EngineResult<ProcessOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| EngineError::Launch {
        program: program.to_string(),
        source,
    })?;

    let mut group = ProcessGroup::new(child.id());
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    debug!(program = %program, pid = ?child.id(), "Process launched");

    // Output is only complete once both pipes hit EOF, so the deadline
    // covers draining as well as the exit itself.
    let supervised = async {
        tokio::join!(
            child.wait(),
            capture(stdout, max_output),
            capture(stderr, max_output),
        )
    };

    let outcome = tokio::time::timeout(deadline, supervised).await;

    // Either the deadline fired or the leader exited; in both cases nothing
    // in the group may keep running past this point.
    group.kill();

    let wait_err = |source| EngineError::Wait {
        program: program.to_string(),
        source,
    };

    match outcome {
        Ok((status, stdout, stderr)) => {
            let elapsed = started.elapsed();
            let status = status.map_err(wait_err)?;
            let stdout = stdout.map_err(wait_err)?;
            let stderr = stderr.map_err(wait_err)?;

            debug!(program = %program, ?status, elapsed_ms = elapsed.as_millis() as u64, "Process exited");

            Ok(ProcessOutput {
                stdout,
                stderr,
                status: Some(status),
                timed_out: false,
                elapsed,
            })
        }
        Err(_) => {
            // Reap the leader so it does not linger as a zombie
            let status = child.wait().await.map_err(wait_err)?;
            let elapsed = started.elapsed();

            warn!(
                program = %program,
                deadline_ms = deadline.as_millis() as u64,
                ?status,
                "Process exceeded deadline; process group killed"
            );

            Ok(ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: Some(status),
                timed_out: true,
                elapsed,
            })
        }
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes
async fn capture<R: AsyncRead + Unpin>(reader: Option<R>, limit: usize) -> std::io::Result<String> {
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }

        let room = limit.saturating_sub(kept.len());
        if n > room {
            kept.extend_from_slice(&chunk[..room]);
            truncated = true;
        } else {
            kept.extend_from_slice(&chunk[..n]);
        }
    }

    let mut text = String::from_utf8_lossy(&kept).into_owned();
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }

    Ok(text)
}

/// Kill guard for the process group led by a spawned child
///
/// The child is spawned with `process_group(0)`, so its pid is also the
/// group id and every descendant inherits it unless it calls `setsid`.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    #[cfg(unix)]
    fn kill(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pgid) = self.pgid.take() else {
            return;
        };

        match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            // ESRCH: the group is already empty
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(pgid, error = %e, "Failed to kill process group"),
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) {
        // Only the direct child is tracked here; kill_on_drop covers it
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_streams_separately() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = run_with_deadline(
            "sh",
            &sh("echo err >&2; echo out"),
            dir.path(),
            Duration::from_secs(5),
            1024,
        )
        .await
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_success() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = run_with_deadline("sh", &sh("exit 3"), dir.path(), Duration::from_secs(5), 1024)
            .await
            .unwrap();

        assert!(!output.success());
        assert!(!output.timed_out);
        assert_eq!(output.status.and_then(|s| s.code()), Some(3));
    }

    #[tokio::test]
    async fn test_runs_inside_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = run_with_deadline("sh", &sh("pwd"), dir.path(), Duration::from_secs(5), 1024)
            .await
            .unwrap();

        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_deadline_kills_and_returns_promptly() {
        let dir = tempfile::TempDir::new().unwrap();
        let started = Instant::now();

        let output = run_with_deadline("sh", &sh("sleep 30"), dir.path(), Duration::from_millis(300), 1024)
            .await
            .unwrap();

        assert!(output.timed_out);
        assert!(!output.success());
        assert!(output.stdout.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_backgrounded_child_does_not_hold_result() {
        let dir = tempfile::TempDir::new().unwrap();
        let started = Instant::now();

        // The grandchild keeps stdout open; killing the group releases the pipe
        let output = run_with_deadline(
            "sh",
            &sh("sleep 30 & echo started"),
            dir.path(),
            Duration::from_millis(500),
            1024,
        )
        .await
        .unwrap();

        assert!(output.timed_out);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = run_with_deadline(
            "sh",
            &sh("i=0; while [ $i -lt 200 ]; do echo 0123456789; i=$((i+1)); done"),
            dir.path(),
            Duration::from_secs(5),
            64,
        )
        .await
        .unwrap();

        assert!(output.success());
        assert!(output.stdout.starts_with("0123456789\n"));
        assert!(output.stdout.ends_with(TRUNCATION_MARKER));
        assert_eq!(output.stdout.len(), 64 + TRUNCATION_MARKER.len());
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_with_deadline("coderun-definitely-not-installed", &[], dir.path(), Duration::from_secs(1), 1024)
            .await
            .unwrap_err();

        match err {
            EngineError::Launch { program, .. } => {
                assert_eq!(program, "coderun-definitely-not-installed")
            }
            other => panic!("expected launch error, got {:?}", other),
        }
    }

}
