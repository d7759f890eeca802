//! End-to-end runs against the real toolchains
//!
//! Each test skips itself when the toolchain is not installed on the host.

use coderun_common::types::{ExecutionStatus, NO_OUTPUT, TIMEOUT_MESSAGE, UNSUPPORTED_MESSAGE};
use coderun_engine::{ExecutionEngine, Limits, LocalEngine, Registry};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn installed(language: &str) -> bool {
    let registry = Registry::builtin();
    let Some(profile) = registry.resolve(language) else {
        return false;
    };

    let available = profile.toolchain().iter().all(|program| {
        Command::new(program)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    });

    if !available {
        eprintln!("Test skipped: toolchain for {} not installed", language);
    }
    available
}

fn engine(root: &Path) -> LocalEngine {
    LocalEngine::new(
        Registry::builtin(),
        Limits {
            workspace_root: root.to_path_buf(),
            ..Limits::default()
        },
    )
}

fn assert_clean(root: &Path) {
    assert_eq!(std::fs::read_dir(root).unwrap().count(), 0);
}

#[tokio::test]
async fn python_prints_hi() {
    if !installed("python") {
        return;
    }
    let root = TempDir::new().unwrap();

    let result = engine(root.path()).run("python", "print('hi')").await;

    assert_eq!(result.output(), "hi\n");
    assert_clean(root.path());
}

#[tokio::test]
async fn python_busy_loop_times_out() {
    if !installed("python") {
        return;
    }
    let root = TempDir::new().unwrap();
    let started = Instant::now();

    let result = engine(root.path()).run("python", "while True: pass").await;

    assert_eq!(result.output(), TIMEOUT_MESSAGE);
    assert!(started.elapsed() < Duration::from_secs(7));
    assert_clean(root.path());
}

#[tokio::test]
async fn python_traceback_is_output() {
    if !installed("python") {
        return;
    }
    let root = TempDir::new().unwrap();

    let result = engine(root.path())
        .run("python", "print('before')\nraise ValueError('boom')")
        .await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    let output = result.output();
    assert!(output.starts_with("before\n"));
    assert!(output.contains("ValueError: boom"));
}

#[tokio::test]
async fn python_silent_program() {
    if !installed("python") {
        return;
    }
    let root = TempDir::new().unwrap();

    let result = engine(root.path()).run("python", "x = 1").await;

    assert_eq!(result.output(), NO_OUTPUT);
}

#[tokio::test]
async fn javascript_prints() {
    if !installed("javascript") {
        return;
    }
    let root = TempDir::new().unwrap();

    let result = engine(root.path())
        .run("javascript", "console.log('Hello from JavaScript')")
        .await;

    assert_eq!(result.output(), "Hello from JavaScript\n");
    assert_clean(root.path());
}

#[tokio::test]
async fn c_compiles_and_runs() {
    if !installed("c") {
        return;
    }
    let root = TempDir::new().unwrap();
    let code = "#include <stdio.h>\nint main() { printf(\"Hello from C\\n\"); return 0; }\n";

    let result = engine(root.path()).run("c", code).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.output(), "Hello from C\n");
    assert_clean(root.path());
}

#[tokio::test]
async fn c_syntax_error_is_compile_failure() {
    if !installed("c") {
        return;
    }
    let root = TempDir::new().unwrap();

    let result = engine(root.path()).run("c", "int main( { return 0 }").await;

    assert_eq!(result.status, ExecutionStatus::CompileFailed);
    assert!(result.output().contains("error"));
    assert_clean(root.path());
}

#[tokio::test]
async fn cpp_compiles_and_runs() {
    if !installed("cpp") {
        return;
    }
    let root = TempDir::new().unwrap();
    let code = "#include <iostream>\nint main() { std::cout << \"Hello from C++\" << std::endl; }\n";

    let result = engine(root.path()).run("cpp", code).await;

    assert_eq!(result.output(), "Hello from C++\n");
    assert_clean(root.path());
}

#[tokio::test]
async fn java_runs_main_class() {
    if !installed("java") {
        return;
    }
    let root = TempDir::new().unwrap();
    let code = "class Main {\n  public static void main(String[] args) {\n    System.out.println(\"Hello from Java\");\n  }\n}\n";

    let result = engine(root.path()).run("java", code).await;

    assert_eq!(result.output(), "Hello from Java\n");
    assert_clean(root.path());
}

#[tokio::test]
async fn java_compile_error_never_runs() {
    if !installed("java") {
        return;
    }
    let root = TempDir::new().unwrap();

    let result = engine(root.path())
        .run("java", "class Main { void broken( }")
        .await;

    assert_eq!(result.status, ExecutionStatus::CompileFailed);
    assert!(result.output().contains("Main.java"));
    assert_clean(root.path());
}

#[tokio::test]
async fn ruby_is_not_supported() {
    let root = TempDir::new().unwrap();

    let result = engine(root.path()).run("ruby", "puts 1").await;

    assert_eq!(result.output(), UNSUPPORTED_MESSAGE);
    assert_clean(root.path());
}
