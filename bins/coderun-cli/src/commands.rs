// CLI commands for coderun
use anyhow::{bail, Context, Result};
use coderun_common::Config;
use coderun_engine::{ExecutionEngine, LanguageProfile, LocalEngine, Registry};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Load source from a file or inline argument
pub fn read_source(file: Option<&Path>, code: Option<String>) -> Result<String> {
    let code = match (file, code) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(code)) => code,
        (None, None) => bail!("Provide either --file or --code"),
    };

    if code.is_empty() {
        bail!("Source code cannot be empty");
    }

    Ok(code)
}

/// Run code through the local engine and print its output
pub async fn run(language: &str, code: &str, json: bool) -> Result<()> {
    let engine = LocalEngine::from_config(&Config::from_env());
    let result = engine.run(language, code).await;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .context("Failed to serialize execution result")?;
        println!("{}", rendered);
    } else {
        print!("{}", result.output());
        if !result.output().ends_with('\n') {
            println!();
        }
    }

    Ok(())
}

/// Print the language table
pub fn list_languages() {
    let registry = Registry::builtin();

    println!("Supported Languages:\n");
    println!("{:<12} {:<10} {:<40} {:<30}", "ID", "EXT", "COMPILE", "RUN");
    println!("{}", "─".repeat(92));

    for profile in registry.profiles() {
        let compile = profile
            .compile
            .map(|argv| argv.join(" "))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<12} {:<10} {:<40} {:<30}",
            profile.id,
            profile.extension,
            compile,
            profile.run.join(" ")
        );
    }

    println!("\n✓ Total: {} language(s)", registry.profiles().len());
}

/// Probe each profile's toolchain; returns the number of languages missing one
pub fn check_toolchains() -> usize {
    let registry = Registry::builtin();
    let mut missing = 0;

    println!("Checking language toolchains:\n");

    for profile in registry.profiles() {
        let absent = missing_programs(profile);
        if absent.is_empty() {
            println!("  ✓ {:<12} {}", profile.id, profile.toolchain().join(", "));
        } else {
            missing += 1;
            println!("  ✗ {:<12} missing: {}", profile.id, absent.join(", "));
        }
    }

    println!();
    if missing == 0 {
        println!("✓ All toolchains available");
    } else {
        println!("✗ {} language(s) will fail with a server error until installed", missing);
    }

    missing
}

fn missing_programs(profile: &LanguageProfile) -> Vec<&'static str> {
    profile
        .toolchain()
        .into_iter()
        .filter(|program| !program_available(program))
        .collect()
}

fn program_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
