use std::env;
use std::path::PathBuf;

/// Application configuration
/// Provides defaults with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub run_timeout_ms: u64,
    pub compile_timeout_ms: u64,
    pub max_output_bytes: usize,
    pub workspace_root: PathBuf,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: positive_var("PORT").unwrap_or(5000),
            run_timeout_ms: positive_var("RUN_TIMEOUT_MS").unwrap_or(5000),
            compile_timeout_ms: positive_var("COMPILE_TIMEOUT_MS").unwrap_or(30000),
            max_output_bytes: positive_var("MAX_OUTPUT_BYTES").unwrap_or(1024 * 1024),
            workspace_root: env::var_os("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn new() -> Self {
        Self::from_env()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// Zero would mean an instant timeout, an always-truncated output or a random port
fn positive_var<T: std::str::FromStr + PartialOrd + Default>(name: &str) -> Option<T> {
    parse_var(name).filter(|v: &T| *v > T::default())
}
