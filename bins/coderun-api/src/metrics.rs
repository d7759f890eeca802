// Prometheus metrics for the coderun API

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use tracing::warn;

lazy_static! {
    // Global registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Runs accepted for execution (counter with language label)
    pub static ref RUNS_SUBMITTED: CounterVec = CounterVec::new(
        Opts::new("coderun_runs_submitted_total", "Total number of runs submitted"),
        &["language"]
    )
    .expect("metric can be created");

    // Runs finished (counter with language and status labels)
    pub static ref RUNS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("coderun_runs_completed_total", "Total number of runs completed"),
        &["language", "status"]
    )
    .expect("metric can be created");

    // Compile + run wall time (in milliseconds)
    pub static ref RUN_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "coderun_run_duration_ms",
            "Run wall time in milliseconds"
        )
        .buckets(vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]),
        &["language"]
    )
    .expect("metric can be created");

    // Requests rejected before reaching the engine
    pub static ref RUNS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("coderun_runs_rejected_total", "Total runs rejected due to validation"),
        &["reason"]
    )
    .expect("metric can be created");
}

/// Initialize metrics registry
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RUNS_SUBMITTED.clone()),
        Box::new(RUNS_COMPLETED.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(RUNS_REJECTED.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            warn!("Failed to register metric collector: {}", e);
        }
    }
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Record run submission
pub fn record_run_submitted(language: &str) {
    RUNS_SUBMITTED.with_label_values(&[language]).inc();
}

/// Record run rejection
pub fn record_run_rejected(reason: &str) {
    RUNS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record run completion
pub fn record_run_completed(language: &str, status: &str, execution_time_ms: f64) {
    RUNS_COMPLETED.with_label_values(&[language, status]).inc();
    RUN_DURATION.with_label_values(&[language]).observe(execution_time_ms);
}
