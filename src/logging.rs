//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and files
//! for debugging interleaved async step executions and freeze evaluations.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let log_dir = PathBuf::from("log");
        if !log_dir.exists() {
            fs::create_dir_all(&log_dir).expect("Failed to create log directory");
        }

        // Log file name carries environment, PID, and timestamp so concurrent
        // engine processes never share a file
        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(EnvFilter::new(log_level.clone())),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(log_level)),
            );

        // A global subscriber may already be installed by an embedding host;
        // that is not an error
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "Structured logging initialized with file output"
        );

        // The guard must outlive the process for the non-blocking writer to flush
        std::mem::forget(guard);
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("ROLLOUT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for step operations
pub fn log_step_operation(
    operation: &str,
    execution_id: &str,
    step_id: Option<&str>,
    step_name: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        execution_id = %execution_id,
        step_id = step_id,
        step_name = step_name,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "STEP_OPERATION"
    );
}

/// Log structured data for freeze evaluations
pub fn log_freeze_evaluation(
    account_id: &str,
    org_id: Option<&str>,
    project_id: Option<&str>,
    active_count: usize,
    details: Option<&str>,
) {
    tracing::info!(
        account_id = %account_id,
        org_id = org_id,
        project_id = project_id,
        active_count = active_count,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "FREEZE_EVALUATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
