//! Tracing subscriber configuration for the daemon and applications.
//!
//! Log levels follow these conventions:
//! - ERROR: Invariant violations, failures that stop a process
//! - WARN: Transport failures, dropped or undeliverable messages
//! - INFO: Node start, routes learned, messages delivered
//! - DEBUG: Per-frame protocol decisions, table purges
//! - TRACE: Raw frames

use tracing_subscriber::EnvFilter;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` overrides `default_level` when set.
pub fn init(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .init();
}

/// Initialize the tracing subscriber with JSON output.
///
/// Activated by setting `RUST_LOG_FORMAT=json`.
pub fn init_json(default_level: &str) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_level))
        .init();
}

/// Pick plain or JSON output from `RUST_LOG_FORMAT`.
pub fn init_from_env(default_level: &str) {
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        init_json(default_level);
    } else {
        init(default_level);
    }
}

/// Initialize the tracing subscriber for tests.
///
/// Uses `try_init` to avoid panicking if called multiple times.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("debug"))
        .with_test_writer()
        .try_init();
}
