//! Tracing/logging setup shared by tradelink consumers.

/// Environment-driven logging configuration.
pub mod config;

/// Tracing subscriber installation.
pub mod tracing;

pub use config::{LogConfig, LogFormat};

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize process-wide logging from an explicit configuration.
pub fn init_with(config: &LogConfig) {
    tracing::init_with(config);
}
