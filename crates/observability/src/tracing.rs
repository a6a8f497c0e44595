//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// Initialize tracing/logging for the process from the environment.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(&LogConfig::from_env());
}

/// Initialize tracing/logging with `config`.
pub fn init_with(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    // Already-installed subscribers win; later calls are no-ops.
    let _ = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_with(&LogConfig::default());
        init_with(&LogConfig {
            filter: "debug".to_string(),
            format: LogFormat::Compact,
        });
        init();
    }

    #[test]
    fn invalid_filter_falls_back_without_panicking() {
        init_with(&LogConfig {
            filter: "[[not a directive".to_string(),
            format: LogFormat::Json,
        });
    }
}
