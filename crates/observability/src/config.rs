//! Logging configuration read from environment variables.
//!
//! - `TRADELINK_LOG`: filter directive (falls back to `RUST_LOG`, then `info`).
//! - `TRADELINK_LOG_FORMAT`: `json` (default) or `compact`.

pub const FILTER_VAR: &str = "TRADELINK_LOG";
pub const FORMAT_VAR: &str = "TRADELINK_LOG_FORMAT";
pub const FALLBACK_FILTER_VAR: &str = "RUST_LOG";

const DEFAULT_FILTER: &str = "info";

/// Output format of log lines.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let filter = lookup(FILTER_VAR)
            .or_else(|| lookup(FALLBACK_FILTER_VAR))
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = lookup(FORMAT_VAR)
            .and_then(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        Self { filter, format }
    }
}
