//! Tracing subscriber setup for the web binary.
//!
//! Environment variables:
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
//!   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//!   RUST_LOG    - standard env filter (default: `memora_core::defaults::LOG_FILTER`)

use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memora_core::defaults::{LOG_FILE_NAME, LOG_FILTER};

/// Logging options read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: String,
    pub file: Option<String>,
    pub ansi: Option<bool>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            format: lookup("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            file: lookup("LOG_FILE").filter(|f| !f.is_empty()),
            ansi: lookup("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }

    fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process when file logging is enabled.
pub fn init(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = settings.file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(LOG_FILE_NAME);
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if settings.is_json() {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless forced
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(settings.ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if settings.is_json() {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = settings.ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %settings.format,
        log_file = settings.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LogSettings::from_lookup(|_| None);
        assert_eq!(settings.format, "text");
        assert!(settings.file.is_none());
        assert!(settings.ansi.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = LogSettings::from_lookup(|name| match name {
            "LOG_FORMAT" => Some("json".to_string()),
            "LOG_FILE" => Some("/var/log/memora/web.log".to_string()),
            "LOG_ANSI" => Some("1".to_string()),
            _ => None,
        });
        assert!(settings.is_json());
        assert_eq!(settings.file.as_deref(), Some("/var/log/memora/web.log"));
        assert_eq!(settings.ansi, Some(true));
    }

    #[test]
    fn test_empty_log_file_means_stdout() {
        let settings = LogSettings::from_lookup(|name| match name {
            "LOG_FILE" => Some(String::new()),
            _ => None,
        });
        assert!(settings.file.is_none());
    }
}
