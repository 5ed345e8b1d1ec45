//! Structured logging configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "warn";

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "intellitab=debug,info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to pretty output.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// `[logging]` section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Append log lines to this file instead of stderr.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directives.
    pub filter: Option<String>,
}

impl LoggingSettings {
    /// The configured format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.format.as_deref().map_or_else(LogFormat::default, LogFormat::parse)
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Optional log file.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directives.
    pub filter: String,
}

impl LoggingConfig {
    /// Resolves settings against the process environment.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |name| std::env::var(name).ok())
    }

    /// Resolves settings against `lookup`.
    ///
    /// Filter precedence: `INTELLITAB_LOG`, `RUST_LOG`, `--verbose`, the
    /// config file, then [`DEFAULT_FILTER`]. Format precedence:
    /// `INTELLITAB_LOG_FORMAT`, then the config file.
    #[must_use]
    pub fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let filter = get("INTELLITAB_LOG")
            .or_else(|| get("RUST_LOG"))
            .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = get("INTELLITAB_LOG_FORMAT").map_or_else(
            || settings.map(LoggingSettings::log_format).unwrap_or_default(),
            |v| LogFormat::parse(&v),
        );

        Self {
            format,
            file: settings.and_then(|s| s.file.clone()),
            filter,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            file: None,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("json", LogFormat::Json ; "json")]
    #[test_case(" JSON ", LogFormat::Json ; "case and whitespace")]
    #[test_case("pretty", LogFormat::Pretty ; "pretty")]
    #[test_case("xml", LogFormat::Pretty ; "unknown falls back")]
    fn test_parse_format(input: &str, expected: LogFormat) {
        assert_eq!(LogFormat::parse(input), expected);
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::resolve(None, false, |_| None);
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_env_beats_verbose_beats_file() {
        let settings = LoggingSettings {
            format: Some("json".to_string()),
            file: Some(PathBuf::from("/tmp/it.log")),
            filter: Some("error".to_string()),
        };

        let from_file = LoggingConfig::resolve(Some(&settings), false, |_| None);
        assert_eq!(from_file.filter, "error");
        assert_eq!(from_file.format, LogFormat::Json);
        assert_eq!(from_file.file, Some(PathBuf::from("/tmp/it.log")));

        let verbose = LoggingConfig::resolve(Some(&settings), true, |_| None);
        assert_eq!(verbose.filter, VERBOSE_FILTER);

        let env = LoggingConfig::resolve(Some(&settings), true, |name| match name {
            "RUST_LOG" => Some("trace".to_string()),
            "INTELLITAB_LOG_FORMAT" => Some("pretty".to_string()),
            _ => None,
        });
        assert_eq!(env.filter, "trace");
        assert_eq!(env.format, LogFormat::Pretty);
    }
}
