//! Configuration management.
//!
//! Settings come from a TOML file, then environment variables override
//! individual fields:
//!
//! ```toml
//! data_dir = "/home/me/.local/share/intellitab"
//! tabs_file = "/home/me/window.json"
//!
//! [llm]
//! endpoint = "https://api.groq.com/openai/v1"
//! model = "llama-3.3-70b-versatile"
//! timeout_ms = 30000
//!
//! [logging]
//! format = "json"
//! file = "/tmp/intellitab.log"
//! ```

use crate::observability::LoggingSettings;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "INTELLITAB_CONFIG_PATH";

/// Main configuration for intellitab.
#[derive(Debug, Clone)]
pub struct IntellitabConfig {
    /// Directory holding the persisted key-value store.
    pub data_dir: PathBuf,
    /// Window snapshot file used as the tab host, `data_dir/window.json` when unset.
    pub tabs_file: Option<PathBuf>,
    /// Reasoning service configuration.
    pub llm: LlmConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Reasoning service configuration.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Chat-completions base URL.
    pub endpoint: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Credential used when none has been stored.
    pub api_key: Option<SecretString>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Window snapshot file.
    pub tabs_file: Option<String>,
    /// LLM configuration.
    pub llm: Option<ConfigFileLlm>,
    /// Logging configuration.
    pub logging: Option<LoggingSettings>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLlm {
    /// Base URL.
    pub endpoint: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for IntellitabConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tabs_file: None,
            llm: LlmConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl IntellitabConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from an explicit path, `INTELLITAB_CONFIG_PATH`,
    /// or the default locations, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/intellitab/` on macOS)
    /// 2. XDG config dir (`~/.config/intellitab/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("intellitab").join("config.toml");
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("intellitab")
            .join("config.toml");

        for candidate in [platform_config, xdg_config] {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(error = %e, "Ignoring unreadable config file"),
            }
        }

        Self::default()
    }

    /// Applies environment overrides read through `lookup`.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("INTELLITAB_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = get("INTELLITAB_API_KEY") {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(endpoint) = get("INTELLITAB_LLM_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Some(model) = get("INTELLITAB_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(ms) = get("INTELLITAB_LLM_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            self.llm.timeout_ms = Some(ms);
        }
        if let Some(ms) =
            get("INTELLITAB_LLM_CONNECT_TIMEOUT_MS").and_then(|v| v.trim().parse().ok())
        {
            self.llm.connect_timeout_ms = Some(ms);
        }
        self
    }

    /// Converts a `ConfigFile` to `IntellitabConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        config.tabs_file = file.tabs_file.map(PathBuf::from);
        if let Some(llm) = file.llm {
            config.llm = LlmConfig {
                endpoint: llm.endpoint,
                model: llm.model,
                api_key: llm
                    .api_key
                    .filter(|k| !k.trim().is_empty())
                    .map(SecretString::from),
                timeout_ms: llm.timeout_ms,
                connect_timeout_ms: llm.connect_timeout_ms,
            };
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// The window snapshot file.
    #[must_use]
    pub fn tabs_path(&self) -> PathBuf {
        self.tabs_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("window.json"))
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "intellitab").map_or_else(
        || PathBuf::from(".intellitab"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::LogFormat;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_from_file() {
        let (_dir, path) = write_config(
            r#"
data_dir = "/var/lib/intellitab"

[llm]
model = "llama-3.1-8b-instant"
api_key = "gsk_file"
timeout_ms = 5000

[logging]
format = "json"
"#,
        );

        let config = IntellitabConfig::load_from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/intellitab"));
        assert_eq!(config.tabs_path(), PathBuf::from("/var/lib/intellitab/window.json"));
        assert_eq!(config.llm.model.as_deref(), Some("llama-3.1-8b-instant"));
        assert_eq!(config.llm.timeout_ms, Some(5000));
        assert_eq!(
            config.llm.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("gsk_file".to_string())
        );
        assert_eq!(config.logging.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let (_dir, path) = write_config("colour = \"blue\"\n");
        assert!(IntellitabConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = IntellitabConfig::load_from_file(Path::new("/nonexistent/intellitab.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("read_config_file"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("INTELLITAB_DATA_DIR", "/tmp/it"),
            ("INTELLITAB_API_KEY", "gsk_env"),
            ("INTELLITAB_LLM_MODEL", "mixtral"),
            ("INTELLITAB_LLM_TIMEOUT_MS", "not a number"),
            ("INTELLITAB_LLM_CONNECT_TIMEOUT_MS", " 750 "),
            ("INTELLITAB_LLM_ENDPOINT", ""),
        ]
        .into_iter()
        .collect();

        let config = IntellitabConfig::new()
            .with_env_overrides(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/it"));
        assert!(config.llm.api_key.is_some());
        assert_eq!(config.llm.model.as_deref(), Some("mixtral"));
        assert_eq!(config.llm.timeout_ms, None);
        assert_eq!(config.llm.connect_timeout_ms, Some(750));
        assert_eq!(config.llm.endpoint, None);
    }

    #[test]
    fn test_blank_api_key_in_file_is_unset() {
        let (_dir, path) = write_config("[llm]\napi_key = \"  \"\n");
        let config = IntellitabConfig::load_from_file(&path).unwrap();
        assert!(config.llm.api_key.is_none());
    }
}
