//! Configuration loading and catalog credential resolution
//!
//! Settings come from three places, highest priority first:
//! 1. Command-line arguments (applied by the binary on top of [`TomlConfig`])
//! 2. Environment variables
//! 3. TOML config file
//!
//! A missing config file is never fatal: the compiled defaults are used and a
//! warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the Trakt client id
pub const CLIENT_ID_ENV_VAR: &str = "VIEWLOG_TRAKT_CLIENT_ID";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV_VAR: &str = "VIEWLOG_CONFIG";

/// Trakt client ids are 64 hex characters
const CLIENT_ID_LENGTH: usize = 64;

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Trakt API client id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt_client_id: Option<String>,
    /// Directory receiving the three output files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Reconciliation run settings
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub level: String,
    /// Optional file receiving a copy of the log output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

/// `[analyzer]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Concurrent workers reconciling and writing records
    pub workers: usize,
    /// Concurrent catalog lookups while resolving distinct entities
    pub lookup_concurrency: usize,
    /// Ceiling on the time spent draining the worker pool
    pub drain_timeout_secs: u64,
    /// Client-side catalog request budget
    pub requests_per_second: u32,
    /// Episode title matches are accepted below this edit distance
    pub match_threshold: usize,
    /// Output field delimiter
    pub delimiter: String,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            workers: 15,
            lookup_concurrency: 8,
            drain_timeout_secs: 300,
            requests_per_second: 3,
            match_threshold: 5,
            delimiter: ";".to_string(),
        }
    }
}

/// Locate the default config file for the platform
///
/// Linux checks `~/.config/viewlog/config.toml` first, then `/etc/viewlog/config.toml`.
/// Returns `None` when neither exists.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("viewlog").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/viewlog/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load the TOML configuration
///
/// An explicitly requested file must exist and parse. Otherwise the file named by
/// `VIEWLOG_CONFIG` or the platform default is used, falling back to defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return read_toml_config(path);
    }

    let candidate = std::env::var(CONFIG_PATH_ENV_VAR)
        .ok()
        .map(PathBuf::from)
        .or_else(default_config_path);

    match candidate {
        Some(path) if path.exists() => read_toml_config(&path),
        Some(path) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(TomlConfig::default())
        }
        None => {
            warn!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Write the configuration atomically (temp file + rename)
///
/// On Unix the file is restricted to the owner (0600) since it holds the client id.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Resolve the Trakt client id
///
/// **Priority:** CLI → ENV → TOML
pub fn resolve_client_id(cli_value: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_value = std::env::var(CLIENT_ID_ENV_VAR).ok();
    let toml_value = toml_config.trakt_client_id.as_deref();

    let candidates = [
        ("command line", cli_value),
        ("environment", env_value.as_deref()),
        ("TOML", toml_value),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, value)| value.map(|v| !v.trim().is_empty()).unwrap_or(false))
        .map(|(source, _)| *source)
        .collect();

    if sources.len() > 1 {
        warn!(
            "Trakt client id found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, value) in candidates {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };

        if !is_valid_client_id(value) {
            return Err(Error::Config(format!(
                "Trakt client id from {} does not have the expected length of {} characters",
                source, CLIENT_ID_LENGTH
            )));
        }

        info!("Trakt client id loaded from {}", source);
        return Ok(value.to_string());
    }

    Err(Error::Config(format!(
        "Trakt client id not configured. Please configure using one of:\n\
         1. Command line: --client-id <id>\n\
         2. Environment: {}=<id>\n\
         3. TOML config: ~/.config/viewlog/config.toml (trakt_client_id = \"<id>\")\n\
         \n\
         Create an API application at: https://trakt.tv/oauth/applications",
        CLIENT_ID_ENV_VAR
    )))
}

/// Validate a client id (64 characters, no whitespace)
pub fn is_valid_client_id(key: &str) -> bool {
    key.chars().count() == CLIENT_ID_LENGTH && !key.chars().any(char::is_whitespace)
}
