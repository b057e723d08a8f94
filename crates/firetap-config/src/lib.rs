//! Shared configuration for firetap tools.
//!
//! A TOML file at the platform config path, overridable through
//! `FIRETAP_*` environment variables, translated into
//! `firetap_core::MonitorConfig` plus the few settings only the binary
//! cares about (storage location, default output format).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use firetap_core::MonitorConfig;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "FIRETAP_CONFIG";

/// Output formats accepted in `defaults.output`.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json", "json-compact", "plain"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    /// Directory holding persisted device history. Defaults to the
    /// platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    /// Reconciliation tuning.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}

impl Config {
    /// Check every value the loaders cannot check structurally.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor
            .validate()
            .map_err(|e| ConfigError::Validation {
                field: "monitor".into(),
                reason: e.to_string(),
            })?;

        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "expected one of {}, got '{}'",
                    OUTPUT_FORMATS.join(", "),
                    self.defaults.output
                ),
            });
        }
        Ok(())
    }

    /// Storage directory, falling back to the platform data directory.
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "firetap", "firetap")
}

/// Resolve the config file path: `$FIRETAP_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location for persisted device history.
pub fn default_storage_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("history"),
        |dirs| dirs.data_dir().join("history"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("firetap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file (missing is fine) + environment.
///
/// Nested keys use a double underscore:
/// `FIRETAP_MONITOR__HISTORY_LIMIT=200`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FIRETAP_").ignore(&["config"]).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
