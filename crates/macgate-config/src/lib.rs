//! Configuration for the macgate engine and CLI.
//!
//! A TOML file in the platform config directory, layered with `MACGATE_`
//! environment variables, translated into `macgate_core::GateConfig` plus
//! the location of the list store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use macgate_core::{BootstrapDevice, GateConfig, MacAddress};

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
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// List store location. Defaults to `gate.json` in the data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// CLI presentation defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Engine capacities and timers.
    #[serde(default)]
    pub gate: GateSettings,

    /// Devices placed on the allow list at every start.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bootstrap: Vec<BootstrapDevice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// `[gate]` table. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GateSettings {
    pub allow_capacity: usize,
    pub deny_capacity: usize,
    pub pending_capacity: usize,
    pub pending_ttl_secs: u64,
    pub connected_capacity: usize,
    pub log_capacity: usize,
    pub sweep_interval_secs: u64,
    pub signal_refresh_secs: u64,
}

impl Default for GateSettings {
    fn default() -> Self {
        let core = GateConfig::default();
        Self {
            allow_capacity: core.allow_capacity,
            deny_capacity: core.deny_capacity,
            pending_capacity: core.pending_capacity,
            pending_ttl_secs: core.pending_ttl.as_secs(),
            connected_capacity: core.connected_capacity,
            log_capacity: core.log_capacity,
            sweep_interval_secs: core.sweep_interval.as_secs(),
            signal_refresh_secs: core.signal_refresh_interval.as_secs(),
        }
    }
}

impl Config {
    /// Validate and build the engine configuration.
    pub fn to_gate_config(&self) -> Result<GateConfig, ConfigError> {
        let gate = &self.gate;
        require_positive("gate.sweep_interval_secs", gate.sweep_interval_secs)?;
        require_positive("gate.signal_refresh_secs", gate.signal_refresh_secs)?;
        require_positive("gate.pending_ttl_secs", gate.pending_ttl_secs)?;

        let mut bootstrap = Vec::with_capacity(self.bootstrap.len());
        for device in &self.bootstrap {
            let mac = MacAddress::parse(&device.mac).map_err(|_| ConfigError::Validation {
                field: "bootstrap.mac".into(),
                reason: format!("'{}' is not a MAC address", device.mac),
            })?;
            bootstrap.push(BootstrapDevice {
                mac: mac.to_string(),
                alias: device.alias.clone(),
            });
        }

        Ok(GateConfig {
            allow_capacity: gate.allow_capacity,
            deny_capacity: gate.deny_capacity,
            pending_capacity: gate.pending_capacity,
            pending_ttl: Duration::from_secs(gate.pending_ttl_secs),
            connected_capacity: gate.connected_capacity,
            log_capacity: gate.log_capacity,
            sweep_interval: Duration::from_secs(gate.sweep_interval_secs),
            signal_refresh_interval: Duration::from_secs(gate.signal_refresh_secs),
            bootstrap,
        })
    }

    /// Where the list store lives: `store_path` or the platform default.
    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }
}

fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "macgate", "macgate")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default list store file in the platform data directory.
pub fn default_store_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback().join("gate.json"),
        |dirs| dirs.data_dir().join("gate.json"),
    )
}

fn home_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("macgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file means defaults), then `MACGATE_*`
/// variables. Nested keys use a double underscore:
/// `MACGATE_GATE__PENDING_TTL_SECS=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MACGATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
