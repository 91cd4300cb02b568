//! CLI configuration -- thin wrapper around `macgate_config`.
//!
//! Adds the `GlobalOpts` overrides (`--config`, `--store`) and opens the
//! list store the commands operate on.

use std::path::PathBuf;
use std::sync::Arc;

use macgate_core::{FileStore, GateConfig, ListStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use macgate_config::{Config, config_path, load_config, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// The config file in effect: `--config` or the platform default.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config honoring `--config`.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = match global.config.as_deref() {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    tracing::debug!(path = %active_config_path(global).display(), "configuration loaded");
    Ok(cfg)
}

/// Store path: `--store` beats the config file.
pub fn store_path(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global.store.clone().unwrap_or_else(|| cfg.store_path())
}

pub fn gate_config(cfg: &Config) -> Result<GateConfig, CliError> {
    Ok(cfg.to_gate_config()?)
}

/// Open (or lazily create) the JSON list store.
pub fn open_store(global: &GlobalOpts, cfg: &Config) -> Result<Arc<dyn ListStore>, CliError> {
    let path = store_path(global, cfg);
    let store = FileStore::open(&path).map_err(|source| CliError::Store {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Arc::new(store))
}
