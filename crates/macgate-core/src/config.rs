// ── Runtime configuration ──
//
// Pure data: the core never touches the filesystem for configuration.
// `macgate-config` builds a `GateConfig` from TOML and the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::MacAddress;

/// A device put on the allow list at every start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapDevice {
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Capacities, timers and bootstrap devices for one gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub allow_capacity: usize,
    pub deny_capacity: usize,
    pub pending_capacity: usize,
    /// Pending entries older than this are dropped by the sweep.
    pub pending_ttl: Duration,
    pub connected_capacity: usize,
    pub log_capacity: usize,
    pub sweep_interval: Duration,
    pub signal_refresh_interval: Duration,
    pub bootstrap: Vec<BootstrapDevice>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            allow_capacity: 120,
            deny_capacity: 120,
            pending_capacity: 128,
            pending_ttl: Duration::from_secs(5 * 60),
            connected_capacity: 32,
            log_capacity: 50,
            sweep_interval: Duration::from_secs(5),
            signal_refresh_interval: Duration::from_secs(2),
            bootstrap: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let config_err = |message: String| CoreError::Config { message };

        if self.sweep_interval.is_zero() {
            return Err(config_err("sweep_interval must be greater than zero".into()));
        }
        if self.signal_refresh_interval.is_zero() {
            return Err(config_err(
                "signal_refresh_interval must be greater than zero".into(),
            ));
        }
        for device in &self.bootstrap {
            MacAddress::parse(&device.mac).map_err(|_| {
                config_err(format!("bootstrap device {:?} is not a MAC address", device.mac))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = GateConfig {
            sweep_interval: Duration::ZERO,
            ..GateConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn bad_bootstrap_mac_is_rejected() {
        let config = GateConfig {
            bootstrap: vec![BootstrapDevice {
                mac: "AA:BB".into(),
                alias: None,
            }],
            ..GateConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }
}
