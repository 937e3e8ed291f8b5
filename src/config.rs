//! Driver configuration
//!
//! Every section carries defaults, so a host may deserialize any subset.

use crate::types::{ColorValue, TransitionMs};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_APP_NAME: &str = "hue-bridge-driver";
pub const DEFAULT_DISCOVERY_URL: &str = "https://discovery.meethue.com/";

/// Top-level driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Device type reported to the bridge when asking for a credential
    pub app_name: String,
    pub defaults: LightDefaults,
    pub pairing: PairingConfig,
    pub bridge: BridgeConfig,
    /// Pending requests each light's worker buffers before callers wait
    pub queue_depth: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            defaults: LightDefaults::default(),
            pairing: PairingConfig::default(),
            bridge: BridgeConfig::default(),
            queue_depth: 16,
        }
    }
}

/// Values used when neither the request, the buffered desired state nor
/// the last observed state supplies a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightDefaults {
    pub brightness: f64,
    pub color: ColorValue,
    pub transition_ms: TransitionMs,
}

impl Default for LightDefaults {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            color: ColorValue::Hue {
                hue: 0.0,
                saturation: 0.0,
            },
            transition_ms: 500,
        }
    }
}

/// Retry timing of the pairing negotiator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Wait between discovery attempts that found nothing
    pub discovery_retry_secs: u64,
    /// Wait between attempts while the link button is unpressed
    pub confirm_retry_secs: u64,
    /// Wait after any other pairing failure
    pub transient_retry_secs: u64,
    /// Minimum spacing of "press the link button" notifications
    pub notification_interval_secs: u64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            discovery_retry_secs: 5,
            confirm_retry_secs: 2,
            transient_retry_secs: 20,
            notification_interval_secs: 300,
        }
    }
}

impl PairingConfig {
    pub fn discovery_retry(&self) -> Duration {
        Duration::from_secs(self.discovery_retry_secs)
    }

    pub fn confirm_retry(&self) -> Duration {
        Duration::from_secs(self.confirm_retry_secs)
    }

    pub fn transient_retry(&self) -> Duration {
        Duration::from_secs(self.transient_retry_secs)
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs(self.notification_interval_secs)
    }
}

/// Bridge transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Cloud registry listing bridges on the caller's network
    pub discovery_url: String,
    pub request_timeout_ms: u64,
    /// How long to collect SSDP answers
    pub ssdp_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            request_timeout_ms: 10_000,
            ssdp_timeout_ms: 3_000,
        }
    }
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ssdp_timeout(&self) -> Duration {
        Duration::from_millis(self.ssdp_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: DriverConfig = serde_json::from_str(
            r#"{
                "app_name": "living-room",
                "defaults": { "transition_ms": 1200 },
                "pairing": { "confirm_retry_secs": 1 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.app_name, "living-room");
        assert_eq!(config.defaults.transition_ms, 1200);
        assert_eq!(config.defaults.brightness, 1.0);
        assert_eq!(config.pairing.confirm_retry(), Duration::from_secs(1));
        assert_eq!(config.pairing.transient_retry(), Duration::from_secs(20));
        assert_eq!(config.bridge, BridgeConfig::default());
        assert_eq!(config.queue_depth, 16);
    }

    #[test]
    fn default_color_can_be_overridden_by_mode() {
        let defaults: LightDefaults =
            serde_json::from_str(r#"{ "color": { "mode": "temperature", "temperature": 2700 } }"#)
                .unwrap();
        assert_eq!(defaults.color, ColorValue::Temperature { kelvin: 2700.0 });
        assert_eq!(defaults.transition_ms, 500);
    }
}
