//! Bridge discovery and user pairing
//!
//! Pairing needs a person to press the bridge's link button. Until they
//! do, the negotiator keeps asking, and periodically reminds the operator.

use crate::bus::DeviceBus;
use crate::config::PairingConfig;
use crate::controller::ControllerApi;
use crate::error::HueError;
use crate::types::{BridgeAddress, Notification, Session};
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// Longest username the bridge accepts
pub const MAX_IDENTITY_LEN: usize = 40;

/// Derive our bridge username from the device serial
///
/// The serial is doubled to satisfy the bridge's minimum username length.
pub fn identity_from_serial(serial: &str) -> String {
    serial.repeat(2).chars().take(MAX_IDENTITY_LEN).collect()
}

/// Finds a bridge and obtains an authorized session with it
pub struct PairingNegotiator {
    controller: Arc<dyn ControllerApi>,
    bus: Arc<dyn DeviceBus>,
    app_name: String,
    config: PairingConfig,
}

impl PairingNegotiator {
    pub fn new(
        controller: Arc<dyn ControllerApi>,
        bus: Arc<dyn DeviceBus>,
        app_name: impl Into<String>,
        config: PairingConfig,
    ) -> Self {
        Self {
            controller,
            bus,
            app_name: app_name.into(),
            config,
        }
    }

    /// Block until a bridge is found and has authorized `identity`
    ///
    /// Never fails: every error is logged and retried.
    pub async fn acquire_session(&self, identity: &str) -> Session {
        let bridge = self.find_bridge().await;

        match self.controller.is_authorized(&bridge, identity).await {
            Ok(true) => {
                tracing::info!("Already authorized on bridge {}", bridge);
                return Session {
                    bridge,
                    username: identity.to_string(),
                };
            }
            Ok(false) => tracing::info!("Not yet authorized on bridge {}, pairing", bridge),
            Err(e) => tracing::warn!("Problem determining if user is valid: {}", e),
        }

        self.request_credential(&bridge, identity).await
    }

    async fn find_bridge(&self) -> BridgeAddress {
        loop {
            match self.controller.discover().await {
                Ok(bridges) => {
                    let count = bridges.len();
                    if let Some(bridge) = bridges.into_iter().next() {
                        tracing::info!("Found {} bridge(s), using {}", count, bridge);
                        return bridge;
                    }
                    tracing::debug!("No bridges found");
                }
                Err(e) => tracing::warn!("Bridge discovery failed: {}", e),
            }
            sleep(self.config.discovery_retry()).await;
        }
    }

    async fn request_credential(&self, bridge: &BridgeAddress, identity: &str) -> Session {
        let mut retries = 0u32;
        let mut last_notified: Option<Instant> = None;

        loop {
            match self
                .controller
                .issue_credential(bridge, &self.app_name, identity)
                .await
            {
                Ok(session) => {
                    tracing::info!("Paired with bridge {} after {} retries", bridge, retries);
                    return session;
                }
                Err(HueError::PairingNotConfirmed) => {
                    retries += 1;
                    tracing::debug!("Link button not pressed yet, retry {}", retries);

                    let due = last_notified
                        .map_or(true, |at| at.elapsed() >= self.config.notification_interval());
                    if due {
                        last_notified = Some(Instant::now());
                        if let Err(e) = self
                            .bus
                            .notify_operator(&Notification::press_link_button())
                            .await
                        {
                            tracing::warn!("Failed to notify operator: {}", e);
                        }
                    }

                    sleep(self.config.confirm_retry()).await;
                }
                Err(e) => {
                    tracing::debug!("Error creating user: {}", e);
                    sleep(self.config.transient_retry()).await;
                }
            }
        }
    }
}
