//! Rust library for driving Philips Hue lights through a Hue bridge
//!
//! This library pairs with a Hue bridge on the local network and keeps each
//! light's state in sync with requests arriving from a message bus. It supports:
//!
//! - Bridge discovery via the Hue cloud endpoint, with SSDP as a fallback
//! - Link-button pairing with periodic operator reminders
//! - Partial updates (power, brightness, color, transition) merged into full bridge commands
//! - Buffering of brightness and color while a light is off
//! - Hue/saturation, CIE xy and color temperature, converted to bridge units
//! - Per-light request queues so one slow light never blocks another
//!
//! # Quick Start
//!
//! ```no_run
//! use hue_bridge_driver::{BridgeClient, BusEvent, ChannelBus, DriverConfig, HueDriver, PartialUpdate};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DriverConfig::default();
//!     let controller = Arc::new(BridgeClient::new(&config.bridge)?);
//!     let bus = Arc::new(ChannelBus::new());
//!     let mut events = bus.subscribe();
//!
//!     // Waits for the link button on first run
//!     let mut driver = HueDriver::start(config, "1014BBBK6089", controller, bus.clone()).await?;
//!
//!     if let Some(light) = bus.light_ids().await.first() {
//!         bus.dispatch(light, PartialUpdate::brightness(0.4).with_transition(1000)).await?;
//!     }
//!
//!     while let Ok(event) = events.recv().await {
//!         if let BusEvent::State { light, state } = event {
//!             println!("Light {}: {:?}", light, state);
//!             break;
//!         }
//!     }
//!
//!     driver.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Custom Bus
//!
//! Implement [`DeviceBus`] to connect lights to another message bus:
//!
//! ```no_run
//! use async_trait::async_trait;
//! use hue_bridge_driver::{DeviceBus, LightHandle, LightId, LightInfo, NormalizedLightState, Notification, Result};
//!
//! struct LoggingBus;
//!
//! #[async_trait]
//! impl DeviceBus for LoggingBus {
//!     async fn register_light(&self, light: &LightInfo, _handle: LightHandle) -> Result<()> {
//!         println!("new light {}", light.name);
//!         Ok(())
//!     }
//!
//!     async fn publish_state(&self, light: &LightId, state: &NormalizedLightState) -> Result<()> {
//!         println!("{} -> {:?}", light, state);
//!         Ok(())
//!     }
//!
//!     async fn notify_operator(&self, notification: &Notification) -> Result<()> {
//!         println!("{}", notification.title);
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Pairing**: Bridge discovery and link-button pairing
//! - **Driver**: Startup, light enumeration and shutdown
//! - **Worker**: One ordered request queue per light
//! - **Reconciler**: Merges partial updates with buffered and observed state
//! - **Units**: Conversion between normalized values and bridge values
//! - **Client/Connection**: Hue REST API over HTTP
//! - **Protocol**: JSON message structures
//! - **Types**: Domain types and data structures

mod bus;
mod client;
mod config;
mod connection;
mod controller;
mod discovery;
mod driver;
mod error;
mod pairing;
mod protocol;
mod reconciler;
mod subscription;
mod types;
pub mod units;
mod worker;

#[cfg(test)]
mod testing;

// Public exports
pub use bus::{ChannelBus, DeviceBus};
pub use client::BridgeClient;
pub use config::{BridgeConfig, DriverConfig, LightDefaults, PairingConfig};
pub use controller::ControllerApi;
pub use driver::HueDriver;
pub use error::{HueError, Result};
pub use pairing::{identity_from_serial, PairingNegotiator, MAX_IDENTITY_LEN};
pub use protocol::{NativeColor, NativeLightState};
pub use reconciler::LightReconciler;
pub use subscription::{BusEvent, EventReceiver};
pub use types::{
    Brightness, BridgeAddress, BridgeId, ColorState, ColorValue, LightId, LightInfo,
    NormalizedLightState, Notification, NotificationCategory, NotificationPriority,
    PartialUpdate, Session, TransitionMs,
};
pub use worker::LightHandle;
