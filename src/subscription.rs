//! Observing what the driver publishes on an in-process bus
//!
//! Every state event is a full snapshot of one light, so an observer that
//! falls behind loses nothing by skipping to the newest events.

use crate::error::{HueError, Result};
use crate::types::{LightId, LightInfo, NormalizedLightState, Notification};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Something the driver told the bus
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// A light became controllable through the bus
    LightRegistered(LightInfo),

    /// A light's reported state changed
    State {
        light: LightId,
        state: NormalizedLightState,
    },

    /// Message for the operator
    Notification(Notification),
}

impl BusEvent {
    /// The light this event is about, if any
    pub fn light_id(&self) -> Option<&LightId> {
        match self {
            BusEvent::LightRegistered(info) => Some(&info.id),
            BusEvent::State { light, .. } => Some(light),
            BusEvent::Notification(_) => None,
        }
    }
}

/// A subscription to [`ChannelBus`](crate::ChannelBus) events
pub struct EventReceiver {
    rx: broadcast::Receiver<BusEvent>,
}

impl EventReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<BusEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event
    ///
    /// Events overwritten before they were read are skipped with a warning.
    /// Fails with `ChannelClosed` once the bus is gone.
    pub async fn recv(&mut self) -> Result<BusEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Ok(event),
                Err(RecvError::Lagged(skipped)) => skipped_events(skipped),
                Err(RecvError::Closed) => return Err(HueError::ChannelClosed),
            }
        }
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Result<Option<BusEvent>> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(TryRecvError::Lagged(skipped)) => skipped_events(skipped),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(HueError::ChannelClosed),
            }
        }
    }
}

fn skipped_events(count: u64) {
    tracing::warn!("Bus observer fell behind, skipped {} events", count);
}
