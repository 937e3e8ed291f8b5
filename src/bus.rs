use crate::error::{HueError, Result};
use crate::subscription::{BusEvent, EventReceiver};
use crate::types::{LightId, LightInfo, NormalizedLightState, Notification, PartialUpdate};
use crate::worker::LightHandle;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::{broadcast, Mutex};

/// Everything the driver needs from the message bus
#[async_trait]
pub trait DeviceBus: Send + Sync {
    /// Route update requests addressed to `light` into `handle`
    async fn register_light(&self, light: &LightInfo, handle: LightHandle) -> Result<()>;

    /// Announce a light's current state
    async fn publish_state(&self, light: &LightId, state: &NormalizedLightState) -> Result<()>;

    /// Show a message to the operator
    async fn notify_operator(&self, notification: &Notification) -> Result<()>;
}

/// In-process bus backed by tokio channels
///
/// Requests go straight to the registered light's worker; everything the
/// driver publishes is broadcast to [`EventReceiver`]s.
///
/// # Example
///
/// ```no_run
/// use hue_bridge_driver::{BusEvent, ChannelBus, PartialUpdate};
///
/// # async fn run(bus: &ChannelBus) -> Result<(), Box<dyn std::error::Error>> {
/// let mut events = bus.subscribe();
/// bus.dispatch(&"1".to_string(), PartialUpdate::brightness(0.5)).await?;
///
/// while let Ok(event) = events.recv().await {
///     if let BusEvent::State { light, state } = event {
///         println!("{} is now {:?}", light, state);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChannelBus {
    handles: Mutex<BTreeMap<LightId, LightHandle>>,
    event_tx: broadcast::Sender<BusEvent>,
}

impl ChannelBus {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            handles: Mutex::new(BTreeMap::new()),
            event_tx,
        }
    }

    /// Subscribe to everything published from now on
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.event_tx.subscribe())
    }

    /// Handle of a registered light
    pub async fn handle(&self, light: &LightId) -> Option<LightHandle> {
        self.handles.lock().await.get(light).cloned()
    }

    /// Ids of every registered light
    pub async fn light_ids(&self) -> Vec<LightId> {
        self.handles.lock().await.keys().cloned().collect()
    }

    /// Deliver an update request to a light and wait for its outcome
    pub async fn dispatch(&self, light: &LightId, update: PartialUpdate) -> Result<()> {
        let handle = self
            .handle(light)
            .await
            .ok_or_else(|| HueError::LightNotFound(light.clone()))?;
        handle.apply(update).await
    }

    /// Ask a light to blink
    pub async fn identify(&self, light: &LightId) -> Result<()> {
        let handle = self
            .handle(light)
            .await
            .ok_or_else(|| HueError::LightNotFound(light.clone()))?;
        handle.identify().await
    }
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBus for ChannelBus {
    async fn register_light(&self, light: &LightInfo, handle: LightHandle) -> Result<()> {
        tracing::info!("Registering light {} ({})", light.id, light.name);
        self.handles.lock().await.insert(light.id.clone(), handle);
        let _ = self.event_tx.send(BusEvent::LightRegistered(light.clone()));
        Ok(())
    }

    async fn publish_state(&self, light: &LightId, state: &NormalizedLightState) -> Result<()> {
        // No subscribers is not an error
        let _ = self.event_tx.send(BusEvent::State {
            light: light.clone(),
            state: state.clone(),
        });
        Ok(())
    }

    async fn notify_operator(&self, notification: &Notification) -> Result<()> {
        tracing::info!("Notifying operator: {}", notification.title);
        let _ = self.event_tx.send(BusEvent::Notification(notification.clone()));
        Ok(())
    }
}
