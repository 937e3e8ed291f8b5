use crate::bus::DeviceBus;
use crate::config::DriverConfig;
use crate::controller::ControllerApi;
use crate::error::Result;
use crate::pairing::{identity_from_serial, PairingNegotiator};
use crate::reconciler::LightReconciler;
use crate::types::{LightId, Session};
use crate::worker::{spawn_worker, LightHandle};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const STOP_GRACE: Duration = Duration::from_millis(500);

/// A paired bridge with one running worker per light
///
/// # Example
///
/// ```no_run
/// use hue_bridge_driver::{BridgeClient, ChannelBus, DriverConfig, HueDriver};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DriverConfig::default();
///     let controller = Arc::new(BridgeClient::new(&config.bridge)?);
///     let bus = Arc::new(ChannelBus::new());
///
///     // Blocks until the bridge's link button has been pressed
///     let mut driver = HueDriver::start(config, "1014BBBK6089", controller, bus.clone()).await?;
///
///     for light in bus.light_ids().await {
///         println!("Serving light {}", light);
///     }
///
///     driver.stop().await;
///     Ok(())
/// }
/// ```
pub struct HueDriver {
    session: Arc<Session>,
    lights: BTreeMap<LightId, LightHandle>,
    stop_tx: Option<broadcast::Sender<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl HueDriver {
    /// Pair with a bridge, then start serving every light it knows
    ///
    /// Lights are enumerated once. A light whose initial state cannot be
    /// read is still served.
    pub async fn start(
        config: DriverConfig,
        serial: &str,
        controller: Arc<dyn ControllerApi>,
        bus: Arc<dyn DeviceBus>,
    ) -> Result<Self> {
        let negotiator = PairingNegotiator::new(
            controller.clone(),
            bus.clone(),
            config.app_name.clone(),
            config.pairing.clone(),
        );
        let session = Arc::new(
            negotiator
                .acquire_session(&identity_from_serial(serial))
                .await,
        );

        let lights = controller.list_lights(&session).await.map_err(|e| {
            tracing::error!("Couldn't get lights: {}", e);
            e
        })?;

        let (stop_tx, _) = broadcast::channel(1);
        let mut handles = BTreeMap::new();
        let mut tasks = Vec::with_capacity(lights.len());

        for light in lights {
            tracing::info!(
                "Making light on bridge {}: id {}, name {}, model {}",
                session.bridge.id,
                light.id,
                light.name,
                light.model_id
            );

            let reconciler = LightReconciler::new(
                light.clone(),
                session.clone(),
                controller.clone(),
                bus.clone(),
                config.defaults.clone(),
            );
            let (handle, task) = spawn_worker(reconciler, config.queue_depth, stop_tx.subscribe());
            tasks.push(task);

            if let Err(e) = bus.register_light(&light, handle.clone()).await {
                tracing::error!("Could not register light {}: {}", light.id, e);
            }
            if let Err(e) = handle.refresh().await {
                tracing::warn!("Couldn't read initial state of light {}: {}", light.id, e);
            }

            handles.insert(light.id, handle);
        }

        Ok(Self {
            session,
            lights: handles,
            stop_tx: Some(stop_tx),
            tasks,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn light(&self, id: &LightId) -> Option<&LightHandle> {
        self.lights.get(id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightHandle> {
        self.lights.values()
    }

    /// Stop accepting requests and wait briefly for in-flight commands
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let tasks = std::mem::take(&mut self.tasks);
        if tokio::time::timeout(STOP_GRACE, join_all(tasks)).await.is_err() {
            tracing::warn!("Some light workers did not stop within {:?}", STOP_GRACE);
        }
        tracing::info!("Driver stopped");
    }
}
