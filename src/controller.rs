use crate::error::Result;
use crate::protocol::NativeLightState;
use crate::types::{BridgeAddress, LightId, LightInfo, Session};
use async_trait::async_trait;

/// Everything the driver needs from a bridge
///
/// [`BridgeClient`](crate::BridgeClient) speaks the bridge's REST API.
/// Implementations must tolerate concurrent calls: every light's worker
/// shares one controller.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Find reachable bridges, in a stable order
    async fn discover(&self) -> Result<Vec<BridgeAddress>>;

    /// Whether `identity` is already whitelisted on the bridge
    async fn is_authorized(&self, bridge: &BridgeAddress, identity: &str) -> Result<bool>;

    /// Ask the bridge to whitelist `identity`
    ///
    /// Fails with [`HueError::PairingNotConfirmed`](crate::HueError::PairingNotConfirmed)
    /// until the link button has been pressed.
    async fn issue_credential(
        &self,
        bridge: &BridgeAddress,
        app_name: &str,
        identity: &str,
    ) -> Result<Session>;

    /// Send a command to one light
    async fn send_state(
        &self,
        session: &Session,
        light: &LightId,
        state: &NativeLightState,
    ) -> Result<()>;

    /// Read one light's current state
    async fn get_state(&self, session: &Session, light: &LightId) -> Result<NativeLightState>;

    /// Enumerate the lights paired with the bridge
    async fn list_lights(&self, session: &Session) -> Result<Vec<LightInfo>>;
}
