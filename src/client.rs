use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::controller::ControllerApi;
use crate::discovery::Discovery;
use crate::error::{HueError, Result};
use crate::protocol::{CreateUserRequest, CreatedUser, LightResponse, NativeLightState, ResponseEntry};
use crate::types::{BridgeAddress, LightId, LightInfo, Session};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Client for a Hue bridge's REST API
///
/// One client serves every light; requests from different lights may run
/// concurrently.
///
/// # Example
///
/// ```no_run
/// use hue_bridge_driver::{BridgeClient, ControllerApi, DriverConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = BridgeClient::new(&DriverConfig::default().bridge)?;
///     for bridge in client.discover().await? {
///         println!("Found bridge {}", bridge);
///     }
///     Ok(())
/// }
/// ```
pub struct BridgeClient {
    connection: Connection,
    discovery: Discovery,
}

impl BridgeClient {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let connection = Connection::new(config.request_timeout())?;
        let discovery = Discovery::new(
            connection.clone(),
            config.discovery_url.clone(),
            config.ssdp_timeout(),
        );
        Ok(Self {
            connection,
            discovery,
        })
    }

    fn light_url(session: &Session, light: &LightId) -> String {
        format!("{}/{}/lights/{}", session.bridge.api_url(), session.username, light)
    }
}

#[async_trait]
impl ControllerApi for BridgeClient {
    async fn discover(&self) -> Result<Vec<BridgeAddress>> {
        self.discovery.find_bridges().await
    }

    async fn is_authorized(&self, bridge: &BridgeAddress, identity: &str) -> Result<bool> {
        let url = format!("{}/{}/lights", bridge.api_url(), identity);
        match self.connection.get(&url).await {
            Ok(_) => Ok(true),
            Err(HueError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn issue_credential(
        &self,
        bridge: &BridgeAddress,
        app_name: &str,
        identity: &str,
    ) -> Result<Session> {
        let request = CreateUserRequest {
            devicetype: app_name.to_string(),
            username: Some(identity.to_string()),
        };
        let body = self.connection.post(&bridge.api_url(), &request).await?;

        let entries: Vec<ResponseEntry> = serde_json::from_value(body)?;
        let created = entries.into_iter().find_map(|entry| match entry {
            ResponseEntry::Success(value) => serde_json::from_value::<CreatedUser>(value).ok(),
            ResponseEntry::Error(_) => None,
        });

        let username = match created {
            Some(user) => user.username,
            None => {
                return Err(HueError::TransientController {
                    detail: "credential response carried no username".to_string(),
                })
            }
        };

        Ok(Session {
            bridge: bridge.clone(),
            username,
        })
    }

    async fn send_state(
        &self,
        session: &Session,
        light: &LightId,
        state: &NativeLightState,
    ) -> Result<()> {
        let url = format!("{}/state", Self::light_url(session, light));
        self.connection.put(&url, state).await?;
        Ok(())
    }

    async fn get_state(&self, session: &Session, light: &LightId) -> Result<NativeLightState> {
        let body = self.connection.get(&Self::light_url(session, light)).await?;
        let response: LightResponse = serde_json::from_value(body)?;
        Ok(response.state)
    }

    async fn list_lights(&self, session: &Session) -> Result<Vec<LightInfo>> {
        let url = format!("{}/{}/lights", session.bridge.api_url(), session.username);
        let body = self.connection.get(&url).await?;
        let lights: BTreeMap<LightId, LightResponse> = serde_json::from_value(body)?;

        Ok(lights
            .into_iter()
            .map(|(id, light)| light.into_info(id))
            .collect())
    }
}
