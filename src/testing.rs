//! Simulated bridge for unit tests

use crate::controller::ControllerApi;
use crate::error::{HueError, Result};
use crate::protocol::{NativeLightState, ERROR_DEVICE_IS_OFF};
use crate::types::{BridgeAddress, LightId, LightInfo, Session};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

/// Scripted outcome of one credential request
#[derive(Debug, Clone, Copy)]
pub(crate) enum Credential {
    NotConfirmed,
    Transient,
    Granted,
}

pub(crate) fn bridge(id: &str) -> BridgeAddress {
    BridgeAddress {
        id: id.to_string(),
        host: format!("{}.local", id),
    }
}

pub(crate) fn session() -> Session {
    Session {
        bridge: bridge("test"),
        username: "serialserial".to_string(),
    }
}

/// A color bulb currently in color temperature mode
pub(crate) fn color_light(on: bool) -> NativeLightState {
    NativeLightState {
        on: Some(on),
        bri: Some(255),
        hue: Some(8418),
        sat: Some(140),
        xy: Some([0.4573, 0.41]),
        ct: Some(366),
        colormode: Some("ct".to_string()),
        reachable: Some(true),
        ..Default::default()
    }
}

/// A dimmable white bulb
pub(crate) fn white_light(on: bool) -> NativeLightState {
    NativeLightState {
        on: Some(on),
        bri: Some(255),
        reachable: Some(true),
        ..Default::default()
    }
}

#[derive(Default)]
struct MockState {
    bridges: Vec<BridgeAddress>,
    discovery_script: VecDeque<Vec<BridgeAddress>>,
    discover_calls: usize,
    authorized: bool,
    credentials: VecDeque<Credential>,
    credential_attempts: usize,
    lights: BTreeMap<LightId, NativeLightState>,
    unreachable: BTreeSet<LightId>,
    all_unreachable: bool,
    reads_failing: bool,
    sent: Vec<(LightId, NativeLightState)>,
    calls: usize,
}

/// In-memory bridge that enforces the "off rejects lighting fields" rule
#[derive(Default)]
pub(crate) struct MockController {
    state: Mutex<MockState>,
}

impl MockController {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_light(self, id: &str, state: NativeLightState) -> Self {
        self.state.lock().unwrap().lights.insert(id.to_string(), state);
        self
    }

    pub(crate) fn with_bridges(self, bridges: Vec<BridgeAddress>) -> Self {
        self.state.lock().unwrap().bridges = bridges;
        self
    }

    /// Answers for the first discovery calls, before `with_bridges` applies
    pub(crate) fn with_discovery_script(self, script: Vec<Vec<BridgeAddress>>) -> Self {
        self.state.lock().unwrap().discovery_script = script.into();
        self
    }

    pub(crate) fn with_authorized(self, authorized: bool) -> Self {
        self.state.lock().unwrap().authorized = authorized;
        self
    }

    pub(crate) fn with_credentials(self, script: Vec<Credential>) -> Self {
        self.state.lock().unwrap().credentials = script.into();
        self
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().all_unreachable = unreachable;
    }

    pub(crate) fn set_light_unreachable(&self, id: &str, unreachable: bool) {
        let mut state = self.state.lock().unwrap();
        if unreachable {
            state.unreachable.insert(id.to_string());
        } else {
            state.unreachable.remove(id);
        }
    }

    /// Make state reads time out while commands still go through
    pub(crate) fn set_reads_failing(&self, failing: bool) {
        self.state.lock().unwrap().reads_failing = failing;
    }

    /// Every command sent so far, accepted or not
    pub(crate) fn sent(&self) -> Vec<(LightId, NativeLightState)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub(crate) fn clear_sent(&self) {
        self.state.lock().unwrap().sent.clear();
    }

    pub(crate) fn state_of(&self, id: &str) -> NativeLightState {
        self.state.lock().unwrap().lights[id].clone()
    }

    /// Number of light reads and writes
    pub(crate) fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub(crate) fn credential_attempts(&self) -> usize {
        self.state.lock().unwrap().credential_attempts
    }

    pub(crate) fn discover_calls(&self) -> usize {
        self.state.lock().unwrap().discover_calls
    }

    fn check_reachable(state: &MockState, light: &LightId) -> Result<()> {
        if state.all_unreachable || state.unreachable.contains(light) {
            return Err(HueError::ApplianceUnreachable {
                detail: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ControllerApi for MockController {
    async fn discover(&self) -> Result<Vec<BridgeAddress>> {
        let mut state = self.state.lock().unwrap();
        state.discover_calls += 1;
        Ok(match state.discovery_script.pop_front() {
            Some(bridges) => bridges,
            None => state.bridges.clone(),
        })
    }

    async fn is_authorized(&self, _bridge: &BridgeAddress, _identity: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().authorized)
    }

    async fn issue_credential(
        &self,
        bridge: &BridgeAddress,
        _app_name: &str,
        identity: &str,
    ) -> Result<Session> {
        let mut state = self.state.lock().unwrap();
        state.credential_attempts += 1;
        match state.credentials.pop_front().unwrap_or(Credential::Granted) {
            Credential::NotConfirmed => Err(HueError::PairingNotConfirmed),
            Credential::Transient => Err(HueError::TransientController {
                detail: "bridge busy".to_string(),
            }),
            Credential::Granted => Ok(Session {
                bridge: bridge.clone(),
                username: identity.to_string(),
            }),
        }
    }

    async fn send_state(
        &self,
        _session: &Session,
        light: &LightId,
        command: &NativeLightState,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.sent.push((light.clone(), command.clone()));
        Self::check_reachable(&state, light)?;

        let current = state
            .lights
            .get_mut(light)
            .ok_or_else(|| HueError::LightNotFound(light.clone()))?;

        let will_be_on = command.on.or(current.on).unwrap_or(false);
        if !will_be_on && command.has_lighting_fields() {
            return Err(HueError::Api {
                code: ERROR_DEVICE_IS_OFF,
                description: "parameter not modifiable, device is set to off".to_string(),
            });
        }
        let has_color = command.hue.is_some() || command.xy.is_some() || command.ct.is_some();
        if has_color && current.colormode.is_none() {
            return Err(HueError::Api {
                code: 6,
                description: "parameter not available".to_string(),
            });
        }

        if let Some(on) = command.on {
            current.on = Some(on);
        }
        if let Some(bri) = command.bri {
            current.bri = Some(bri);
        }
        if let (Some(hue), Some(sat)) = (command.hue, command.sat) {
            current.hue = Some(hue);
            current.sat = Some(sat);
            current.colormode = Some("hs".to_string());
        }
        if let Some(xy) = command.xy {
            current.xy = Some(xy);
            current.colormode = Some("xy".to_string());
        }
        if let Some(ct) = command.ct {
            current.ct = Some(ct);
            current.colormode = Some("ct".to_string());
        }
        Ok(())
    }

    async fn get_state(&self, _session: &Session, light: &LightId) -> Result<NativeLightState> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Self::check_reachable(&state, light)?;
        if state.reads_failing {
            return Err(HueError::ApplianceUnreachable {
                detail: "read timeout".to_string(),
            });
        }
        state
            .lights
            .get(light)
            .cloned()
            .ok_or_else(|| HueError::LightNotFound(light.clone()))
    }

    async fn list_lights(&self, _session: &Session) -> Result<Vec<LightInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .lights
            .keys()
            .map(|id| LightInfo {
                id: id.clone(),
                name: format!("Light {}", id),
                model_id: "LCT015".to_string(),
                light_type: "Extended color light".to_string(),
                ..Default::default()
            })
            .collect())
    }
}
