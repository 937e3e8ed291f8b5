//! Wire structures of the bridge's REST API

use crate::error::HueError;
use crate::types::{LightId, LightInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bridge error type: unauthorized user
pub const ERROR_UNAUTHORIZED_USER: u16 = 1;
/// Bridge error type: link button not pressed
pub const ERROR_LINK_BUTTON_NOT_PRESSED: u16 = 101;
/// Bridge error type: parameter not modifiable while the device is off
pub const ERROR_DEVICE_IS_OFF: u16 = 201;

/// Alert value that makes a bulb breathe for a while
pub const ALERT_LSELECT: &str = "lselect";

/// Light state as the bridge encodes it
///
/// Outgoing commands only serialize the fields that are set. `colormode`
/// and `reachable` are reported by the bridge and never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeLightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    /// Tenths of a second
    #[serde(rename = "transitiontime", skip_serializing_if = "Option::is_none")]
    pub transition_time: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing)]
    pub colormode: Option<String>,
    #[serde(skip_serializing)]
    pub reachable: Option<bool>,
}

/// The single color payload of a command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeColor {
    HueSat { hue: u16, sat: u8 },
    Xy([f64; 2]),
    Mired(u16),
}

impl NativeLightState {
    /// Replace any color fields with exactly the given payload
    pub fn with_color(mut self, color: NativeColor) -> Self {
        self.hue = None;
        self.sat = None;
        self.xy = None;
        self.ct = None;
        match color {
            NativeColor::HueSat { hue, sat } => {
                self.hue = Some(hue);
                self.sat = Some(sat);
            }
            NativeColor::Xy(xy) => self.xy = Some(xy),
            NativeColor::Mired(ct) => self.ct = Some(ct),
        }
        self
    }

    /// The color the bridge reports as active, per its `colormode`
    ///
    /// `Ok(None)` for lights without color support. An unknown mode, or a
    /// mode whose fields are missing, is an error.
    pub fn color(&self) -> crate::error::Result<Option<NativeColor>> {
        let Some(mode) = self.colormode.as_deref() else {
            return Ok(None);
        };
        let color = match (mode, self.hue, self.sat, self.xy, self.ct) {
            ("hs", Some(hue), Some(sat), _, _) => NativeColor::HueSat { hue, sat },
            ("xy", _, _, Some(xy), _) => NativeColor::Xy(xy),
            ("ct", _, _, _, Some(ct)) => NativeColor::Mired(ct),
            ("hs" | "xy" | "ct", ..) => {
                return Err(HueError::IncompleteState { field: "colormode" });
            }
            (other, ..) => return Err(HueError::UnsupportedColorMode(other.to_string())),
        };
        Ok(Some(color))
    }

    /// Whether the command touches anything besides power, transition and alert
    pub fn has_lighting_fields(&self) -> bool {
        self.bri.is_some()
            || self.hue.is_some()
            || self.sat.is_some()
            || self.xy.is_some()
            || self.ct.is_some()
    }
}

/// Error entry returned by the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub code: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl From<ApiError> for HueError {
    fn from(e: ApiError) -> Self {
        match e.code {
            ERROR_UNAUTHORIZED_USER => HueError::Unauthorized,
            ERROR_LINK_BUTTON_NOT_PRESSED => HueError::PairingNotConfirmed,
            code => HueError::Api {
                code,
                description: e.description,
            },
        }
    }
}

/// One entry of the array the bridge answers write requests with
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseEntry {
    Success(Value),
    Error(ApiError),
}

/// Return the first error entry in a bridge response, if any
///
/// Reads answer with an object on success and an array of error entries
/// on failure; writes always answer with an array.
pub fn first_error(body: &Value) -> Option<ApiError> {
    body.as_array()?.iter().find_map(|entry| {
        match serde_json::from_value::<ResponseEntry>(entry.clone()) {
            Ok(ResponseEntry::Error(e)) => Some(e),
            _ => None,
        }
    })
}

/// Body of a credential issuance request
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub devicetype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Success payload of a credential issuance request
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedUser {
    pub username: String,
}

/// A light as returned by `GET /api/<user>/lights/<id>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LightResponse {
    #[serde(default)]
    pub state: NativeLightState,
    #[serde(rename = "type", default)]
    pub light_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modelid: String,
    #[serde(default)]
    pub swversion: String,
    #[serde(default)]
    pub uniqueid: String,
}

impl LightResponse {
    pub fn into_info(self, id: LightId) -> LightInfo {
        LightInfo {
            id,
            name: self.name,
            model_id: self.modelid,
            light_type: self.light_type,
            sw_version: self.swversion,
            unique_id: self.uniqueid,
        }
    }
}

/// Entry of the cloud discovery registry
#[derive(Debug, Clone, Deserialize)]
pub struct CloudBridge {
    pub id: String,
    #[serde(rename = "internalipaddress")]
    pub internal_ip_address: String,
}
