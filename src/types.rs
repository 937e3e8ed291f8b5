use crate::error::{HueError, Result};
use serde::{Deserialize, Serialize};

/// Light identifier as assigned by the bridge
pub type LightId = String;

/// Bridge identifier (the bridge's unique id, or its host when unknown)
pub type BridgeId = String;

/// Brightness on the bus scale, 0.0 to 1.0
pub type Brightness = f64;

/// Transition duration in milliseconds
pub type TransitionMs = i64;

/// A bridge found during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeAddress {
    pub id: BridgeId,
    /// Host or `host:port` the bridge's REST API listens on
    pub host: String,
}

impl BridgeAddress {
    /// Base URL of the bridge's REST API
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.host)
    }
}

impl std::fmt::Display for BridgeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.host)
    }
}

/// An authorized session with one bridge
///
/// Produced once by the pairing negotiator and shared read-only by every
/// reconciler for the rest of the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub bridge: BridgeAddress,
    /// Whitelisted username the bridge issued (or accepted) for us
    pub username: String,
}

/// Attributes of a light reported by the bridge at enumeration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightInfo {
    pub id: LightId,
    pub name: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub light_type: String,
    #[serde(default)]
    pub sw_version: String,
    #[serde(default)]
    pub unique_id: String,
}

/// A color on the bus scale, one variant per color mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ColorValue {
    /// Hue and saturation, both 0.0 to 1.0
    Hue { hue: f64, saturation: f64 },
    /// CIE 1931 chromaticity coordinates
    Xy { x: f64, y: f64 },
    /// White color temperature in kelvin
    Temperature {
        #[serde(rename = "temperature")]
        kelvin: f64,
    },
}

impl ColorValue {
    /// Mode tag as it appears on the bus
    pub fn mode(&self) -> &'static str {
        match self {
            ColorValue::Hue { .. } => "hue",
            ColorValue::Xy { .. } => "xy",
            ColorValue::Temperature { .. } => "temperature",
        }
    }
}

/// A color payload as the bus delivers it: a mode tag plus loose fields
///
/// Validated into a [`ColorValue`] before anything is sent to the bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorState {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl TryFrom<&ColorState> for ColorValue {
    type Error = HueError;

    fn try_from(color: &ColorState) -> Result<Self> {
        match color.mode.as_str() {
            "hue" => Ok(ColorValue::Hue {
                hue: color.hue.ok_or(HueError::IncompleteState { field: "color.hue" })?,
                saturation: color
                    .saturation
                    .ok_or(HueError::IncompleteState { field: "color.saturation" })?,
            }),
            "xy" => match (color.x, color.y) {
                (Some(x), Some(y)) => Ok(ColorValue::Xy { x, y }),
                _ => Err(HueError::IncompleteState { field: "color.xy" }),
            },
            "temperature" => Ok(ColorValue::Temperature {
                kelvin: color
                    .temperature
                    .ok_or(HueError::IncompleteState { field: "color.temperature" })?,
            }),
            other => Err(HueError::UnsupportedColorMode(other.to_string())),
        }
    }
}

impl From<ColorValue> for ColorState {
    fn from(color: ColorValue) -> Self {
        let mut state = ColorState {
            mode: color.mode().to_string(),
            ..Default::default()
        };
        match color {
            ColorValue::Hue { hue, saturation } => {
                state.hue = Some(hue);
                state.saturation = Some(saturation);
            }
            ColorValue::Xy { x, y } => {
                state.x = Some(x);
                state.y = Some(y);
            }
            ColorValue::Temperature { kelvin } => state.temperature = Some(kelvin),
        }
        state
    }
}

/// Light state on the bus scale; every field independently optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLightState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_off: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<Brightness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_ms: Option<TransitionMs>,
}

impl NormalizedLightState {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.on_off.is_none()
            && self.brightness.is_none()
            && self.color.is_none()
            && self.transition_ms.is_none()
    }

    /// Copy every field set in `other` over this state (last write wins)
    pub fn merge_from(&mut self, other: &NormalizedLightState) {
        if other.on_off.is_some() {
            self.on_off = other.on_off;
        }
        if other.brightness.is_some() {
            self.brightness = other.brightness;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.transition_ms.is_some() {
            self.transition_ms = other.transition_ms;
        }
    }
}

/// A caller request naming only the properties it wants changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialUpdate {
    #[serde(default)]
    pub on_off: Option<bool>,
    #[serde(default)]
    pub brightness: Option<Brightness>,
    #[serde(default)]
    pub color: Option<ColorState>,
    #[serde(default)]
    pub transition_ms: Option<TransitionMs>,
}

impl PartialUpdate {
    /// Request that only switches the light on or off
    pub fn power(on: bool) -> Self {
        Self {
            on_off: Some(on),
            ..Default::default()
        }
    }

    /// Request that only sets brightness (and so implies on)
    pub fn brightness(brightness: Brightness) -> Self {
        Self {
            brightness: Some(brightness),
            ..Default::default()
        }
    }

    /// Request that only sets color (and so implies on)
    pub fn color(color: ColorValue) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    /// Attach a transition time to the request
    pub fn with_transition(mut self, transition_ms: TransitionMs) -> Self {
        self.transition_ms = Some(transition_ms);
        self
    }
}

/// Priority of an operator notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Default,
    High,
}

/// Category of an operator notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Suggestion,
    Alert,
}

/// A message for the human operating the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub subtitle: String,
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
}

impl Notification {
    /// Ask the operator to press the link button so pairing can finish
    pub fn press_link_button() -> Self {
        Self {
            title: "Please press the pairing button on your Hue bridge".to_string(),
            subtitle: "New Hue bridge found".to_string(),
            priority: NotificationPriority::Default,
            category: NotificationCategory::Suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_state_validates_into_tagged_value() {
        let state = ColorState {
            mode: "hue".to_string(),
            hue: Some(0.5),
            saturation: Some(1.0),
            ..Default::default()
        };
        assert_eq!(
            ColorValue::try_from(&state).unwrap(),
            ColorValue::Hue {
                hue: 0.5,
                saturation: 1.0
            }
        );
    }

    #[test]
    fn unknown_color_mode_is_rejected() {
        let state = ColorState {
            mode: "unknown".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ColorValue::try_from(&state),
            Err(HueError::UnsupportedColorMode(mode)) if mode == "unknown"
        ));
    }

    #[test]
    fn color_missing_fields_is_incomplete() {
        let state = ColorState {
            mode: "xy".to_string(),
            x: Some(0.3),
            ..Default::default()
        };
        assert!(matches!(
            ColorValue::try_from(&state),
            Err(HueError::IncompleteState { field: "color.xy" })
        ));
    }

    #[test]
    fn partial_update_parses_bus_json() {
        let update: PartialUpdate = serde_json::from_str(
            r#"{"color":{"mode":"temperature","temperature":2700},"transitionMs":1000}"#,
        )
        .unwrap();
        assert_eq!(update.on_off, None);
        assert_eq!(update.transition_ms, Some(1000));
        assert_eq!(
            ColorValue::try_from(update.color.as_ref().unwrap()).unwrap(),
            ColorValue::Temperature { kelvin: 2700.0 }
        );
    }

    #[test]
    fn normalized_state_serializes_with_mode_tag() {
        let state = NormalizedLightState {
            on_off: Some(true),
            color: Some(ColorValue::Xy { x: 0.3, y: 0.4 }),
            ..Default::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["onOff"], true);
        assert_eq!(json["color"]["mode"], "xy");
        assert!(json.get("brightness").is_none());
    }

    #[test]
    fn merge_is_last_write_wins_per_field() {
        let mut desired = NormalizedLightState {
            brightness: Some(0.2),
            transition_ms: Some(100),
            ..Default::default()
        };
        desired.merge_from(&NormalizedLightState {
            brightness: Some(0.8),
            color: Some(ColorValue::Temperature { kelvin: 4000.0 }),
            ..Default::default()
        });
        assert_eq!(desired.brightness, Some(0.8));
        assert_eq!(desired.transition_ms, Some(100));
        assert!(desired.color.is_some());
    }
}
