use crate::types::LightId;
use thiserror::Error;

/// Result type for bridge and reconciliation operations
pub type Result<T> = std::result::Result<T, HueError>;

/// Errors that can occur when pairing with a bridge or driving its lights
#[derive(Error, Debug)]
pub enum HueError {
    /// The bridge is waiting for its link button to be pressed
    #[error("Pairing not confirmed: press the link button on the bridge")]
    PairingNotConfirmed,

    /// The bridge answered, but not usefully (server error, garbled body)
    #[error("Transient controller error: {detail}")]
    TransientController {
        /// What went wrong
        detail: String,
    },

    /// The bridge could not be reached (timeout, connection refused)
    #[error("Bridge unreachable: {detail}")]
    ApplianceUnreachable {
        /// Underlying transport failure
        detail: String,
    },

    /// The credential is unknown to the bridge or has been revoked
    #[error("Unauthorized user")]
    Unauthorized,

    /// Bridge returned an error entry we do not handle specially
    #[error("Bridge error {code}: {description}")]
    Api {
        /// Bridge error type code
        code: u16,
        /// Description reported by the bridge
        description: String,
    },

    /// A required field could not be resolved before building a command
    #[error("Incomplete light state: no value for {field}")]
    IncompleteState {
        /// Name of the unresolved field
        field: &'static str,
    },

    /// Color payload carried a mode we cannot translate
    #[error("Unsupported color mode: {0}")]
    UnsupportedColorMode(String),

    /// A numeric value outside the domain of a unit conversion
    #[error("Invalid {what}: {value}")]
    InvalidUnitValue {
        /// Which quantity was being converted
        what: &'static str,
        /// The offending value
        value: f64,
    },

    /// Light is not known to the bridge or the driver
    #[error("Light not found: {0}")]
    LightNotFound(LightId),

    /// The light's worker has shut down and accepts no more requests
    #[error("Worker for light {0} has stopped")]
    WorkerStopped(LightId),

    /// Event channel was closed
    #[error("Channel closed")]
    ChannelClosed,

    /// HTTP error not classified as a reachability failure
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HueError {
    /// Whether the caller may reasonably retry the same request later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HueError::ApplianceUnreachable { .. }
                | HueError::TransientController { .. }
                | HueError::PairingNotConfirmed
        )
    }
}

impl From<reqwest::Error> for HueError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            HueError::ApplianceUnreachable {
                detail: e.to_string(),
            }
        } else if e.is_decode() {
            HueError::TransientController {
                detail: e.to_string(),
            }
        } else {
            HueError::Http(e)
        }
    }
}
