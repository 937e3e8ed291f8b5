use crate::bus::DeviceBus;
use crate::config::LightDefaults;
use crate::controller::ControllerApi;
use crate::error::{HueError, Result};
use crate::protocol::{NativeLightState, ALERT_LSELECT};
use crate::types::{
    ColorValue, LightId, LightInfo, NormalizedLightState, PartialUpdate, Session, TransitionMs,
};
use crate::units;
use std::sync::Arc;

/// Pick the first value present: explicit, then desired, then observed, then default
pub(crate) fn resolve<T: Copy>(
    explicit: Option<T>,
    desired: Option<T>,
    observed: Option<T>,
    default: Option<T>,
) -> Option<T> {
    explicit.or(desired).or(observed).or(default)
}

/// Turn a bus request into a validated state, without touching the bridge
fn validate(update: PartialUpdate) -> Result<NormalizedLightState> {
    let color = update
        .color
        .as_ref()
        .map(ColorValue::try_from)
        .transpose()?;
    if let Some(color) = &color {
        units::color_to_native(color)?;
    }
    if let Some(brightness) = update.brightness {
        if !brightness.is_finite() {
            return Err(HueError::InvalidUnitValue {
                what: "brightness",
                value: brightness,
            });
        }
    }

    Ok(NormalizedLightState {
        on_off: update.on_off,
        brightness: update.brightness,
        color,
        transition_ms: update.transition_ms,
    })
}

/// Reconciles partial updates for one light into complete bridge commands
///
/// The bridge only accepts a full state, and rejects brightness or color
/// while the light is off. Values requested while off are buffered as the
/// desired state and replayed when the light is next switched on.
///
/// Each instance is owned by exactly one worker task; nothing else reads
/// or writes its state.
pub struct LightReconciler {
    light: LightInfo,
    session: Arc<Session>,
    controller: Arc<dyn ControllerApi>,
    bus: Arc<dyn DeviceBus>,
    defaults: LightDefaults,
    /// Learned from the first state the bridge reports
    color_enabled: Option<bool>,
    last_observed: NormalizedLightState,
    desired: NormalizedLightState,
    last_transition_ms: Option<TransitionMs>,
}

impl LightReconciler {
    pub fn new(
        light: LightInfo,
        session: Arc<Session>,
        controller: Arc<dyn ControllerApi>,
        bus: Arc<dyn DeviceBus>,
        defaults: LightDefaults,
    ) -> Self {
        Self {
            light,
            session,
            controller,
            bus,
            defaults,
            color_enabled: None,
            last_observed: NormalizedLightState::default(),
            desired: NormalizedLightState::default(),
            last_transition_ms: None,
        }
    }

    pub fn light_id(&self) -> &LightId {
        &self.light.id
    }

    pub fn light(&self) -> &LightInfo {
        &self.light
    }

    /// Last state read back from the bridge
    pub fn observed_state(&self) -> &NormalizedLightState {
        &self.last_observed
    }

    /// Values waiting for the light to be switched on
    pub fn desired_state(&self) -> &NormalizedLightState {
        &self.desired
    }

    pub fn last_transition_ms(&self) -> Option<TransitionMs> {
        self.last_transition_ms
    }

    /// State as published on the bus: observed, with pending desired values on top
    pub fn reported_state(&self) -> NormalizedLightState {
        let mut state = self.last_observed.clone();
        state.merge_from(&self.desired);
        state
    }

    /// Whether color is sent to this light; unknown until the first refresh
    fn color_enabled(&self) -> bool {
        self.color_enabled.unwrap_or(true)
    }

    /// Apply a partial update
    ///
    /// Sends at most one command to the bridge, then reads the light back.
    /// Invalid requests fail before the bridge is contacted.
    pub async fn apply(&mut self, update: PartialUpdate) -> Result<()> {
        tracing::info!("Light {}: applying {:?}", self.light.id, update);
        let request = validate(update)?;

        let turn_on = match request.on_off {
            Some(on) => on,
            // A light told to change color or brightness is assumed to want to be lit
            None if request.brightness.is_some() || request.color.is_some() => true,
            None => match self.last_observed.on_off {
                Some(false) => false,
                // On, or never read back: only the sticky transition changes
                power => {
                    if let Some(transition) = request.transition_ms {
                        self.last_transition_ms = Some(transition);
                    }
                    tracing::debug!(
                        "Light {}: nothing to send (power {:?})",
                        self.light.id,
                        power
                    );
                    return Ok(());
                }
            },
        };

        // The bridge rejects everything but power and transition while off
        if !turn_on {
            return self.switch_off(request).await;
        }
        self.switch_on(request).await
    }

    async fn switch_off(&mut self, request: NormalizedLightState) -> Result<()> {
        let transition = self.resolve_transition(request.transition_ms)?;

        // Buffered only once the bridge has taken the off command
        let mut pending = self.desired.clone();
        pending.merge_from(&NormalizedLightState {
            on_off: None,
            brightness: request.brightness,
            color: request.color.filter(|_| self.color_enabled()),
            transition_ms: request.transition_ms,
        });

        let command = NativeLightState {
            on: Some(false),
            transition_time: Some(units::transition_to_native(transition)),
            ..Default::default()
        };
        self.send(command, transition, pending).await
    }

    async fn switch_on(&mut self, request: NormalizedLightState) -> Result<()> {
        let transition = self.resolve_transition(request.transition_ms)?;
        let brightness = resolve(
            request.brightness,
            self.desired.brightness,
            self.last_observed.brightness,
            Some(self.defaults.brightness),
        )
        .ok_or(HueError::IncompleteState { field: "brightness" })?;

        let mut command = NativeLightState {
            on: Some(true),
            bri: Some(units::brightness_to_native(brightness)),
            transition_time: Some(units::transition_to_native(transition)),
            ..Default::default()
        };

        if self.color_enabled() {
            let color = resolve(
                request.color,
                self.desired.color,
                self.last_observed.color,
                Some(self.defaults.color),
            )
            .ok_or(HueError::IncompleteState { field: "color" })?;
            command = command.with_color(units::color_to_native(&color)?);
        }

        self.send(command, transition, NormalizedLightState::default()).await
    }

    fn resolve_transition(&self, explicit: Option<TransitionMs>) -> Result<TransitionMs> {
        resolve(
            explicit,
            self.desired.transition_ms,
            self.last_transition_ms,
            Some(self.defaults.transition_ms),
        )
        .ok_or(HueError::IncompleteState { field: "transition" })
    }

    /// Send a power command; on success commit its effects, then read back
    ///
    /// The requested power and `desired` hold even if the read-back fails.
    async fn send(
        &mut self,
        command: NativeLightState,
        transition: TransitionMs,
        desired: NormalizedLightState,
    ) -> Result<()> {
        tracing::debug!("Light {}: sending {:?}", self.light.id, command);
        self.controller
            .send_state(&self.session, &self.light.id, &command)
            .await?;

        self.last_transition_ms = Some(transition);
        self.last_observed.on_off = command.on;
        self.desired = desired;
        self.refresh().await
    }

    /// Read the light's state from the bridge and publish it
    pub async fn refresh(&mut self) -> Result<()> {
        let native = self
            .controller
            .get_state(&self.session, &self.light.id)
            .await?;

        if native.reachable == Some(false) {
            tracing::warn!("Light {} reports itself unreachable", self.light.id);
        }

        let color_enabled = *self
            .color_enabled
            .get_or_insert_with(|| native.colormode.is_some());

        let color = if color_enabled {
            match native
                .color()
                .and_then(|color| color.map(units::color_from_native).transpose())
            {
                Ok(color) => color,
                Err(e) => {
                    tracing::warn!("Light {}: ignoring reported color: {}", self.light.id, e);
                    None
                }
            }
        } else {
            None
        };

        let observed = NormalizedLightState {
            on_off: native.on,
            brightness: native.bri.map(units::brightness_from_native),
            color,
            transition_ms: Some(self.last_transition_ms.unwrap_or(self.defaults.transition_ms)),
        };

        // Once on, desired values have been used or overridden elsewhere
        if observed.on_off == Some(true) && !self.desired.is_empty() {
            tracing::debug!("Light {}: clearing desired state", self.light.id);
            self.desired = NormalizedLightState::default();
        }

        self.last_observed = observed;
        tracing::debug!("Light {}: observed {:?}", self.light.id, self.last_observed);

        let reported = self.reported_state();
        if let Err(e) = self.bus.publish_state(&self.light.id, &reported).await {
            tracing::warn!("Light {}: failed to publish state: {}", self.light.id, e);
        }
        Ok(())
    }

    /// Make the bulb breathe so a person can find it
    pub async fn identify(&self) -> Result<()> {
        let command = NativeLightState {
            alert: Some(ALERT_LSELECT.to_string()),
            ..Default::default()
        };
        self.controller
            .send_state(&self.session, &self.light.id, &command)
            .await
    }
}
