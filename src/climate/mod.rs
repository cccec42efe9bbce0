// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate entities for MAX! thermostats and the Cube.
//!
//! Both entity kinds classify their state and build their commands with the
//! same rules, implemented once in this module:
//!
//! - **HVAC mode**: automatic and boost read as `auto`, manual at the off
//!   sentinel reads as `off`, anything else as `heat`.
//! - **Target temperature**: hidden when it is a sentinel or outside the
//!   entity's bounds, so off and fully-open show up through the mode and
//!   preset instead.
//! - **Preset**: boost by mode, then comfort, eco, on and window-open by
//!   setpoint, in that order; otherwise `none`.
//!
//! Every mutator records the intended setpoint locally before the command
//! goes out. [`DeviceClimate`] drops that record once the post-command poll
//! lands; [`HubClimate`] keeps it, as there is nothing to poll.

mod device;
mod hub;
mod room;

pub use device::DeviceClimate;
pub use hub::{HubClimate, HubPresetTemperatures};
pub use room::RoomView;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValueError};
use crate::gateway::{CommandTarget, SetTemperatureMode, Setpoints};
use crate::handler::CommandOutcome;
use crate::types::{
    DeviceMode, HvacAction, HvacMode, MAX_TEMPERATURE, MIN_TEMPERATURE, OFF_TEMPERATURE,
    ON_TEMPERATURE, Preset, is_sentinel, same_temperature,
};

/// Diagnostic attributes of an entity.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Names of the diagnostic attributes.
pub mod attr {
    /// Valve opening in percent.
    pub const VALVE_POSITION: &str = "valve_position";
    /// Measured temperature offset.
    pub const TEMPERATURE_OFFSET: &str = "temp_offset";
    /// Window-open setpoint.
    pub const WINDOW_OPEN_TEMP: &str = "window_open_temp";
    /// Window-open hold time in minutes.
    pub const WINDOW_OPEN_DURATION: &str = "window_open_duration";
    /// Boost valve opening.
    pub const BOOST_VALUE: &str = "boost_value";
    /// Boost duration in minutes.
    pub const BOOST_DURATION: &str = "boost_duration";
    /// Decalcification weekday.
    pub const DECALC_DAY: &str = "decalc_day";
    /// Decalcification time of day.
    pub const DECALC_TIME: &str = "decalc_time";
    /// Maximum valve opening.
    pub const MAX_VALVE: &str = "max_valve";
    /// Valve offset.
    pub const VALVE_OFFSET: &str = "valve_offset";
    /// Comfort setpoint.
    pub const COMFORT_TEMP: &str = "comfort_temp";
    /// Eco setpoint.
    pub const ECO_TEMP: &str = "eco_temp";
    /// Room id.
    pub const ROOM: &str = "room";
    /// Device serial.
    pub const DEVICE_ID: &str = "device_id";
    /// Device radio address.
    pub const DEVICE_RF_ADDRESS: &str = "device_rf_address";
}

/// Unit of every temperature this crate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    #[default]
    Celsius,
}

impl TemperatureUnit {
    /// Returns the unit symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
        }
    }
}

/// Optional features a climate entity supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClimateFeatures {
    /// A single target temperature can be set.
    pub target_temperature: bool,
    /// Presets can be selected.
    pub preset_mode: bool,
}

impl ClimateFeatures {
    /// Features of every MAX! climate entity.
    #[must_use]
    pub const fn thermostat() -> Self {
        Self {
            target_temperature: true,
            preset_mode: true,
        }
    }
}

/// Arguments of a `set_temperature` call.
///
/// Deserializes from platform service data such as
/// `{"temperature": 21.5, "hvac_mode": "heat"}`.
///
/// # Examples
///
/// ```
/// use maxcube_climate::climate::TemperatureRequest;
/// use maxcube_climate::types::HvacMode;
///
/// let request: TemperatureRequest =
///     serde_json::from_str(r#"{"temperature": 21.5, "hvac_mode": "heat"}"#).unwrap();
/// assert_eq!(request, TemperatureRequest::new(21.5).with_hvac_mode(HvacMode::Heat));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureRequest {
    /// New target temperature; required.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Mode to switch to along with the temperature.
    #[serde(default)]
    pub hvac_mode: Option<HvacMode>,
}

impl TemperatureRequest {
    /// Creates a request for the given temperature.
    #[must_use]
    pub const fn new(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            hvac_mode: None,
        }
    }

    /// Adds an HVAC mode hint.
    #[must_use]
    pub const fn with_hvac_mode(mut self, mode: HvacMode) -> Self {
        self.hvac_mode = Some(mode);
        self
    }
}

/// The climate surface exposed to the host platform.
///
/// Reads are synchronous and reflect the gateway's last poll. Mutators
/// validate their arguments, send one command, wait for the settle delay
/// and re-poll; invalid arguments are returned before anything is sent.
#[allow(async_fn_in_trait)]
pub trait ClimateEntity {
    /// Display name.
    fn name(&self) -> &str;

    /// Stable unique id.
    fn unique_id(&self) -> &str;

    /// Unit of all temperatures.
    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    /// Supported optional features.
    fn supported_features(&self) -> ClimateFeatures {
        ClimateFeatures::thermostat()
    }

    /// Selectable HVAC modes.
    fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::SUPPORTED
    }

    /// Selectable presets.
    fn preset_modes(&self) -> &'static [Preset] {
        &Preset::SUPPORTED
    }

    /// Lowest settable target, never below [`MIN_TEMPERATURE`].
    fn min_temp(&self) -> f32;

    /// Highest settable target.
    fn max_temp(&self) -> f32;

    /// Measured temperature, if the entity has a sensor.
    fn current_temperature(&self) -> Option<f32> {
        None
    }

    /// Target temperature, `None` when unknown or a sentinel.
    fn target_temperature(&self) -> Option<f32>;

    /// Current HVAC mode, `None` while unavailable.
    fn hvac_mode(&self) -> Option<HvacMode>;

    /// What the heating is doing, if the entity can tell.
    fn hvac_action(&self) -> Option<HvacAction> {
        None
    }

    /// Current preset, `None` while unavailable.
    fn preset_mode(&self) -> Option<Preset>;

    /// Diagnostic attributes.
    fn extra_state_attributes(&self) -> Attributes;

    /// Switches the HVAC mode.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnsupportedHvacMode` for modes other than off,
    /// auto and heat.
    async fn set_hvac_mode(&self, mode: HvacMode) -> Result<CommandOutcome>;

    /// Sets the target temperature.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::MissingTemperature` without a temperature and
    /// `ValueError::UnsupportedHvacMode` for an unsupported mode hint.
    async fn set_temperature(&self, request: TemperatureRequest) -> Result<CommandOutcome>;

    /// Selects a preset.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnsupportedPreset` for presets MAX! does not offer.
    async fn set_preset_mode(&self, preset: Preset) -> Result<CommandOutcome>;

    /// Re-polls the Cube and refreshes derived state.
    async fn update(&self);
}

/// Mode and target of a thermostat or of the hub.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Setpoint {
    pub mode: DeviceMode,
    pub target: f32,
}

impl From<&Setpoints> for Setpoint {
    fn from(setpoints: &Setpoints) -> Self {
        Self {
            mode: setpoints.mode,
            target: setpoints.target_temperature,
        }
    }
}

/// Temperatures the presets map to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PresetTemperatures {
    pub comfort: f32,
    pub eco: f32,
    pub window_open: Option<f32>,
}

/// An intended change, both as command payload and as optimistic state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Change {
    pub mode: Option<DeviceMode>,
    pub temperature: Option<f32>,
}

impl Change {
    const fn new(mode: Option<DeviceMode>, temperature: Option<f32>) -> Self {
        Self { mode, temperature }
    }

    pub fn command(self, target: CommandTarget) -> SetTemperatureMode {
        SetTemperatureMode {
            target,
            temperature: self.temperature,
            mode: self.mode,
        }
    }

    /// Overlays the change; unspecified fields keep their value.
    pub fn apply_to(self, setpoint: Setpoint) -> Setpoint {
        Setpoint {
            mode: self.mode.unwrap_or(setpoint.mode),
            target: self.temperature.unwrap_or(setpoint.target),
        }
    }
}

pub(crate) fn effective_min(raw: Option<f32>) -> f32 {
    raw.unwrap_or(MIN_TEMPERATURE).max(MIN_TEMPERATURE)
}

pub(crate) fn effective_max(raw: Option<f32>) -> f32 {
    raw.unwrap_or(MAX_TEMPERATURE)
}

pub(crate) fn hvac_mode_of(setpoint: Setpoint) -> HvacMode {
    match setpoint.mode {
        DeviceMode::Automatic | DeviceMode::Boost => HvacMode::Auto,
        DeviceMode::Manual if same_temperature(setpoint.target, OFF_TEMPERATURE) => HvacMode::Off,
        DeviceMode::Manual | DeviceMode::Vacation => HvacMode::Heat,
    }
}

pub(crate) fn visible_target(target: f32, min: f32, max: f32) -> Option<f32> {
    if is_sentinel(target) || target < min || target > max {
        return None;
    }
    Some(target)
}

pub(crate) fn preset_of(setpoint: Setpoint, temperatures: PresetTemperatures) -> Preset {
    let target = setpoint.target;
    if setpoint.mode == DeviceMode::Boost {
        Preset::Boost
    } else if same_temperature(target, temperatures.comfort) {
        Preset::Comfort
    } else if same_temperature(target, temperatures.eco) {
        Preset::Eco
    } else if same_temperature(target, ON_TEMPERATURE) {
        Preset::On
    } else if temperatures
        .window_open
        .is_some_and(|window_open| same_temperature(target, window_open))
    {
        Preset::WindowOpen
    } else {
        Preset::None
    }
}

pub(crate) fn hvac_mode_change(
    mode: HvacMode,
    current: Setpoint,
    min: f32,
) -> std::result::Result<Change, ValueError> {
    match mode {
        HvacMode::Off => Ok(Change::new(Some(DeviceMode::Manual), Some(OFF_TEMPERATURE))),
        HvacMode::Heat => Ok(Change::new(
            Some(DeviceMode::Manual),
            Some(current.target.max(min)),
        )),
        HvacMode::Auto => Ok(Change::new(Some(DeviceMode::Automatic), None)),
        other => Err(ValueError::UnsupportedHvacMode(other.to_string())),
    }
}

pub(crate) fn temperature_change(
    request: TemperatureRequest,
) -> std::result::Result<Change, ValueError> {
    let temperature = request.temperature.ok_or(ValueError::MissingTemperature)?;
    match request.hvac_mode {
        None => Ok(Change::new(None, Some(temperature))),
        Some(HvacMode::Off) => Ok(Change::new(Some(DeviceMode::Manual), Some(OFF_TEMPERATURE))),
        Some(HvacMode::Heat) => Ok(Change::new(Some(DeviceMode::Manual), Some(temperature))),
        Some(HvacMode::Auto) => Ok(Change::new(Some(DeviceMode::Automatic), Some(temperature))),
        Some(other) => Err(ValueError::UnsupportedHvacMode(other.to_string())),
    }
}

pub(crate) fn preset_change(
    preset: Preset,
    temperatures: PresetTemperatures,
) -> std::result::Result<Change, ValueError> {
    match preset {
        Preset::Comfort => Ok(Change::new(None, Some(temperatures.comfort))),
        Preset::Eco => Ok(Change::new(None, Some(temperatures.eco))),
        Preset::On => Ok(Change::new(None, Some(ON_TEMPERATURE))),
        Preset::WindowOpen => temperatures
            .window_open
            .map(|t| Change::new(None, Some(t)))
            .ok_or_else(|| ValueError::UnsupportedPreset(preset.to_string())),
        Preset::None => Ok(Change::new(Some(DeviceMode::Automatic), None)),
        Preset::Boost => Ok(Change::new(Some(DeviceMode::Boost), None)),
        Preset::Away | Preset::Home | Preset::Sleep | Preset::Activity => {
            Err(ValueError::UnsupportedPreset(preset.to_string()))
        }
    }
}
