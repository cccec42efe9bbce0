// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and room records as polled from the Cube.
//!
//! The gateway owns these records; entities look them up by serial on every
//! read so they always reflect the latest poll. Fields that only exist on
//! one kind of thermostat live on that variant of [`DeviceKind`].

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::ValueError;
use crate::types::{DeviceMode, RfAddress};

/// A room configured on the Cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier assigned by the Cube.
    pub id: u8,
    /// Display name.
    pub name: String,
}

impl Room {
    /// Creates a room.
    #[must_use]
    pub fn new(id: u8, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Setpoint configuration shared by radiator and wall thermostats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setpoints {
    /// Current operating mode.
    pub mode: DeviceMode,
    /// Current target temperature in °C, sentinels included.
    pub target_temperature: f32,
    /// Configured comfort temperature.
    pub comfort_temperature: f32,
    /// Configured eco temperature.
    pub eco_temperature: f32,
    /// Lower bound configured in the device, if reported.
    pub min_temperature: Option<f32>,
    /// Upper bound configured in the device, if reported.
    pub max_temperature: Option<f32>,
}

impl Default for Setpoints {
    fn default() -> Self {
        Self {
            mode: DeviceMode::Automatic,
            target_temperature: 21.0,
            comfort_temperature: 21.5,
            eco_temperature: 16.5,
            min_temperature: Some(4.5),
            max_temperature: Some(30.5),
        }
    }
}

impl Setpoints {
    /// Creates setpoints with factory comfort/eco values.
    #[must_use]
    pub fn new(mode: DeviceMode, target_temperature: f32) -> Self {
        Self {
            mode,
            target_temperature,
            ..Self::default()
        }
    }

    /// Sets the comfort and eco temperatures.
    #[must_use]
    pub fn with_presets(mut self, comfort: f32, eco: f32) -> Self {
        self.comfort_temperature = comfort;
        self.eco_temperature = eco;
        self
    }

    /// Sets the temperature bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.min_temperature = min;
        self.max_temperature = max;
        self
    }
}

/// Day and time of the weekly valve decalcification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decalcification {
    /// Day of the week.
    pub day: Weekday,
    /// Time of day.
    pub time: NaiveTime,
}

/// A valve-actuating radiator thermostat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiatorThermostat {
    /// Mode and setpoint configuration.
    pub setpoints: Setpoints,
    /// Measured temperature, only reported while the valve moves.
    pub actual_temperature: Option<f32>,
    /// Valve opening in percent.
    #[serde(deserialize_with = "valve_percent")]
    valve_position: u8,
    /// Setpoint applied while a window is detected open.
    pub window_open_temperature: f32,
    /// How long the window-open setpoint is held, in minutes.
    pub window_open_duration: u16,
    /// Offset applied to the measured temperature.
    pub temperature_offset: f32,
    /// Valve opening during boost, in percent.
    pub boost_value: u8,
    /// Boost duration in minutes.
    pub boost_duration: u16,
    /// Weekly decalcification schedule.
    pub decalcification: Option<Decalcification>,
    /// Maximum valve opening in percent.
    pub max_valve: u8,
    /// Valve offset in percent.
    pub valve_offset: u8,
}

impl RadiatorThermostat {
    /// Creates a radiator thermostat with factory defaults and a closed valve.
    #[must_use]
    pub fn new(setpoints: Setpoints) -> Self {
        Self {
            setpoints,
            actual_temperature: None,
            valve_position: 0,
            window_open_temperature: 12.0,
            window_open_duration: 15,
            temperature_offset: 0.0,
            boost_value: 80,
            boost_duration: 5,
            decalcification: None,
            max_valve: 100,
            valve_offset: 0,
        }
    }

    /// Returns the valve opening in percent.
    #[must_use]
    pub const fn valve_position(&self) -> u8 {
        self.valve_position
    }

    /// Sets the valve opening.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::ValvePositionOutOfRange` above 100 percent.
    pub fn set_valve_position(&mut self, position: u8) -> Result<(), ValueError> {
        if position > 100 {
            return Err(ValueError::ValvePositionOutOfRange(position));
        }
        self.valve_position = position;
        Ok(())
    }

    /// Sets the valve opening, builder style.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::ValvePositionOutOfRange` above 100 percent.
    pub fn with_valve_position(mut self, position: u8) -> Result<Self, ValueError> {
        self.set_valve_position(position)?;
        Ok(self)
    }

    /// Sets the measured temperature, builder style.
    #[must_use]
    pub fn with_actual_temperature(mut self, temperature: f32) -> Self {
        self.actual_temperature = Some(temperature);
        self
    }

    /// Sets the window-open temperature, builder style.
    #[must_use]
    pub fn with_window_open_temperature(mut self, temperature: f32) -> Self {
        self.window_open_temperature = temperature;
        self
    }
}

fn valve_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let position = u8::deserialize(deserializer)?;
    if position > 100 {
        return Err(de::Error::custom(ValueError::ValvePositionOutOfRange(position)));
    }
    Ok(position)
}

/// A wall-mounted thermostat: a room sensor without a valve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallThermostat {
    /// Mode and setpoint configuration.
    pub setpoints: Setpoints,
    /// Measured room temperature.
    pub actual_temperature: Option<f32>,
}

impl WallThermostat {
    /// Creates a wall thermostat.
    #[must_use]
    pub fn new(setpoints: Setpoints) -> Self {
        Self {
            setpoints,
            actual_temperature: None,
        }
    }

    /// Sets the measured temperature, builder style.
    #[must_use]
    pub fn with_actual_temperature(mut self, temperature: f32) -> Self {
        self.actual_temperature = Some(temperature);
        self
    }
}

/// Kind-specific data of a MAX! device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    /// Radiator thermostat.
    RadiatorThermostat(RadiatorThermostat),
    /// Wall thermostat.
    WallThermostat(WallThermostat),
}

/// A MAX! thermostat known to the Cube.
///
/// # Examples
///
/// ```
/// use maxcube_climate::gateway::{Device, RadiatorThermostat, Setpoints};
/// use maxcube_climate::types::{DeviceMode, RfAddress};
///
/// let device = Device::radiator(
///     "KEQ0001",
///     "Radiator",
///     RfAddress::new(0x0a0001),
///     1,
///     RadiatorThermostat::new(Setpoints::new(DeviceMode::Manual, 21.0)),
/// );
/// assert!(device.is_radiator());
/// assert_eq!(device.valve_position(), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Serial number, unique per device.
    pub serial: String,
    /// Display name.
    pub name: String,
    /// Radio address.
    pub rf_address: RfAddress,
    /// Room the device belongs to.
    pub room_id: u8,
    /// Kind-specific data.
    pub kind: DeviceKind,
}

impl Device {
    /// Creates a radiator thermostat record.
    #[must_use]
    pub fn radiator(
        serial: impl Into<String>,
        name: impl Into<String>,
        rf_address: RfAddress,
        room_id: u8,
        thermostat: RadiatorThermostat,
    ) -> Self {
        Self {
            serial: serial.into(),
            name: name.into(),
            rf_address,
            room_id,
            kind: DeviceKind::RadiatorThermostat(thermostat),
        }
    }

    /// Creates a wall thermostat record.
    #[must_use]
    pub fn wall(
        serial: impl Into<String>,
        name: impl Into<String>,
        rf_address: RfAddress,
        room_id: u8,
        thermostat: WallThermostat,
    ) -> Self {
        Self {
            serial: serial.into(),
            name: name.into(),
            rf_address,
            room_id,
            kind: DeviceKind::WallThermostat(thermostat),
        }
    }

    /// Returns `true` for radiator thermostats.
    #[must_use]
    pub const fn is_radiator(&self) -> bool {
        matches!(self.kind, DeviceKind::RadiatorThermostat(_))
    }

    /// Returns `true` for wall thermostats.
    #[must_use]
    pub const fn is_wall(&self) -> bool {
        matches!(self.kind, DeviceKind::WallThermostat(_))
    }

    /// Returns the radiator data, if this is a radiator thermostat.
    #[must_use]
    pub const fn as_radiator(&self) -> Option<&RadiatorThermostat> {
        match &self.kind {
            DeviceKind::RadiatorThermostat(radiator) => Some(radiator),
            DeviceKind::WallThermostat(_) => None,
        }
    }

    /// Returns the radiator data mutably, if this is a radiator thermostat.
    pub fn as_radiator_mut(&mut self) -> Option<&mut RadiatorThermostat> {
        match &mut self.kind {
            DeviceKind::RadiatorThermostat(radiator) => Some(radiator),
            DeviceKind::WallThermostat(_) => None,
        }
    }

    /// Returns the setpoint configuration.
    #[must_use]
    pub const fn setpoints(&self) -> &Setpoints {
        match &self.kind {
            DeviceKind::RadiatorThermostat(radiator) => &radiator.setpoints,
            DeviceKind::WallThermostat(wall) => &wall.setpoints,
        }
    }

    /// Returns the setpoint configuration mutably.
    pub fn setpoints_mut(&mut self) -> &mut Setpoints {
        match &mut self.kind {
            DeviceKind::RadiatorThermostat(radiator) => &mut radiator.setpoints,
            DeviceKind::WallThermostat(wall) => &mut wall.setpoints,
        }
    }

    /// Returns the measured temperature.
    #[must_use]
    pub const fn actual_temperature(&self) -> Option<f32> {
        match &self.kind {
            DeviceKind::RadiatorThermostat(radiator) => radiator.actual_temperature,
            DeviceKind::WallThermostat(wall) => wall.actual_temperature,
        }
    }

    /// Returns the valve opening; wall thermostats have no valve.
    #[must_use]
    pub const fn valve_position(&self) -> Option<u8> {
        match &self.kind {
            DeviceKind::RadiatorThermostat(radiator) => Some(radiator.valve_position),
            DeviceKind::WallThermostat(_) => None,
        }
    }
}
