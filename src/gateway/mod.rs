// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interface to the MAX! Cube gateway client.
//!
//! Socket I/O, discovery and the binary protocol belong to the gateway
//! client. This module only describes what the climate layer needs from it:
//! read access to the devices and rooms of the last poll, a refresh, and the
//! single write command [`SetTemperatureMode`].
//!
//! [`memory::InMemoryCube`] implements the trait without any network and is
//! what the test suite drives.

mod device;
pub mod memory;

pub use device::{
    Decalcification, Device, DeviceKind, RadiatorThermostat, Room, Setpoints, WallThermostat,
};

use std::fmt;

use crate::error::TransportError;
use crate::types::{DeviceMode, RfAddress};

/// Addressee of a temperature/mode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTarget {
    /// A single thermostat.
    Device {
        /// Radio address of the thermostat.
        rf_address: RfAddress,
        /// Room of the thermostat.
        room_id: u8,
    },
    /// Every thermostat behind the Cube.
    Cube,
}

impl CommandTarget {
    /// Addresses the given device.
    #[must_use]
    pub fn device(device: &Device) -> Self {
        Self::Device {
            rf_address: device.rf_address,
            room_id: device.room_id,
        }
    }
}

impl fmt::Display for CommandTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device {
                rf_address,
                room_id,
            } => write!(f, "device {rf_address} in room {room_id}"),
            Self::Cube => f.write_str("cube"),
        }
    }
}

/// The `set_temperature_mode` command of the gateway.
///
/// Both fields are optional. Without a mode the thermostat keeps its
/// current one; without a temperature it takes the scheduled setpoint in
/// automatic mode and keeps its current setpoint otherwise.
///
/// # Examples
///
/// ```
/// use maxcube_climate::gateway::{CommandTarget, SetTemperatureMode};
/// use maxcube_climate::types::{DeviceMode, OFF_TEMPERATURE};
///
/// let off = SetTemperatureMode::new(CommandTarget::Cube)
///     .with_mode(DeviceMode::Manual)
///     .with_temperature(OFF_TEMPERATURE);
/// assert_eq!(off.mode, Some(DeviceMode::Manual));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetTemperatureMode {
    /// Device or Cube to address.
    pub target: CommandTarget,
    /// New setpoint, if any.
    pub temperature: Option<f32>,
    /// New mode, if any.
    pub mode: Option<DeviceMode>,
}

impl SetTemperatureMode {
    /// Creates a command that changes nothing yet.
    #[must_use]
    pub const fn new(target: CommandTarget) -> Self {
        Self {
            target,
            temperature: None,
            mode: None,
        }
    }

    /// Sets the setpoint.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: DeviceMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// A MAX! Cube gateway client.
///
/// Reads return the state of the last poll and never touch the network.
/// [`update`](Self::update) re-polls the whole Cube; write commands go
/// through [`set_temperature_mode`](Self::set_temperature_mode).
#[allow(async_fn_in_trait)]
pub trait Cube {
    /// Serial number of the Cube.
    fn serial(&self) -> &str;

    /// Radio address of the Cube.
    fn rf_address(&self) -> RfAddress;

    /// All thermostats known to the Cube.
    fn devices(&self) -> Vec<Device>;

    /// All rooms known to the Cube.
    fn rooms(&self) -> Vec<Room>;

    /// Looks up a device by serial.
    fn device(&self, serial: &str) -> Option<Device> {
        self.devices().into_iter().find(|d| d.serial == serial)
    }

    /// Looks up a room by id.
    fn room_by_id(&self, id: u8) -> Option<Room> {
        self.rooms().into_iter().find(|r| r.id == id)
    }

    /// All devices of a room, in Cube order.
    fn devices_by_room(&self, room_id: u8) -> Vec<Device> {
        self.devices()
            .into_iter()
            .filter(|d| d.room_id == room_id)
            .collect()
    }

    /// Sends a temperature/mode command.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on socket timeouts or OS-level failures.
    async fn set_temperature_mode(&self, command: &SetTemperatureMode)
    -> Result<(), TransportError>;

    /// Re-polls every device and room.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on socket timeouts or OS-level failures.
    async fn update(&self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_builder_sets_fields() {
        let cmd = SetTemperatureMode::new(CommandTarget::Cube)
            .with_mode(DeviceMode::Boost)
            .with_temperature(21.0);
        assert_eq!(cmd.mode, Some(DeviceMode::Boost));
        assert_eq!(cmd.temperature, Some(21.0));
    }

    #[test]
    fn target_display() {
        let target = CommandTarget::Device {
            rf_address: RfAddress::new(0x12ab),
            room_id: 3,
        };
        assert_eq!(target.to_string(), "device 0012ab in room 3");
        assert_eq!(CommandTarget::Cube.to_string(), "cube");
    }
}
