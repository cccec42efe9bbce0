// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room-level views over the devices of one room.
//!
//! A wall thermostat has neither a valve nor a window-open setpoint of its
//! own; it borrows both from the radiator thermostats of its room. The
//! lookups here are computed from the current poll every time.

use crate::gateway::Device;

/// The devices of one room, in Cube order.
#[derive(Debug, Clone)]
pub struct RoomView {
    devices: Vec<Device>,
}

impl RoomView {
    /// Wraps the devices of a room.
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// Window-open setpoint of the first radiator that has one configured.
    #[must_use]
    pub fn window_open_temperature(&self) -> Option<f32> {
        self.devices
            .iter()
            .filter_map(Device::as_radiator)
            .map(|r| r.window_open_temperature)
            .find(|t| *t > 0.0)
    }

    /// Valve opening of the first radiator whose valve is open.
    #[must_use]
    pub fn heating_valve(&self) -> Option<u8> {
        self.devices
            .iter()
            .filter_map(Device::valve_position)
            .find(|v| *v > 0)
    }

    /// Valve opening of the first radiator, open or not.
    #[must_use]
    pub fn first_valve_position(&self) -> Option<u8> {
        self.devices.iter().find_map(Device::valve_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{RadiatorThermostat, Setpoints, WallThermostat};
    use crate::types::RfAddress;

    fn radiator(serial: &str, valve: u8, window_open: f32) -> Device {
        Device::radiator(
            serial,
            serial,
            RfAddress::new(serial.len().try_into().unwrap()),
            1,
            RadiatorThermostat::new(Setpoints::default())
                .with_valve_position(valve)
                .unwrap()
                .with_window_open_temperature(window_open),
        )
    }

    fn wall() -> Device {
        Device::wall(
            "W",
            "Wall",
            RfAddress::new(99),
            1,
            WallThermostat::new(Setpoints::default()),
        )
    }

    #[test]
    fn skips_closed_valves() {
        let room = RoomView::new(vec![wall(), radiator("R1", 0, 12.0), radiator("R22", 15, 12.0)]);
        assert_eq!(room.heating_valve(), Some(15));
        assert_eq!(room.first_valve_position(), Some(0));
    }

    #[test]
    fn skips_unset_window_open() {
        let room = RoomView::new(vec![radiator("R1", 0, 0.0), radiator("R22", 0, 10.0)]);
        assert_eq!(room.window_open_temperature(), Some(10.0));
    }

    #[test]
    fn wall_only_room() {
        let room = RoomView::new(vec![wall()]);
        assert_eq!(room.heating_valve(), None);
        assert_eq!(room.first_valve_position(), None);
        assert_eq!(room.window_open_temperature(), None);
    }
}
