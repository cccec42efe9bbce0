// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A Cube that lives in memory.
//!
//! [`InMemoryCube`] keeps two device tables: the *live* one standing in for
//! the thermostats themselves, and the *polled* one that reads return.
//! Commands change the live table; [`update`](Cube::update) copies it over
//! the polled one. This mirrors how a real gateway only shows the effect of
//! a command after the next poll.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use super::{CommandTarget, Cube, Device, Room, SetTemperatureMode};
use crate::error::TransportError;
use crate::types::RfAddress;

/// In-memory implementation of [`Cube`].
///
/// # Examples
///
/// ```
/// use maxcube_climate::gateway::memory::InMemoryCube;
/// use maxcube_climate::gateway::{Cube, Device, RadiatorThermostat, Room, Setpoints};
/// use maxcube_climate::types::{DeviceMode, RfAddress};
///
/// let cube = InMemoryCube::new("KEQ0000000", RfAddress::new(0x0a0000))
///     .with_room(Room::new(1, "Living"))
///     .with_device(Device::radiator(
///         "KEQ0000001",
///         "Window",
///         RfAddress::new(0x0a0001),
///         1,
///         RadiatorThermostat::new(Setpoints::new(DeviceMode::Automatic, 21.0)),
///     ));
///
/// assert_eq!(cube.devices_by_room(1).len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryCube {
    serial: String,
    rf_address: RfAddress,
    rooms: RwLock<Vec<Room>>,
    polled: RwLock<Vec<Device>>,
    live: RwLock<Vec<Device>>,
    commands: Mutex<Vec<SetTemperatureMode>>,
    write_failures: Mutex<VecDeque<TransportError>>,
    update_failures: Mutex<VecDeque<TransportError>>,
    updates: AtomicUsize,
}

impl InMemoryCube {
    /// Creates an empty Cube.
    #[must_use]
    pub fn new(serial: impl Into<String>, rf_address: RfAddress) -> Self {
        Self {
            serial: serial.into(),
            rf_address,
            rooms: RwLock::new(Vec::new()),
            polled: RwLock::new(Vec::new()),
            live: RwLock::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            write_failures: Mutex::new(VecDeque::new()),
            update_failures: Mutex::new(VecDeque::new()),
            updates: AtomicUsize::new(0),
        }
    }

    /// Adds a room.
    #[must_use]
    pub fn with_room(self, room: Room) -> Self {
        self.rooms.write().push(room);
        self
    }

    /// Adds a device to both the live and the polled table.
    #[must_use]
    pub fn with_device(self, device: Device) -> Self {
        self.live.write().push(device.clone());
        self.polled.write().push(device);
        self
    }

    /// Changes a device on the live table, as if the thermostat itself changed.
    ///
    /// The change becomes visible after the next [`update`](Cube::update).
    /// Returns `false` when no device has that serial.
    pub fn modify_device(&self, serial: &str, change: impl FnOnce(&mut Device)) -> bool {
        let mut live = self.live.write();
        match live.iter_mut().find(|d| d.serial == serial) {
            Some(device) => {
                change(device);
                true
            }
            None => false,
        }
    }

    /// Makes the next write command fail with `error`.
    pub fn fail_next_write(&self, error: TransportError) {
        self.write_failures.lock().push_back(error);
    }

    /// Makes the next update fail with `error`.
    pub fn fail_next_update(&self, error: TransportError) {
        self.update_failures.lock().push_back(error);
    }

    /// Commands accepted so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<SetTemperatureMode> {
        self.commands.lock().clone()
    }

    /// Number of successful updates.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn apply(command: &SetTemperatureMode, device: &mut Device) {
        let setpoints = device.setpoints_mut();
        if let Some(mode) = command.mode {
            setpoints.mode = mode;
        }
        if let Some(temperature) = command.temperature {
            setpoints.target_temperature = temperature;
        }
    }
}

impl Cube for InMemoryCube {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn rf_address(&self) -> RfAddress {
        self.rf_address
    }

    fn devices(&self) -> Vec<Device> {
        self.polled.read().clone()
    }

    fn rooms(&self) -> Vec<Room> {
        self.rooms.read().clone()
    }

    async fn set_temperature_mode(
        &self,
        command: &SetTemperatureMode,
    ) -> Result<(), TransportError> {
        if let Some(error) = self.write_failures.lock().pop_front() {
            return Err(error);
        }

        let mut live = self.live.write();
        match command.target {
            CommandTarget::Device { rf_address, .. } => {
                let device = live
                    .iter_mut()
                    .find(|d| d.rf_address == rf_address)
                    .ok_or_else(|| {
                        TransportError::ConnectionFailed(format!("no device at {rf_address}"))
                    })?;
                Self::apply(command, device);
            }
            CommandTarget::Cube => {
                for device in live.iter_mut() {
                    Self::apply(command, device);
                }
            }
        }

        self.commands.lock().push(*command);
        Ok(())
    }

    async fn update(&self) -> Result<(), TransportError> {
        if let Some(error) = self.update_failures.lock().pop_front() {
            return Err(error);
        }
        let live = self.live.read().clone();
        *self.polled.write() = live;
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
