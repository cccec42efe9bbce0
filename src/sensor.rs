// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic sensor for the valve opening of a radiator thermostat.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::gateway::{Cube, Device};
use crate::handler::CubeHandler;

/// Category of an entity in the platform's UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    /// Read-only information about the device itself.
    Diagnostic,
}

/// Valve opening of one radiator thermostat, in percent.
///
/// The state stays unknown until the first [`update`](Self::update).
#[derive(Debug)]
pub struct ValveSensor<C> {
    handler: Arc<CubeHandler<C>>,
    serial: String,
    name: String,
    unique_id: String,
    state: RwLock<Option<u8>>,
}

impl<C: Cube> ValveSensor<C> {
    /// Creates the sensor for `device`.
    ///
    /// # Errors
    ///
    /// Returns `Error::RoomNotFound` when the device's room is unknown to
    /// the Cube.
    pub fn new(handler: Arc<CubeHandler<C>>, device: &Device) -> Result<Self> {
        let room = handler
            .cube()
            .room_by_id(device.room_id)
            .ok_or(Error::RoomNotFound(device.room_id))?;
        Ok(Self {
            name: format!("{} {} valve aperture", room.name, device.name),
            unique_id: format!("{}_valve_aperture", device.serial),
            serial: device.serial.clone(),
            handler,
            state: RwLock::new(None),
        })
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable unique id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Valve opening as of the last update.
    #[must_use]
    pub fn state(&self) -> Option<u8> {
        *self.state.read()
    }

    /// Unit of the state.
    #[must_use]
    pub fn unit_of_measurement(&self) -> &'static str {
        "%"
    }

    /// UI category.
    #[must_use]
    pub fn entity_category(&self) -> EntityCategory {
        EntityCategory::Diagnostic
    }

    /// Re-polls the Cube and reads the valve opening.
    pub async fn update(&self) {
        self.handler.refresh().await;
        let position = self
            .handler
            .cube()
            .device(&self.serial)
            .and_then(|d| d.valve_position());
        *self.state.write() = position;
    }
}
