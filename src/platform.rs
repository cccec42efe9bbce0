// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity setup for all configured Cubes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::climate::{ClimateEntity, DeviceClimate, HubClimate};
use crate::gateway::Cube;
use crate::handler::CubeHandler;
use crate::sensor::ValveSensor;

/// Entities created for a set of Cubes.
#[derive(Debug)]
pub struct Entities<C> {
    /// One climate entity per radiator or wall thermostat.
    pub thermostats: Vec<DeviceClimate<C>>,
    /// One climate entity per Cube.
    pub hubs: Vec<HubClimate<C>>,
    /// One valve sensor per radiator thermostat.
    pub valves: Vec<ValveSensor<C>>,
}

impl<C> Default for Entities<C> {
    fn default() -> Self {
        Self {
            thermostats: Vec::new(),
            hubs: Vec::new(),
            valves: Vec::new(),
        }
    }
}

impl<C> Entities<C> {
    /// Total number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thermostats.len() + self.hubs.len() + self.valves.len()
    }

    /// Returns `true` when no entity was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Cube> Entities<C> {
    /// Updates every entity once, thermostats first.
    pub async fn update_all(&self) {
        for thermostat in &self.thermostats {
            thermostat.update().await;
        }
        for valve in &self.valves {
            valve.update().await;
        }
        for hub in &self.hubs {
            hub.update().await;
        }
    }

    /// Updates every entity each `scan_interval`, starting immediately.
    ///
    /// Never returns; cancel the future to stop polling. A round that
    /// overruns the interval delays the next one instead of bursting.
    pub async fn run(&self, scan_interval: Duration) {
        let mut ticker = tokio::time::interval(scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::debug!(entities = self.len(), "Updating MAX! entities");
            self.update_all().await;
        }
    }
}

/// Creates the entities of every handler.
///
/// Devices whose room is unknown to their Cube are skipped with a warning.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use maxcube_climate::gateway::memory::InMemoryCube;
/// use maxcube_climate::gateway::{Device, RadiatorThermostat, Room, Setpoints};
/// use maxcube_climate::handler::CubeHandler;
/// use maxcube_climate::types::RfAddress;
/// use maxcube_climate::{CubeConfig, setup_platform};
///
/// let cube = InMemoryCube::new("KEQ0000000", RfAddress::new(1))
///     .with_room(Room::new(1, "Hall"))
///     .with_device(Device::radiator(
///         "KEQ0000001",
///         "Radiator",
///         RfAddress::new(2),
///         1,
///         RadiatorThermostat::new(Setpoints::default()),
///     ));
/// let handler = Arc::new(CubeHandler::new(cube, &CubeConfig::new("cube.local")));
///
/// let entities = setup_platform(&[handler]);
/// assert_eq!(entities.thermostats.len(), 1);
/// assert_eq!(entities.hubs.len(), 1);
/// assert_eq!(entities.valves.len(), 1);
/// ```
#[must_use]
pub fn setup_platform<C: Cube>(handlers: &[Arc<CubeHandler<C>>]) -> Entities<C> {
    let mut entities = Entities::default();

    for handler in handlers {
        let devices = handler.cube().devices();
        tracing::debug!(
            cube = %handler.cube().serial(),
            devices = devices.len(),
            "Setting up MAX! entities"
        );

        for device in &devices {
            let climate = match DeviceClimate::new(Arc::clone(handler), device) {
                Ok(climate) => climate,
                Err(e) => {
                    tracing::warn!(serial = %device.serial, error = %e, "Skipping device");
                    continue;
                }
            };
            entities.thermostats.push(climate);
            if device.is_radiator() {
                match ValveSensor::new(Arc::clone(handler), device) {
                    Ok(sensor) => entities.valves.push(sensor),
                    Err(e) => {
                        tracing::warn!(serial = %device.serial, error = %e, "Skipping valve sensor");
                    }
                }
            }
        }

        entities.hubs.push(HubClimate::new(Arc::clone(handler)));
    }

    entities
}
