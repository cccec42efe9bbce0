// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `maxcube_climate` - climate and sensor entities for MAX! thermostats.
//!
//! This library projects the devices behind a MAX! Cube onto a
//! home-automation platform's climate abstraction. Talking to the Cube is
//! left to a gateway client implementing [`Cube`]; this crate maps device
//! state to HVAC modes, presets and actions, and turns control requests back
//! into the Cube's `set_temperature_mode` command.
//!
//! # Entities
//!
//! - [`DeviceClimate`]: one radiator or wall thermostat
//! - [`HubClimate`]: the whole Cube, with preset temperatures folded from
//!   its thermostats
//! - [`ValveSensor`]: valve opening of a radiator thermostat
//!
//! # Protocol Sentinels
//!
//! MAX! uses 4.5 °C for "off" and 30.5 °C for "fully open". Entities never
//! report these as target temperatures; they surface as the `off` HVAC mode
//! and the `On` preset.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use maxcube_climate::gateway::memory::InMemoryCube;
//! use maxcube_climate::gateway::{Device, RadiatorThermostat, Room, Setpoints};
//! use maxcube_climate::types::{DeviceMode, HvacMode, RfAddress};
//! use maxcube_climate::{ClimateEntity, CubeConfig, CubeHandler, setup_platform};
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() -> maxcube_climate::Result<()> {
//!     let cube = InMemoryCube::new("KEQ0000000", RfAddress::new(0x0a0000))
//!         .with_room(Room::new(1, "Living"))
//!         .with_device(Device::radiator(
//!             "KEQ0000001",
//!             "Window",
//!             RfAddress::new(0x0a0001),
//!             1,
//!             RadiatorThermostat::new(Setpoints::new(DeviceMode::Automatic, 21.0)),
//!         ));
//!     let handler = Arc::new(CubeHandler::new(cube, &CubeConfig::new("192.168.1.20")));
//!
//!     let entities = setup_platform(&[handler]);
//!     let thermostat = &entities.thermostats[0];
//!
//!     thermostat.set_hvac_mode(HvacMode::Off).await?;
//!     assert_eq!(thermostat.hvac_mode(), Some(HvacMode::Off));
//!     Ok(())
//! }
//! ```

pub mod climate;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
mod platform;
pub mod sensor;
pub mod types;

pub use climate::{
    ClimateEntity, ClimateFeatures, DeviceClimate, HubClimate, HubPresetTemperatures,
    TemperatureRequest, TemperatureUnit,
};
pub use config::CubeConfig;
pub use error::{Error, Result, TransportError, ValueError};
pub use gateway::{CommandTarget, Cube, Device, Room, SetTemperatureMode};
pub use handler::{CommandOutcome, CommandPhase, CubeHandler};
pub use platform::{Entities, setup_platform};
pub use sensor::{EntityCategory, ValveSensor};
pub use types::{DeviceMode, HvacAction, HvacMode, Preset, RfAddress};
