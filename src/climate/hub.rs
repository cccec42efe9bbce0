// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate entity standing for a whole Cube.
//!
//! The Cube has no sensor and no valve. Its entity addresses every
//! thermostat at once and keeps a synthetic setpoint of its own; the preset
//! temperatures are folded from the member thermostats on every poll.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;

use super::{
    Attributes, Change, ClimateEntity, PresetTemperatures, Setpoint, TemperatureRequest, attr,
    hvac_mode_change, hvac_mode_of, preset_change, preset_of, temperature_change, visible_target,
};
use crate::error::Result;
use crate::gateway::{CommandTarget, Cube, Device, DeviceKind};
use crate::handler::{CommandOutcome, CubeHandler};
use crate::types::{
    DeviceMode, HvacMode, MIN_TEMPERATURE, ON_TEMPERATURE, PLACEHOLDER_TEMPERATURE, Preset,
};

/// Preset temperatures of the Cube, folded from its thermostats.
///
/// Each value is the highest one configured on any member thermostat, or 0
/// when there is none. Window-open setpoints come from radiators only, as
/// wall thermostats do not carry one.
///
/// # Examples
///
/// ```
/// use maxcube_climate::climate::HubPresetTemperatures;
/// use maxcube_climate::gateway::{Device, RadiatorThermostat, Setpoints};
/// use maxcube_climate::types::{DeviceMode, RfAddress};
///
/// let devices: Vec<Device> = [16.0, 17.0]
///     .into_iter()
///     .enumerate()
///     .map(|(i, eco)| {
///         Device::radiator(
///             format!("R{i}"),
///             "Radiator",
///             RfAddress::new(i as u32),
///             1,
///             RadiatorThermostat::new(
///                 Setpoints::new(DeviceMode::Automatic, 20.0).with_presets(21.0, eco),
///             ),
///         )
///     })
///     .collect();
///
/// let presets = HubPresetTemperatures::from_devices(&devices);
/// assert!((presets.eco - 17.0).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HubPresetTemperatures {
    /// Highest comfort temperature.
    pub comfort: f32,
    /// Highest eco temperature.
    pub eco: f32,
    /// Highest window-open temperature.
    pub window_open: f32,
}

impl HubPresetTemperatures {
    /// Folds the preset temperatures of `devices`.
    #[must_use]
    pub fn from_devices(devices: &[Device]) -> Self {
        devices.iter().fold(Self::default(), |acc, device| {
            let setpoints = device.setpoints();
            let window_open = match &device.kind {
                DeviceKind::RadiatorThermostat(radiator) => radiator.window_open_temperature,
                DeviceKind::WallThermostat(_) => 0.0,
            };
            Self {
                comfort: acc.comfort.max(setpoints.comfort_temperature),
                eco: acc.eco.max(setpoints.eco_temperature),
                window_open: acc.window_open.max(window_open),
            }
        })
    }

    fn as_preset_temperatures(self) -> PresetTemperatures {
        PresetTemperatures {
            comfort: self.comfort,
            eco: self.eco,
            window_open: (self.window_open > 0.0).then_some(self.window_open),
        }
    }
}

/// Climate entity of a MAX! Cube.
///
/// Bounds are fixed to [`MIN_TEMPERATURE`] and [`ON_TEMPERATURE`] so the
/// "On" preset is always reachable. The entity starts in automatic mode
/// with [`PLACEHOLDER_TEMPERATURE`] as target.
#[derive(Debug)]
pub struct HubClimate<C> {
    handler: Arc<CubeHandler<C>>,
    name: String,
    serial: String,
    setpoint: RwLock<Setpoint>,
    presets: RwLock<HubPresetTemperatures>,
}

impl<C: Cube> HubClimate<C> {
    /// Creates the entity of the handler's Cube.
    #[must_use]
    pub fn new(handler: Arc<CubeHandler<C>>) -> Self {
        let presets = HubPresetTemperatures::from_devices(&handler.cube().devices());
        Self {
            name: handler.name().to_string(),
            serial: handler.cube().serial().to_string(),
            handler,
            setpoint: RwLock::new(Setpoint {
                mode: DeviceMode::Automatic,
                target: PLACEHOLDER_TEMPERATURE,
            }),
            presets: RwLock::new(presets),
        }
    }

    /// Current preset temperatures.
    #[must_use]
    pub fn preset_temperatures(&self) -> HubPresetTemperatures {
        *self.presets.read()
    }

    /// Synthetic operating mode.
    #[must_use]
    pub fn device_mode(&self) -> DeviceMode {
        self.setpoint.read().mode
    }

    fn recompute_presets(&self) {
        let presets = HubPresetTemperatures::from_devices(&self.handler.cube().devices());
        tracing::trace!(
            cube = %self.serial,
            comfort = presets.comfort,
            eco = presets.eco,
            window_open = presets.window_open,
            "Recomputed hub preset temperatures"
        );
        *self.presets.write() = presets;
    }

    async fn send(&self, change: Change) -> CommandOutcome {
        let (previous, intended) = {
            let mut setpoint = self.setpoint.write();
            let previous = *setpoint;
            *setpoint = change.apply_to(previous);
            if change.mode == Some(DeviceMode::Automatic) && change.temperature.is_none() {
                setpoint.target = PLACEHOLDER_TEMPERATURE;
            }
            (previous, *setpoint)
        };
        let outcome = self.handler.execute(change.command(CommandTarget::Cube)).await;
        if !outcome.delivered {
            // A later command may have replaced the setpoint meanwhile.
            let mut setpoint = self.setpoint.write();
            if *setpoint == intended {
                *setpoint = previous;
            }
        }
        if outcome.refreshed {
            self.recompute_presets();
        }
        outcome
    }
}

impl<C: Cube> ClimateEntity for HubClimate<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &str {
        &self.serial
    }

    fn min_temp(&self) -> f32 {
        MIN_TEMPERATURE
    }

    fn max_temp(&self) -> f32 {
        ON_TEMPERATURE
    }

    fn target_temperature(&self) -> Option<f32> {
        visible_target(self.setpoint.read().target, self.min_temp(), self.max_temp())
    }

    fn hvac_mode(&self) -> Option<HvacMode> {
        Some(hvac_mode_of(*self.setpoint.read()))
    }

    fn preset_mode(&self) -> Option<Preset> {
        Some(preset_of(
            *self.setpoint.read(),
            self.preset_temperatures().as_preset_temperatures(),
        ))
    }

    fn extra_state_attributes(&self) -> Attributes {
        let presets = self.preset_temperatures();
        let mut attributes = Attributes::new();
        attributes.insert(attr::WINDOW_OPEN_TEMP.into(), json!(presets.window_open));
        attributes.insert(attr::COMFORT_TEMP.into(), json!(presets.comfort));
        attributes.insert(attr::ECO_TEMP.into(), json!(presets.eco));
        attributes.insert(attr::DEVICE_ID.into(), json!(self.serial));
        attributes.insert(
            attr::DEVICE_RF_ADDRESS.into(),
            json!(self.handler.cube().rf_address().to_string()),
        );
        attributes
    }

    async fn set_hvac_mode(&self, mode: HvacMode) -> Result<CommandOutcome> {
        let change = hvac_mode_change(mode, *self.setpoint.read(), self.min_temp())?;
        Ok(self.send(change).await)
    }

    async fn set_temperature(&self, request: TemperatureRequest) -> Result<CommandOutcome> {
        let change = temperature_change(request)?;
        Ok(self.send(change).await)
    }

    async fn set_preset_mode(&self, preset: Preset) -> Result<CommandOutcome> {
        let change = preset_change(preset, self.preset_temperatures().as_preset_temperatures())?;
        Ok(self.send(change).await)
    }

    async fn update(&self) {
        if self.handler.refresh().await {
            self.recompute_presets();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CubeConfig;
    use crate::error::{Error, TransportError, ValueError};
    use crate::gateway::memory::InMemoryCube;
    use crate::gateway::{RadiatorThermostat, Room, Setpoints, WallThermostat};
    use crate::types::{OFF_TEMPERATURE, RfAddress, same_temperature};

    fn radiator(serial: &str, rf: u32, eco: f32, window_open: f32) -> Device {
        Device::radiator(
            serial,
            "Radiator",
            RfAddress::new(rf),
            1,
            RadiatorThermostat::new(
                Setpoints::new(DeviceMode::Automatic, 20.0).with_presets(21.0, eco),
            )
            .with_window_open_temperature(window_open),
        )
    }

    fn hub() -> HubClimate<InMemoryCube> {
        let cube = InMemoryCube::new("KEQCUBE", RfAddress::new(0x01_0203))
            .with_room(Room::new(1, "Living"))
            .with_device(radiator("R1", 1, 16.0, 10.0))
            .with_device(radiator("R2", 2, 17.0, 12.0))
            .with_device(Device::wall(
                "W1",
                "Wall",
                RfAddress::new(3),
                1,
                WallThermostat::new(
                    Setpoints::new(DeviceMode::Automatic, 20.0).with_presets(22.5, 15.0),
                ),
            ));
        HubClimate::new(Arc::new(CubeHandler::new(
            cube,
            &CubeConfig::new("cube.local"),
        )))
    }

    #[test]
    fn initial_state() {
        let hub = hub();
        assert_eq!(hub.name(), "Home Cube");
        assert_eq!(hub.unique_id(), "KEQCUBE");
        assert_eq!(hub.hvac_mode(), Some(HvacMode::Auto));
        assert_eq!(hub.target_temperature(), Some(PLACEHOLDER_TEMPERATURE));
        assert_eq!(hub.current_temperature(), None);
        assert_eq!(hub.hvac_action(), None);

        let presets = hub.preset_temperatures();
        assert!(same_temperature(presets.comfort, 22.5));
        assert!(same_temperature(presets.eco, 17.0));
        assert!(same_temperature(presets.window_open, 12.0));
    }

    #[test]
    fn empty_cube_presets_are_zero() {
        assert_eq!(
            HubPresetTemperatures::from_devices(&[]),
            HubPresetTemperatures::default()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn update_recomputes_presets() {
        let hub = hub();
        hub.handler
            .cube()
            .modify_device("R1", |d| d.setpoints_mut().eco_temperature = 18.0);

        hub.update().await;
        assert!(same_temperature(hub.preset_temperatures().eco, 18.0));
    }

    #[tokio::test(start_paused = true)]
    async fn mutators_update_synthetic_setpoint() {
        let hub = hub();

        hub.set_hvac_mode(HvacMode::Off).await.unwrap();
        assert_eq!(hub.hvac_mode(), Some(HvacMode::Off));
        assert_eq!(hub.target_temperature(), None);

        hub.set_hvac_mode(HvacMode::Heat).await.unwrap();
        assert_eq!(hub.hvac_mode(), Some(HvacMode::Heat));
        assert_eq!(hub.target_temperature(), Some(MIN_TEMPERATURE));

        hub.set_hvac_mode(HvacMode::Auto).await.unwrap();
        assert_eq!(hub.hvac_mode(), Some(HvacMode::Auto));
        assert_eq!(hub.target_temperature(), Some(PLACEHOLDER_TEMPERATURE));

        let sent = hub.handler.cube().commands();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|c| c.target == CommandTarget::Cube));
        assert_eq!(sent[0].temperature, Some(OFF_TEMPERATURE));
        assert_eq!(sent[2].temperature, None);
    }

    #[tokio::test(start_paused = true)]
    async fn on_preset_hides_target() {
        let hub = hub();
        hub.set_preset_mode(Preset::On).await.unwrap();
        assert_eq!(hub.preset_mode(), Some(Preset::On));
        assert_eq!(hub.target_temperature(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn boost_is_a_mode() {
        let hub = hub();
        hub.set_preset_mode(Preset::Boost).await.unwrap();
        assert_eq!(hub.device_mode(), DeviceMode::Boost);
        assert_eq!(hub.preset_mode(), Some(Preset::Boost));
        assert_eq!(hub.hvac_mode(), Some(HvacMode::Auto));
    }

    #[tokio::test(start_paused = true)]
    async fn set_temperature_requires_value() {
        let hub = hub();
        assert!(matches!(
            hub.set_temperature(TemperatureRequest::default()).await,
            Err(Error::Value(ValueError::MissingTemperature))
        ));
        assert!(hub.handler.cube().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_command_restores_setpoint() {
        let hub = hub();
        hub.handler
            .cube()
            .fail_next_write(TransportError::Timeout(3000));

        let outcome = hub.set_hvac_mode(HvacMode::Off).await.unwrap();

        assert!(!outcome.delivered);
        assert_eq!(hub.hvac_mode(), Some(HvacMode::Auto));
        assert_eq!(hub.target_temperature(), Some(PLACEHOLDER_TEMPERATURE));
        let modes: Vec<DeviceMode> = hub
            .handler
            .cube()
            .devices()
            .iter()
            .map(|d| d.setpoints().mode)
            .collect();
        assert!(modes.iter().all(|m| *m == DeviceMode::Automatic));
    }

    #[tokio::test(start_paused = true)]
    async fn window_open_needs_a_radiator() {
        let cube = InMemoryCube::new("KEQCUBE", RfAddress::new(1));
        let hub = HubClimate::new(Arc::new(CubeHandler::new(
            cube,
            &CubeConfig::new("cube.local"),
        )));

        assert!(matches!(
            hub.set_preset_mode(Preset::WindowOpen).await,
            Err(Error::Value(ValueError::UnsupportedPreset(_)))
        ));
        assert!(hub.handler.cube().commands().is_empty());
    }

    #[test]
    fn attributes_have_no_valve() {
        let attributes = hub().extra_state_attributes();
        assert!(!attributes.contains_key(attr::VALVE_POSITION));
        assert_eq!(attributes[attr::DEVICE_RF_ADDRESS], json!("010203"));
        assert_eq!(attributes[attr::ECO_TEMP], json!(17.0));
    }
}
