// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate entity for a single radiator or wall thermostat.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::json;

use super::{
    Attributes, Change, ClimateEntity, PresetTemperatures, RoomView, Setpoint, TemperatureRequest,
    attr, effective_max, effective_min, hvac_mode_change, hvac_mode_of, preset_change, preset_of,
    temperature_change, visible_target,
};
use crate::error::{Error, Result};
use crate::gateway::{CommandTarget, Cube, Device, DeviceKind};
use crate::handler::{CommandOutcome, CubeHandler};
use crate::types::{HvacAction, HvacMode, Preset};

/// Climate entity of one MAX! thermostat.
///
/// Holds no device state of its own: every read looks the device up in the
/// Cube's last poll. The only local state is the setpoint of a command that
/// has been sent but not yet confirmed by a poll. Of overlapping commands on
/// the same entity, the latest one is shown until its own poll confirms it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use maxcube_climate::climate::{ClimateEntity, DeviceClimate};
/// use maxcube_climate::gateway::memory::InMemoryCube;
/// use maxcube_climate::gateway::{Cube, Device, RadiatorThermostat, Room, Setpoints};
/// use maxcube_climate::handler::CubeHandler;
/// use maxcube_climate::types::{DeviceMode, HvacMode, RfAddress};
/// use maxcube_climate::CubeConfig;
///
/// let cube = InMemoryCube::new("KEQ0000000", RfAddress::new(1))
///     .with_room(Room::new(1, "Kitchen"))
///     .with_device(Device::radiator(
///         "KEQ0000001",
///         "Radiator",
///         RfAddress::new(2),
///         1,
///         RadiatorThermostat::new(Setpoints::new(DeviceMode::Manual, 4.5)),
///     ));
/// let handler = Arc::new(CubeHandler::new(cube, &CubeConfig::new("cube.local")));
/// let device = handler.cube().device("KEQ0000001").unwrap();
///
/// let climate = DeviceClimate::new(Arc::clone(&handler), &device).unwrap();
/// assert_eq!(climate.name(), "Kitchen Radiator");
/// assert_eq!(climate.hvac_mode(), Some(HvacMode::Off));
/// assert_eq!(climate.target_temperature(), None);
/// ```
#[derive(Debug)]
pub struct DeviceClimate<C> {
    handler: Arc<CubeHandler<C>>,
    serial: String,
    name: String,
    room_id: u8,
    pending: RwLock<Option<Pending>>,
    commands: AtomicU64,
}

/// Optimistic overlay of the latest command.
#[derive(Debug, Clone, Copy)]
struct Pending {
    id: u64,
    change: Change,
    /// The command finished but its poll failed; the next successful poll
    /// clears the overlay.
    settled: bool,
}

impl<C: Cube> DeviceClimate<C> {
    /// Creates the entity for `device`.
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
            name: format!("{} {}", room.name, device.name),
            serial: device.serial.clone(),
            room_id: device.room_id,
            handler,
            pending: RwLock::new(None),
            commands: AtomicU64::new(0),
        })
    }

    /// Room the device belongs to.
    #[must_use]
    pub fn room_id(&self) -> u8 {
        self.room_id
    }

    /// Returns `true` while the device is part of the last poll.
    #[must_use]
    pub fn available(&self) -> bool {
        self.device().is_some()
    }

    /// Window-open setpoint, taken from the room's radiators for a wall
    /// thermostat.
    #[must_use]
    pub fn window_open_temperature(&self) -> Option<f32> {
        self.device()
            .and_then(|device| self.preset_temperatures(&device).window_open)
    }

    fn device(&self) -> Option<Device> {
        self.handler.cube().device(&self.serial)
    }

    fn room(&self) -> RoomView {
        RoomView::new(self.handler.cube().devices_by_room(self.room_id))
    }

    fn setpoint(&self, device: &Device) -> Setpoint {
        let polled = Setpoint::from(device.setpoints());
        match *self.pending.read() {
            Some(pending) => pending.change.apply_to(polled),
            None => polled,
        }
    }

    fn preset_temperatures(&self, device: &Device) -> PresetTemperatures {
        let setpoints = device.setpoints();
        let window_open = match &device.kind {
            DeviceKind::RadiatorThermostat(radiator) => {
                let window_open = radiator.window_open_temperature;
                (window_open > 0.0).then_some(window_open)
            }
            DeviceKind::WallThermostat(_) => self.room().window_open_temperature(),
        };
        PresetTemperatures {
            comfort: setpoints.comfort_temperature,
            eco: setpoints.eco_temperature,
            window_open,
        }
    }

    fn require_device(&self) -> Result<Device> {
        self.device()
            .ok_or_else(|| Error::DeviceNotFound(self.serial.clone()))
    }

    async fn send(&self, device: &Device, change: Change) -> CommandOutcome {
        let id = self.commands.fetch_add(1, Ordering::Relaxed);
        *self.pending.write() = Some(Pending {
            id,
            change,
            settled: false,
        });
        let outcome = self
            .handler
            .execute(change.command(CommandTarget::device(device)))
            .await;

        let mut pending = self.pending.write();
        if pending.is_some_and(|p| p.id == id) {
            if outcome.refreshed || !outcome.delivered {
                *pending = None;
            } else if let Some(current) = pending.as_mut() {
                current.settled = true;
            }
        }
        outcome
    }
}

impl<C: Cube> ClimateEntity for DeviceClimate<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &str {
        &self.serial
    }

    fn min_temp(&self) -> f32 {
        effective_min(self.device().and_then(|d| d.setpoints().min_temperature))
    }

    fn max_temp(&self) -> f32 {
        effective_max(self.device().and_then(|d| d.setpoints().max_temperature))
    }

    fn current_temperature(&self) -> Option<f32> {
        self.device().and_then(|d| d.actual_temperature())
    }

    fn target_temperature(&self) -> Option<f32> {
        let device = self.device()?;
        let setpoints = device.setpoints();
        visible_target(
            self.setpoint(&device).target,
            effective_min(setpoints.min_temperature),
            effective_max(setpoints.max_temperature),
        )
    }

    fn hvac_mode(&self) -> Option<HvacMode> {
        self.device().map(|d| hvac_mode_of(self.setpoint(&d)))
    }

    fn hvac_action(&self) -> Option<HvacAction> {
        let device = self.device()?;
        let valve = match device.valve_position() {
            Some(own) => own,
            None => self.room().heating_valve().unwrap_or(0),
        };
        if valve > 0 {
            return Some(HvacAction::Heating);
        }
        if hvac_mode_of(self.setpoint(&device)) == HvacMode::Off {
            Some(HvacAction::Off)
        } else {
            Some(HvacAction::Idle)
        }
    }

    fn preset_mode(&self) -> Option<Preset> {
        let device = self.device()?;
        Some(preset_of(
            self.setpoint(&device),
            self.preset_temperatures(&device),
        ))
    }

    fn extra_state_attributes(&self) -> Attributes {
        let Some(device) = self.device() else {
            return Attributes::new();
        };
        let setpoints = device.setpoints();
        let mut attributes = Attributes::new();

        match &device.kind {
            DeviceKind::RadiatorThermostat(radiator) => {
                let decalc = radiator.decalcification;
                attributes.insert(attr::VALVE_POSITION.into(), json!(radiator.valve_position()));
                attributes.insert(
                    attr::WINDOW_OPEN_TEMP.into(),
                    json!(radiator.window_open_temperature),
                );
                attributes.insert(
                    attr::TEMPERATURE_OFFSET.into(),
                    json!(radiator.temperature_offset),
                );
                attributes.insert(
                    attr::WINDOW_OPEN_DURATION.into(),
                    json!(radiator.window_open_duration),
                );
                attributes.insert(attr::BOOST_VALUE.into(), json!(radiator.boost_value));
                attributes.insert(attr::BOOST_DURATION.into(), json!(radiator.boost_duration));
                attributes.insert(
                    attr::DECALC_DAY.into(),
                    json!(decalc.map(|d| d.day.to_string())),
                );
                attributes.insert(
                    attr::DECALC_TIME.into(),
                    json!(decalc.map(|d| d.time.format("%H:%M").to_string())),
                );
                attributes.insert(attr::MAX_VALVE.into(), json!(radiator.max_valve));
                attributes.insert(attr::VALVE_OFFSET.into(), json!(radiator.valve_offset));
            }
            DeviceKind::WallThermostat(_) => {
                let room = self.room();
                attributes.insert(
                    attr::VALVE_POSITION.into(),
                    json!(room.first_valve_position()),
                );
                attributes.insert(
                    attr::WINDOW_OPEN_TEMP.into(),
                    json!(room.window_open_temperature()),
                );
            }
        }

        attributes.insert(attr::COMFORT_TEMP.into(), json!(setpoints.comfort_temperature));
        attributes.insert(attr::ECO_TEMP.into(), json!(setpoints.eco_temperature));
        attributes.insert(attr::ROOM.into(), json!(self.room_id));
        attributes.insert(attr::DEVICE_ID.into(), json!(self.serial));
        attributes.insert(
            attr::DEVICE_RF_ADDRESS.into(),
            json!(device.rf_address.to_string()),
        );
        attributes
    }

    async fn set_hvac_mode(&self, mode: HvacMode) -> Result<CommandOutcome> {
        let device = self.require_device()?;
        let change = hvac_mode_change(mode, self.setpoint(&device), self.min_temp())?;
        Ok(self.send(&device, change).await)
    }

    async fn set_temperature(&self, request: TemperatureRequest) -> Result<CommandOutcome> {
        let change = temperature_change(request)?;
        let device = self.require_device()?;
        Ok(self.send(&device, change).await)
    }

    async fn set_preset_mode(&self, preset: Preset) -> Result<CommandOutcome> {
        let device = self.require_device()?;
        let change = preset_change(preset, self.preset_temperatures(&device))?;
        Ok(self.send(&device, change).await)
    }

    async fn update(&self) {
        if self.handler.refresh().await {
            let mut pending = self.pending.write();
            if pending.is_some_and(|p| p.settled) {
                *pending = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::CubeConfig;
    use crate::error::{TransportError, ValueError};
    use crate::gateway::memory::InMemoryCube;
    use crate::gateway::{RadiatorThermostat, Room, Setpoints, WallThermostat};
    use crate::types::{DeviceMode, OFF_TEMPERATURE, RfAddress};

    fn radiator(serial: &str, rf: u32, setpoints: Setpoints, valve: u8) -> Device {
        Device::radiator(
            serial,
            "Radiator",
            RfAddress::new(rf),
            1,
            RadiatorThermostat::new(setpoints)
                .with_valve_position(valve)
                .unwrap()
                .with_actual_temperature(19.5),
        )
    }

    fn handler(devices: Vec<Device>) -> Arc<CubeHandler<InMemoryCube>> {
        let cube = devices.into_iter().fold(
            InMemoryCube::new("CUBE", RfAddress::new(0xff)).with_room(Room::new(1, "Bathroom")),
            InMemoryCube::with_device,
        );
        Arc::new(CubeHandler::new(cube, &CubeConfig::new("cube.local")))
    }

    fn climate(handler: &Arc<CubeHandler<InMemoryCube>>, serial: &str) -> DeviceClimate<InMemoryCube> {
        let device = handler.cube().device(serial).unwrap();
        DeviceClimate::new(Arc::clone(handler), &device).unwrap()
    }

    #[test]
    fn unknown_room_is_rejected() {
        let handler = handler(vec![]);
        let mut device = radiator("R1", 1, Setpoints::default(), 0);
        device.room_id = 7;
        assert!(matches!(
            DeviceClimate::new(handler, &device),
            Err(Error::RoomNotFound(7))
        ));
    }

    #[test]
    fn off_scenario() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Manual, OFF_TEMPERATURE),
            0,
        )]);
        let climate = climate(&handler, "R1");
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Off));
        assert_eq!(climate.hvac_action(), Some(HvacAction::Off));
        assert_eq!(climate.target_temperature(), None);
        assert_eq!(climate.current_temperature(), Some(19.5));
    }

    #[test]
    fn open_valve_means_heating_in_any_mode() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Manual, OFF_TEMPERATURE),
            40,
        )]);
        assert_eq!(climate(&handler, "R1").hvac_action(), Some(HvacAction::Heating));
    }

    #[test]
    fn min_temp_hides_off_sentinel() {
        let setpoints =
            Setpoints::new(DeviceMode::Manual, 21.0).with_bounds(Some(OFF_TEMPERATURE), None);
        let handler = handler(vec![radiator("R1", 1, setpoints, 0)]);
        let climate = climate(&handler, "R1");
        assert!((climate.min_temp() - 5.0).abs() < f32::EPSILON);
        assert!((climate.max_temp() - 30.0).abs() < f32::EPSILON);
        assert_eq!(climate.target_temperature(), Some(21.0));
    }

    #[test]
    fn wall_thermostat_borrows_from_room() {
        let wall = Device::wall(
            "W1",
            "Wall",
            RfAddress::new(9),
            1,
            WallThermostat::new(Setpoints::new(DeviceMode::Manual, 12.0)),
        );
        let handler = handler(vec![
            wall,
            radiator("R1", 1, Setpoints::default(), 0),
            radiator("R2", 2, Setpoints::default(), 15),
        ]);
        let climate = climate(&handler, "W1");

        assert_eq!(climate.hvac_action(), Some(HvacAction::Heating));
        assert_eq!(climate.window_open_temperature(), Some(12.0));
        assert_eq!(climate.preset_mode(), Some(Preset::WindowOpen));
        assert_eq!(climate.current_temperature(), None);

        let attributes = climate.extra_state_attributes();
        assert_eq!(attributes[attr::VALVE_POSITION], json!(0));
        assert_eq!(attributes[attr::WINDOW_OPEN_TEMP], json!(12.0));
        assert!(!attributes.contains_key(attr::BOOST_VALUE));
    }

    #[test]
    fn radiator_attributes() {
        let handler = handler(vec![radiator("R1", 0x0a0b0c, Setpoints::default(), 30)]);
        let attributes = climate(&handler, "R1").extra_state_attributes();
        assert_eq!(attributes[attr::VALVE_POSITION], json!(30));
        assert_eq!(attributes[attr::DEVICE_ID], json!("R1"));
        assert_eq!(attributes[attr::DEVICE_RF_ADDRESS], json!("0a0b0c"));
        assert_eq!(attributes[attr::ROOM], json!(1));
        assert_eq!(attributes[attr::DECALC_DAY], serde_json::Value::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn hvac_mode_round_trips() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Manual, 21.0),
            0,
        )]);
        let climate = climate(&handler, "R1");

        climate.set_hvac_mode(HvacMode::Off).await.unwrap();
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Off));

        climate.set_hvac_mode(HvacMode::Heat).await.unwrap();
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
        assert_eq!(climate.target_temperature(), Some(5.0));

        climate.set_hvac_mode(HvacMode::Auto).await.unwrap();
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Auto));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_arguments_send_nothing() {
        let handler = handler(vec![radiator("R1", 1, Setpoints::default(), 0)]);
        let climate = climate(&handler, "R1");

        assert!(matches!(
            climate.set_hvac_mode(HvacMode::Cool).await,
            Err(Error::Value(ValueError::UnsupportedHvacMode(_)))
        ));
        assert!(matches!(
            climate.set_temperature(TemperatureRequest::default()).await,
            Err(Error::Value(ValueError::MissingTemperature))
        ));
        assert!(matches!(
            climate.set_preset_mode(Preset::Sleep).await,
            Err(Error::Value(ValueError::UnsupportedPreset(_)))
        ));
        assert!(handler.cube().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_temperature_keeps_mode_without_hint() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Automatic, 21.0),
            0,
        )]);
        let climate = climate(&handler, "R1");

        climate
            .set_temperature(TemperatureRequest::new(23.0))
            .await
            .unwrap();

        let sent = handler.cube().commands();
        assert_eq!(sent[0].mode, None);
        assert_eq!(sent[0].temperature, Some(23.0));
        assert_eq!(climate.target_temperature(), Some(23.0));
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Auto));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_setpoint_shown_until_poll_succeeds() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Automatic, 21.0),
            0,
        )]);
        let climate = climate(&handler, "R1");
        handler
            .cube()
            .fail_next_update(TransportError::Timeout(1000));

        let outcome = climate.set_preset_mode(Preset::Eco).await.unwrap();
        assert!(outcome.delivered);
        assert!(!outcome.refreshed);
        assert_eq!(climate.preset_mode(), Some(Preset::Eco));

        climate.update().await;
        assert_eq!(climate.preset_mode(), Some(Preset::Eco));
        assert!(handler.cube().commands()[0].mode.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_command_shows_polled_state() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Manual, 21.0),
            0,
        )]);
        let climate = climate(&handler, "R1");
        handler
            .cube()
            .fail_next_write(TransportError::Io(std::io::Error::other("broken pipe")));

        let outcome = climate.set_hvac_mode(HvacMode::Off).await.unwrap();
        assert!(!outcome.delivered);
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
        assert_eq!(handler.cube().update_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn radiator_without_window_open_setpoint() {
        let device = Device::radiator(
            "R1",
            "Radiator",
            RfAddress::new(1),
            1,
            RadiatorThermostat::new(Setpoints::new(DeviceMode::Automatic, 21.0))
                .with_window_open_temperature(0.0),
        );
        let handler = handler(vec![device]);
        let climate = climate(&handler, "R1");

        assert_eq!(climate.window_open_temperature(), None);
        assert!(matches!(
            climate.set_preset_mode(Preset::WindowOpen).await,
            Err(Error::Value(ValueError::UnsupportedPreset(_)))
        ));
        assert!(handler.cube().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_commands_keep_latest_overlay() {
        let handler = handler(vec![radiator(
            "R1",
            1,
            Setpoints::new(DeviceMode::Manual, 21.0),
            0,
        )]);
        let climate = climate(&handler, "R1");

        let first = climate.set_temperature(TemperatureRequest::new(23.0));
        let second = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            climate.set_temperature(TemperatureRequest::new(25.0)).await
        };
        let observed = async {
            tokio::time::sleep(Duration::from_millis(2100)).await;
            let overlay = climate.pending.read().map(|p| p.change.temperature);
            (overlay, climate.target_temperature())
        };

        let (first, second, (overlay, target)) = tokio::join!(first, second, observed);
        assert!(first.unwrap().refreshed);
        assert!(second.unwrap().refreshed);
        assert_eq!(overlay, Some(Some(25.0)));
        assert_eq!(target, Some(25.0));
        assert!(climate.pending.read().is_none());
        assert_eq!(climate.target_temperature(), Some(25.0));
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_device_is_unavailable() {
        let handler = handler(vec![]);
        let device = radiator("R1", 1, Setpoints::default(), 0);
        let climate = DeviceClimate::new(Arc::clone(&handler), &device).unwrap();

        assert!(!climate.available());
        assert_eq!(climate.hvac_mode(), None);
        assert!(climate.extra_state_attributes().is_empty());
        assert!(matches!(
            climate.set_preset_mode(Preset::Comfort).await,
            Err(Error::DeviceNotFound(serial)) if serial == "R1"
        ));
    }
}
