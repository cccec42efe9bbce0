// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature constants of the MAX! protocol.
//!
//! The protocol reuses two setpoints as switches: [`OFF_TEMPERATURE`] closes
//! the valve for good and [`ON_TEMPERATURE`] opens it fully. Neither is a
//! real setpoint, so the climate entities translate them into the off mode
//! and the "On" preset instead of reporting them as targets.

/// Setpoint meaning "valve fully closed".
pub const OFF_TEMPERATURE: f32 = 4.5;

/// Setpoint meaning "valve fully open".
pub const ON_TEMPERATURE: f32 = 30.5;

/// Lowest setpoint that does not switch the thermostat off.
pub const MIN_TEMPERATURE: f32 = 5.0;

/// Highest setpoint that does not open the valve fully.
pub const MAX_TEMPERATURE: f32 = 30.0;

/// Placeholder target used by the hub entity before any command is sent.
pub const PLACEHOLDER_TEMPERATURE: f32 = (MIN_TEMPERATURE + MAX_TEMPERATURE) / 2.0;

/// The protocol works in half-degree steps; anything closer is the same value.
const TOLERANCE: f32 = 0.05;

/// Compares two setpoints at protocol resolution.
///
/// # Examples
///
/// ```
/// use maxcube_climate::types::same_temperature;
///
/// assert!(same_temperature(21.5, 21.5));
/// assert!(!same_temperature(21.5, 22.0));
/// ```
#[must_use]
pub fn same_temperature(a: f32, b: f32) -> bool {
    (a - b).abs() < TOLERANCE
}

/// Returns `true` for the off and on sentinels.
#[must_use]
pub fn is_sentinel(temperature: f32) -> bool {
    same_temperature(temperature, OFF_TEMPERATURE) || same_temperature(temperature, ON_TEMPERATURE)
}
