// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HVAC modes and actions of the platform's climate abstraction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Operating mode requested from or reported by a climate entity.
///
/// The platform knows more modes than MAX! thermostats can express; only
/// [`HvacMode::SUPPORTED`] are accepted by the entities in this crate.
///
/// # Examples
///
/// ```
/// use maxcube_climate::types::HvacMode;
///
/// assert_eq!("heat".parse::<HvacMode>().unwrap(), HvacMode::Heat);
/// assert_eq!(HvacMode::FanOnly.as_str(), "fan_only");
/// assert!(!HvacMode::Cool.is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    /// Thermostat switched off.
    Off,
    /// Heating to a fixed target.
    Heat,
    /// Cooling to a fixed target.
    Cool,
    /// Heating or cooling to a range.
    HeatCool,
    /// Following a schedule.
    Auto,
    /// Dehumidifying.
    Dry,
    /// Fan without heating or cooling.
    FanOnly,
}

impl HvacMode {
    /// Modes offered by MAX! climate entities, in display order.
    pub const SUPPORTED: [Self; 3] = [Self::Off, Self::Auto, Self::Heat];

    /// Returns the platform name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::HeatCool => "heat_cool",
            Self::Auto => "auto",
            Self::Dry => "dry",
            Self::FanOnly => "fan_only",
        }
    }

    /// Returns whether MAX! entities accept this mode.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Off | Self::Auto | Self::Heat)
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            "heat_cool" => Ok(Self::HeatCool),
            "auto" => Ok(Self::Auto),
            "dry" => Ok(Self::Dry),
            "fan_only" => Ok(Self::FanOnly),
            _ => Err(ValueError::UnsupportedHvacMode(s.to_string())),
        }
    }
}

/// What the heating system is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacAction {
    /// Switched off.
    Off,
    /// On, but the valve is closed.
    Idle,
    /// The valve is open.
    Heating,
}

impl HvacAction {
    /// Returns the platform name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Idle => "idle",
            Self::Heating => "heating",
        }
    }
}

impl fmt::Display for HvacAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
