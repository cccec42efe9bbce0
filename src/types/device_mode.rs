// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating modes reported and accepted by MAX! thermostats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The mode a MAX! thermostat runs in.
///
/// # Examples
///
/// ```
/// use maxcube_climate::types::DeviceMode;
///
/// assert_eq!(DeviceMode::Manual.as_num(), 1);
/// assert_eq!("boost".parse::<DeviceMode>().unwrap(), DeviceMode::Boost);
/// assert_eq!(DeviceMode::try_from(2).unwrap(), DeviceMode::Vacation);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Follows the weekly schedule programmed in the device.
    #[default]
    Automatic,
    /// Holds a fixed setpoint.
    Manual,
    /// Holds a fixed setpoint until a given date.
    Vacation,
    /// Opens the valve for the configured boost duration.
    Boost,
}

impl DeviceMode {
    /// Returns the numeric value used on the wire.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Automatic => 0,
            Self::Manual => 1,
            Self::Vacation => 2,
            Self::Boost => 3,
        }
    }

    /// Returns the lowercase name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
            Self::Vacation => "vacation",
            Self::Boost => "boost",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "automatic" | "auto" | "0" => Ok(Self::Automatic),
            "manual" | "1" => Ok(Self::Manual),
            "vacation" | "2" => Ok(Self::Vacation),
            "boost" | "3" => Ok(Self::Boost),
            _ => Err(ValueError::InvalidDeviceMode(s.to_string())),
        }
    }
}

impl TryFrom<u8> for DeviceMode {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Automatic),
            1 => Ok(Self::Manual),
            2 => Ok(Self::Vacation),
            3 => Ok(Self::Boost),
            other => Err(ValueError::InvalidDeviceMode(other.to_string())),
        }
    }
}
