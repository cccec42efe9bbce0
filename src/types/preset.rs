// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Preset modes of MAX! climate entities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Named shortcut setpoints.
///
/// Comfort, eco and window-open map to temperatures configured in the
/// thermostat, `On` to the fully-open sentinel, `Boost` to the boost mode
/// and `None` to the weekly schedule. The remaining platform presets exist
/// so that requests for them can be recognised and rejected.
///
/// # Examples
///
/// ```
/// use maxcube_climate::types::Preset;
///
/// assert_eq!("Window Open".parse::<Preset>().unwrap(), Preset::WindowOpen);
/// assert_eq!(Preset::Comfort.as_str(), "comfort");
/// assert!(!Preset::Away.is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    /// No preset: the device follows its schedule.
    #[serde(rename = "none")]
    None,
    /// Configured comfort temperature.
    #[serde(rename = "comfort")]
    Comfort,
    /// Configured eco temperature.
    #[serde(rename = "eco")]
    Eco,
    /// Configured window-open temperature.
    #[serde(rename = "Window Open")]
    WindowOpen,
    /// Valve fully open.
    #[serde(rename = "On")]
    On,
    /// Boost mode.
    #[serde(rename = "boost")]
    Boost,
    /// Platform "away" preset, not offered by MAX!.
    #[serde(rename = "away")]
    Away,
    /// Platform "home" preset, not offered by MAX!.
    #[serde(rename = "home")]
    Home,
    /// Platform "sleep" preset, not offered by MAX!.
    #[serde(rename = "sleep")]
    Sleep,
    /// Platform "activity" preset, not offered by MAX!.
    #[serde(rename = "activity")]
    Activity,
}

impl Preset {
    /// Presets offered by MAX! climate entities, in display order.
    pub const SUPPORTED: [Self; 6] = [
        Self::None,
        Self::Comfort,
        Self::Eco,
        Self::WindowOpen,
        Self::On,
        Self::Boost,
    ];

    /// Returns the platform name of the preset.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Comfort => "comfort",
            Self::Eco => "eco",
            Self::WindowOpen => "Window Open",
            Self::On => "On",
            Self::Boost => "boost",
            Self::Away => "away",
            Self::Home => "home",
            Self::Sleep => "sleep",
            Self::Activity => "activity",
        }
    }

    /// Returns whether MAX! entities accept this preset.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Away | Self::Home | Self::Sleep | Self::Activity)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "comfort" => Ok(Self::Comfort),
            "eco" => Ok(Self::Eco),
            "Window Open" => Ok(Self::WindowOpen),
            "On" => Ok(Self::On),
            "boost" => Ok(Self::Boost),
            "away" => Ok(Self::Away),
            "home" => Ok(Self::Home),
            "sleep" => Ok(Self::Sleep),
            "activity" => Ok(Self::Activity),
            _ => Err(ValueError::UnsupportedPreset(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for preset in Preset::SUPPORTED {
            assert_eq!(preset.as_str().parse::<Preset>(), Ok(preset));
        }
    }

    #[test]
    fn unknown_preset_is_invalid() {
        assert_eq!(
            "party".parse::<Preset>(),
            Err(ValueError::UnsupportedPreset("party".to_string()))
        );
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&Preset::WindowOpen).unwrap();
        assert_eq!(json, "\"Window Open\"");
    }
}
