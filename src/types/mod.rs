// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the gateway model and the climate entities.
//!
//! # Examples
//!
//! ```
//! use maxcube_climate::types::{DeviceMode, HvacMode, Preset, OFF_TEMPERATURE};
//!
//! assert_eq!(DeviceMode::Boost.as_num(), 3);
//! assert_eq!(HvacMode::Auto.to_string(), "auto");
//! assert_eq!(Preset::On.to_string(), "On");
//! assert!((OFF_TEMPERATURE - 4.5).abs() < f32::EPSILON);
//! ```

mod device_mode;
mod hvac;
mod preset;
mod rf_address;
mod temperature;

pub use device_mode::DeviceMode;
pub use hvac::{HvacAction, HvacMode};
pub use preset::Preset;
pub use rf_address::RfAddress;
pub use temperature::{
    MAX_TEMPERATURE, MIN_TEMPERATURE, OFF_TEMPERATURE, ON_TEMPERATURE, PLACEHOLDER_TEMPERATURE,
    is_sentinel, same_temperature,
};
