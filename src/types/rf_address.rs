// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RF address of a MAX! device.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 24-bit radio address of a MAX! device or Cube.
///
/// Displayed as six lowercase hex digits, the way the Cube reports it.
///
/// # Examples
///
/// ```
/// use maxcube_climate::types::RfAddress;
///
/// let address = RfAddress::new(0x0a_1b_2c);
/// assert_eq!(address.to_string(), "0a1b2c");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RfAddress(u32);

impl RfAddress {
    /// Largest address representable on the wire.
    pub const MAX: u32 = 0x00ff_ffff;

    /// Creates an address, masking anything above 24 bits.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value & Self::MAX)
    }

    /// Returns the numeric address.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RfAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}
