// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration of a Cube handler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default TCP port of the MAX! Cube.
pub const DEFAULT_PORT: u16 = 62910;

/// Default display name of the hub climate entity.
pub const DEFAULT_HUB_NAME: &str = "Home Cube";

/// Default pause between a write command and the following poll.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Default interval between platform polls.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for one Cube.
///
/// Durations are (de)serialized as whole seconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use maxcube_climate::CubeConfig;
///
/// let config = CubeConfig::new("192.168.1.20")
///     .with_name("Upstairs")
///     .with_settle_delay(Duration::from_secs(3));
/// assert_eq!(config.port, 62910);
///
/// let parsed: CubeConfig = serde_json::from_str(r#"{"host": "10.0.0.5"}"#).unwrap();
/// assert_eq!(parsed.name, "Home Cube");
/// assert_eq!(parsed.settle_delay, Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeConfig {
    /// Host name or IP address of the Cube.
    pub host: String,
    /// TCP port of the Cube.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Display name of the hub climate entity.
    #[serde(default = "default_name")]
    pub name: String,
    /// Pause after a write command before re-polling.
    #[serde(default = "default_settle_delay", with = "duration_secs")]
    pub settle_delay: Duration,
    /// Interval at which the platform polls the entities.
    #[serde(default = "default_scan_interval", with = "duration_secs")]
    pub scan_interval: Duration,
}

impl CubeConfig {
    /// Creates a configuration with default port, name and timings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            name: DEFAULT_HUB_NAME.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    /// Sets the TCP port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the hub entity name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the scan interval.
    #[must_use]
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// `host:port` of the Cube.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_name() -> String {
    DEFAULT_HUB_NAME.to_string()
}

fn default_settle_delay() -> Duration {
    DEFAULT_SETTLE_DELAY
}

fn default_scan_interval() -> Duration {
    DEFAULT_SCAN_INTERVAL
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
