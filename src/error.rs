// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the MAX! climate layer.
//!
//! Two families matter to callers: [`ValueError`] is returned synchronously
//! when a control request carries an unsupported mode, preset or a missing
//! temperature, and [`TransportError`] describes a failed exchange with the
//! Cube gateway. Write failures are logged and absorbed by the handler, so
//! the latter mostly surfaces through [`CommandOutcome`](crate::handler::CommandOutcome)
//! and [`CubeHandler::try_refresh`](crate::handler::CubeHandler::try_refresh).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A control request carried an invalid argument.
    #[error("invalid argument: {0}")]
    Value(#[from] ValueError),

    /// Communication with the Cube gateway failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device is no longer known to the gateway.
    #[error("device {0} not found")]
    DeviceNotFound(String),

    /// The room referenced by a device is not known to the gateway.
    #[error("room {0} not found")]
    RoomNotFound(u8),
}

/// Errors caused by invalid control arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The HVAC mode is not one of off, auto or heat.
    #[error("unsupported HVAC mode {0}")]
    UnsupportedHvacMode(String),

    /// The preset is not offered by MAX! thermostats.
    #[error("unsupported preset mode {0}")]
    UnsupportedPreset(String),

    /// `set_temperature` was called without a temperature.
    #[error("no temperature parameter passed to set_temperature")]
    MissingTemperature,

    /// A device mode string or number could not be parsed.
    #[error("invalid device mode: {0}")]
    InvalidDeviceMode(String),

    /// A valve position above 100 percent was reported.
    #[error("valve position {0} is out of range [0, 100]")]
    ValvePositionOutOfRange(u8),
}

/// Errors raised by the Cube gateway client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The gateway did not answer in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// OS-level socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The gateway connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::UnsupportedHvacMode("cool".to_string());
        assert_eq!(err.to_string(), "unsupported HVAC mode cool");
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::MissingTemperature.into();
        assert!(matches!(err, Error::Value(ValueError::MissingTemperature)));
    }

    #[test]
    fn transport_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: Error = TransportError::from(io).into();
        assert_eq!(err.to_string(), "transport error: I/O error: reset by peer");
    }

    #[test]
    fn timeout_display() {
        assert_eq!(
            TransportError::Timeout(2000).to_string(),
            "request timed out after 2000 ms"
        );
    }
}
