// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-Cube handler shared by every entity of that Cube.
//!
//! The handler owns the gateway client and serializes writes to it: the RF
//! channel of a Cube cannot carry two transactions at once. Reads are not
//! synchronized. Each write runs through a small state machine:
//!
//! ```text
//! Idle -> Sending -> Settling -> Refreshing -> Idle
//! ```
//!
//! `Sending` holds the write lock while the command is on the wire.
//! `Settling` waits a fixed delay so the thermostats can act on it, and
//! `Refreshing` re-polls the Cube. A failed send is logged and the machine
//! still settles and refreshes, so entities show whatever the poll finds.
//!
//! Only `Sending` is exclusive, so commands may overlap while settling or
//! refreshing. The published phase covers all of them: it is the most
//! active phase of any command in flight and returns to `Idle` once the
//! last one has finished.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Mutex as WriteLock, watch};

use crate::config::CubeConfig;
use crate::error::Result;
use crate::gateway::{Cube, SetTemperatureMode};

/// Phase of the write state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandPhase {
    /// No command in flight.
    #[default]
    Idle,
    /// Command on the wire, write lock held.
    Sending,
    /// Waiting for the thermostats to act.
    Settling,
    /// Re-polling the Cube.
    Refreshing,
}

impl fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Sending => "sending",
            Self::Settling => "settling",
            Self::Refreshing => "refreshing",
        };
        f.write_str(name)
    }
}

/// Result of one pass through the write state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The gateway accepted the command.
    pub delivered: bool,
    /// The post-command poll succeeded.
    pub refreshed: bool,
    /// Transport error of a failed send.
    pub error: Option<String>,
}

/// Shared access to one Cube.
///
/// # Examples
///
/// ```
/// use maxcube_climate::gateway::memory::InMemoryCube;
/// use maxcube_climate::handler::{CommandPhase, CubeHandler};
/// use maxcube_climate::types::RfAddress;
/// use maxcube_climate::CubeConfig;
///
/// let cube = InMemoryCube::new("KEQ0000000", RfAddress::new(1));
/// let handler = CubeHandler::new(cube, &CubeConfig::new("cube.local"));
/// assert_eq!(handler.phase(), CommandPhase::Idle);
/// assert_eq!(handler.name(), "Home Cube");
/// assert_eq!(handler.address(), "cube.local:62910");
/// ```
#[derive(Debug)]
pub struct CubeHandler<C> {
    cube: C,
    name: String,
    address: String,
    settle_delay: Duration,
    scan_interval: Duration,
    write_lock: WriteLock<()>,
    in_flight: Mutex<InFlight>,
    phase: watch::Sender<CommandPhase>,
    last_outcome: Mutex<Option<CommandOutcome>>,
}

impl<C: Cube> CubeHandler<C> {
    /// Wraps a gateway client.
    #[must_use]
    pub fn new(cube: C, config: &CubeConfig) -> Self {
        let (phase, _) = watch::channel(CommandPhase::Idle);
        Self {
            cube,
            name: config.name.clone(),
            address: config.address(),
            settle_delay: config.settle_delay,
            scan_interval: config.scan_interval,
            write_lock: WriteLock::new(()),
            in_flight: Mutex::new(InFlight::default()),
            phase,
            last_outcome: Mutex::new(None),
        }
    }

    /// The gateway client.
    #[must_use]
    pub fn cube(&self) -> &C {
        &self.cube
    }

    /// Display name of the hub entity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `host:port` of the Cube, as configured.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Interval at which the entities of this Cube should be updated.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Current phase of the write state machine.
    #[must_use]
    pub fn phase(&self) -> CommandPhase {
        *self.phase.borrow()
    }

    /// Subscribes to phase transitions.
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<CommandPhase> {
        self.phase.subscribe()
    }

    /// Outcome of the most recent command, if any was sent.
    #[must_use]
    pub fn last_outcome(&self) -> Option<CommandOutcome> {
        self.last_outcome.lock().clone()
    }

    /// Sends a command, waits for the thermostats to settle and re-polls.
    ///
    /// Transport failures are logged, not returned; they are reported in
    /// the outcome and in [`last_outcome`](Self::last_outcome).
    pub async fn execute(&self, command: SetTemperatureMode) -> CommandOutcome {
        let write_lock = self.write_lock.lock().await;
        let mut phase = PhaseGuard::new(self, CommandPhase::Sending);
        tracing::debug!(
            cube = %self.address,
            addressee = %command.target,
            temperature = ?command.temperature,
            mode = ?command.mode,
            "Sending temperature/mode command"
        );
        let sent = self.cube.set_temperature_mode(&command).await;
        drop(write_lock);

        let error = match sent {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    cube = %self.address,
                    addressee = %command.target,
                    error = %e,
                    "Setting HVAC mode failed"
                );
                Some(e.to_string())
            }
        };

        phase.advance(CommandPhase::Settling);
        tokio::time::sleep(self.settle_delay).await;

        phase.advance(CommandPhase::Refreshing);
        let refreshed = self.refresh().await;
        drop(phase);

        let outcome = CommandOutcome {
            delivered: error.is_none(),
            refreshed,
            error,
        };
        *self.last_outcome.lock() = Some(outcome.clone());
        outcome
    }

    /// Re-polls the whole Cube.
    ///
    /// Returns `false` when the poll failed; the failure is logged and the
    /// previous poll stays visible.
    pub async fn refresh(&self) -> bool {
        match self.try_refresh().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(cube = %self.address, error = %e, "Failed to refresh Cube");
                false
            }
        }
    }

    /// Re-polls the whole Cube, returning the failure instead of logging it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` when the gateway cannot be polled.
    pub async fn try_refresh(&self) -> Result<()> {
        self.cube.update().await?;
        Ok(())
    }
}

impl<C> CubeHandler<C> {
    fn transition(&self, from: CommandPhase, to: CommandPhase) {
        let mut in_flight = self.in_flight.lock();
        if let Some(count) = in_flight.count_mut(from) {
            *count = count.saturating_sub(1);
        }
        if let Some(count) = in_flight.count_mut(to) {
            *count += 1;
        }
        let summary = in_flight.summary();
        tracing::trace!(cube = %self.address, %from, %to, phase = %summary, "Command phase");
        self.phase.send_if_modified(|current| {
            let changed = *current != summary;
            *current = summary;
            changed
        });
    }
}

/// Number of commands in each active phase.
#[derive(Debug, Default)]
struct InFlight {
    sending: usize,
    settling: usize,
    refreshing: usize,
}

impl InFlight {
    fn count_mut(&mut self, phase: CommandPhase) -> Option<&mut usize> {
        match phase {
            CommandPhase::Idle => None,
            CommandPhase::Sending => Some(&mut self.sending),
            CommandPhase::Settling => Some(&mut self.settling),
            CommandPhase::Refreshing => Some(&mut self.refreshing),
        }
    }

    fn summary(&self) -> CommandPhase {
        if self.sending > 0 {
            CommandPhase::Sending
        } else if self.refreshing > 0 {
            CommandPhase::Refreshing
        } else if self.settling > 0 {
            CommandPhase::Settling
        } else {
            CommandPhase::Idle
        }
    }
}

/// Phase of one command; returns it to `Idle` when dropped, also when the
/// command future is cancelled.
struct PhaseGuard<'a, C> {
    handler: &'a CubeHandler<C>,
    phase: CommandPhase,
}

impl<'a, C> PhaseGuard<'a, C> {
    fn new(handler: &'a CubeHandler<C>, phase: CommandPhase) -> Self {
        handler.transition(CommandPhase::Idle, phase);
        Self { handler, phase }
    }

    fn advance(&mut self, to: CommandPhase) {
        self.handler.transition(self.phase, to);
        self.phase = to;
    }
}

impl<C> Drop for PhaseGuard<'_, C> {
    fn drop(&mut self) {
        self.handler.transition(self.phase, CommandPhase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransportError};
    use crate::gateway::CommandTarget;
    use crate::gateway::memory::InMemoryCube;
    use crate::types::RfAddress;

    fn handler() -> CubeHandler<InMemoryCube> {
        CubeHandler::new(
            InMemoryCube::new("CUBE", RfAddress::new(1)),
            &CubeConfig::new("cube.local"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn execute_settles_then_refreshes() {
        let handler = handler();
        let start = tokio::time::Instant::now();

        let outcome = handler
            .execute(SetTemperatureMode::new(CommandTarget::Cube).with_temperature(20.0))
            .await;

        assert!(outcome.delivered);
        assert!(outcome.refreshed);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(handler.cube().update_count(), 1);
        assert_eq!(handler.phase(), CommandPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_still_refreshes() {
        let handler = handler();
        handler
            .cube()
            .fail_next_write(TransportError::Timeout(2000));

        let outcome = handler
            .execute(SetTemperatureMode::new(CommandTarget::Cube).with_temperature(20.0))
            .await;

        assert!(!outcome.delivered);
        assert_eq!(outcome.error.as_deref(), Some("request timed out after 2000 ms"));
        assert_eq!(handler.cube().update_count(), 1);
        assert_eq!(handler.last_outcome(), Some(outcome));
    }

    #[tokio::test(start_paused = true)]
    async fn phases_are_published_in_order() {
        let handler = handler();
        let mut rx = handler.subscribe_phase();

        let watcher = async {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let phase = *rx.borrow_and_update();
                seen.push(phase);
                if phase == CommandPhase::Idle {
                    break;
                }
            }
            seen
        };
        let command = handler.execute(SetTemperatureMode::new(CommandTarget::Cube));

        let (seen, _) = tokio::join!(watcher, command);
        assert!(seen.contains(&CommandPhase::Settling));
        assert_eq!(seen.last(), Some(&CommandPhase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_commands_keep_phase_until_last_finishes() {
        let handler = handler();
        let command = SetTemperatureMode::new(CommandTarget::Cube).with_temperature(20.0);

        let first = handler.execute(command);
        let second = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            handler.execute(command).await
        };
        let observed = async {
            tokio::time::sleep(Duration::from_millis(2100)).await;
            handler.phase()
        };

        let (_, _, phase) = tokio::join!(first, second, observed);
        assert_eq!(phase, CommandPhase::Settling);
        assert_eq!(handler.phase(), CommandPhase::Idle);
        assert_eq!(handler.cube().update_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_command_returns_to_idle() {
        let handler = handler();
        let command = SetTemperatureMode::new(CommandTarget::Cube).with_temperature(20.0);

        let result =
            tokio::time::timeout(Duration::from_secs(1), handler.execute(command)).await;

        assert!(result.is_err());
        assert_eq!(handler.phase(), CommandPhase::Idle);
        assert_eq!(handler.cube().commands().len(), 1);
    }

    #[tokio::test]
    async fn try_refresh_returns_transport_error() {
        let handler = handler();
        handler.cube().fail_next_update(TransportError::Timeout(500));

        assert!(matches!(
            handler.try_refresh().await,
            Err(Error::Transport(TransportError::Timeout(500)))
        ));
        assert!(handler.try_refresh().await.is_ok());
    }

    #[tokio::test]
    async fn refresh_failure_is_reported() {
        let handler = handler();
        handler
            .cube()
            .fail_next_update(TransportError::ConnectionFailed("refused".into()));
        assert!(!handler.refresh().await);
        assert!(handler.refresh().await);
    }
}
