//! Resource channel: protocol driver for the attached laser controller.
//!
//! The channel owns the transport and the last known [`ResourceState`].
//! Every operation is one request line; read-type operations additionally
//! wait for one reply. A failed or malformed exchange is logged and the
//! previous state is kept, so callers can always fall back to
//! [`ResourceChannel::state`].

use lasergate_common::credential::Credential;
use lasergate_common::hal::{HalError, Transport};
use lasergate_common::protocol::{self, Command};
use tracing::{debug, trace, warn};

/// Last known state of the attached controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceState {
    /// Hardware odometer (firmware time units).
    pub odometer: u64,
    /// Firing line enabled, as last commanded successfully.
    pub enabled: bool,
    /// A credential is waiting to be read.
    pub scan_pending: bool,
}

/// Synchronous request/reply driver over a [`Transport`].
pub struct ResourceChannel {
    transport: Box<dyn Transport>,
    state: ResourceState,
    /// Count of failed or malformed exchanges.
    fault_count: u64,
}

impl ResourceChannel {
    /// Wrap an open transport. The firing line is assumed disabled until
    /// the first successful `enable()`.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        debug!("Resource channel over '{}' transport", transport.name());
        Self {
            transport,
            state: ResourceState::default(),
            fault_count: 0,
        }
    }

    /// Name of the underlying transport.
    #[inline]
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Last known resource state.
    #[inline]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Whether the firing line is enabled.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Number of failed or malformed exchanges since creation.
    #[inline]
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    // ─── Firing line ────────────────────────────────────────────────

    /// Enable the firing line. `enabled` is set only after the write
    /// succeeded.
    pub fn enable(&mut self) -> Result<(), HalError> {
        self.send(Command::Enable)?;
        self.state.enabled = true;
        debug!("Firing line enabled");
        Ok(())
    }

    /// Disable the firing line. `enabled` is cleared only after the write
    /// succeeded.
    pub fn disable(&mut self) -> Result<(), HalError> {
        self.send(Command::Disable)?;
        self.state.enabled = false;
        debug!("Firing line disabled");
        Ok(())
    }

    // ─── Reads ──────────────────────────────────────────────────────

    /// Poll odometer and scan flag.
    ///
    /// On success the stored state is refreshed and returned. On failure
    /// the stored state is left untouched and the error is returned.
    pub fn status(&mut self) -> Result<ResourceState, HalError> {
        let reply = self.query(Command::Status)?;
        match protocol::parse_status(&reply) {
            Ok(status) => {
                trace!(
                    "Status: odometer={} scan_pending={}",
                    status.odometer, status.scan_pending
                );
                self.state.odometer = status.odometer;
                self.state.scan_pending = status.scan_pending;
                Ok(self.state)
            }
            Err(e) => Err(self.fault("status", e.into())),
        }
    }

    /// Read the pending credential. `None` when the exchange failed or the
    /// reply was malformed.
    pub fn read_credential(&mut self) -> Option<Credential> {
        let reply = self.query(Command::ReadCredential).ok()?;
        match protocol::parse_credential(&reply) {
            Ok(credential) => {
                self.state.scan_pending = false;
                Some(credential)
            }
            Err(e) => {
                self.fault("read_credential", e.into());
                None
            }
        }
    }

    /// Read the latched cut time. `None` on failure.
    pub fn read_cut_time(&mut self) -> Option<u64> {
        let reply = self.query(Command::ReadCutTime).ok()?;
        match protocol::parse_cut_time(&reply) {
            Ok(value) => Some(value),
            Err(e) => {
                self.fault("read_cut_time", e.into());
                None
            }
        }
    }

    // ─── Writes ─────────────────────────────────────────────────────

    /// Show two lines on the display, each fitted to the display width.
    pub fn display(&mut self, line1: &str, line2: &str) -> Result<(), HalError> {
        self.send(Command::DisplayLine1(line1))?;
        self.send(Command::DisplayLine2(line2))
    }

    /// Reset the hardware odometer.
    pub fn reset_counter(&mut self) -> Result<(), HalError> {
        self.send(Command::ResetCounter)
    }

    /// Latch the current cut time in the firmware.
    pub fn update_cut_time(&mut self) -> Result<(), HalError> {
        self.send(Command::UpdateCutTime)
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn send(&mut self, command: Command<'_>) -> Result<(), HalError> {
        self.transport
            .send(&command.encode())
            .map_err(|e| self.fault(op_name(&command), e))
    }

    fn query(&mut self, command: Command<'_>) -> Result<String, HalError> {
        self.transport
            .discard_input()
            .map_err(|e| self.fault(op_name(&command), e))?;
        self.send(command)?;
        self.transport
            .receive()
            .map_err(|e| self.fault(op_name(&command), e))
    }

    fn fault(&mut self, op: &str, err: HalError) -> HalError {
        self.fault_count += 1;
        warn!("Resource {op} failed: {err}");
        err
    }
}

fn op_name(command: &Command<'_>) -> &'static str {
    match command {
        Command::Enable => "enable",
        Command::Disable => "disable",
        Command::Status => "status",
        Command::ReadCredential => "read_credential",
        Command::DisplayLine1(_) | Command::DisplayLine2(_) => "display",
        Command::ResetCounter => "reset_counter",
        Command::UpdateCutTime => "update_cut_time",
        Command::ReadCutTime => "read_cut_time",
    }
}
