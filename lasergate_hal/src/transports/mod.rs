//! Transport implementations.
//!
//! - [`serial`] - tty link to the controller firmware
//! - [`simulation`] - in-process firmware emulator for development and testing
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `transports/`
//! 2. Implement the `Transport` trait from `lasergate_common::hal`
//! 3. Add a variant to [`open`] if it is selectable from configuration

pub mod serial;
pub mod simulation;

use lasergate_common::config::DeviceConfig;
use lasergate_common::hal::{HalError, Transport};
use tracing::info;

/// Open the transport selected at startup.
///
/// `simulate` bypasses the device entirely and returns a fresh
/// [`simulation::SimulatedLaser`] together with its control handle.
pub fn open(
    device: &DeviceConfig,
    simulate: bool,
) -> Result<(Box<dyn Transport>, Option<simulation::SimulatorHandle>), HalError> {
    if simulate {
        let laser = simulation::SimulatedLaser::new();
        let handle = laser.handle();
        info!("Using simulated laser controller");
        return Ok((Box::new(laser), Some(handle)));
    }

    let serial = serial::SerialTransport::open(device)?;
    info!(
        "Opened {:?} at {} baud",
        device.path, device.baud_rate
    );
    Ok((Box::new(serial), None))
}
