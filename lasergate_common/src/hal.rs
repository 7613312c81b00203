//! Transport trait and error types for the attached laser controller.
//!
//! This module defines:
//! - `Transport` trait - byte-level link to the controller firmware
//! - `HalError` enum - error types for channel operations

use std::time::Duration;
use thiserror::Error;

use crate::protocol::ProtocolError;

/// Error types for channel operations.
#[derive(Debug, Error)]
pub enum HalError {
    /// Device could not be opened or configured.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Read or write on the link failed.
    #[error("Hardware communication error: {0}")]
    Io(#[from] std::io::Error),

    /// No complete reply line within the reply timeout.
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    /// Reply did not match the expected grammar.
    #[error("Malformed reply: {0}")]
    Protocol(#[from] ProtocolError),
}

impl HalError {
    /// Transient faults leave the last known resource state in place and
    /// the loop continues.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_) | Self::Protocol(_))
    }
}

/// Byte-level link to the controller firmware.
///
/// The link is strictly request/reply: the firmware never pushes data on
/// its own, so `receive` is only called after a read-type request.
///
/// # Lifecycle
///
/// 1. Open (implementation specific, may block)
/// 2. `send` / `receive` pairs from the poll loop
/// 3. Drop closes the link
pub trait Transport: Send {
    /// Returns the transport's identifier (e.g., "serial", "simulation").
    fn name(&self) -> &'static str;

    /// Write one complete, newline-terminated request.
    fn send(&mut self, request: &[u8]) -> Result<(), HalError>;

    /// Block until a newline-terminated reply has arrived, then drain any
    /// further immediately-available bytes into the same buffer.
    fn receive(&mut self) -> Result<String, HalError>;

    /// Drop input that arrived outside an exchange, such as a reply that
    /// came in after its request had already timed out.
    fn discard_input(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}
