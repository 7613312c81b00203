//! Prelude module for common re-exports.
//!
//! ```rust
//! use lasergate_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, ControllerConfig, DeviceConfig, LasergateConfig, LogLevel,
    ReportingConfig, SharedConfig, WhitelistConfig,
};

// ─── Domain ─────────────────────────────────────────────────────────
pub use crate::credential::{Credential, CredentialError};
pub use crate::state::ControllerState;
pub use crate::usage::{CutRecord, NullSink, RecordingSink, UsageSink};
pub use crate::whitelist::{
    FileWhitelist, StaticWhitelist, Whitelist, WhitelistError, WhitelistSource,
};

// ─── Hardware link ──────────────────────────────────────────────────
pub use crate::hal::{HalError, Transport};
pub use crate::protocol::{Command, ProtocolError, StatusReply};
