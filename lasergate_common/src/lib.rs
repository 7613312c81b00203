//! LaserGate Common Library
//!
//! This crate provides the shared vocabulary of the LaserGate workspace:
//! credentials, the controller wire protocol, usage records, whitelist
//! sources and configuration loading.
//!
//! # Module Structure
//!
//! - [`credential`] - Normalized RFID credential token
//! - [`protocol`] - Request encoding and reply parsing for the laser controller
//! - [`hal`] - Transport trait and channel error types
//! - [`state`] - Controller state enum
//! - [`usage`] - Cut records and the usage sink contract
//! - [`whitelist`] - Whitelist sources
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use lasergate_common::prelude::*;
//!
//! let badge = Credential::from_wire("0012345678").unwrap();
//! assert_eq!(badge.as_str(), "12345678");
//! ```

pub mod config;
pub mod consts;
pub mod credential;
pub mod hal;
pub mod prelude;
pub mod protocol;
pub mod state;
pub mod usage;
pub mod whitelist;
