//! # LaserGate Control Unit
//!
//! Authorizes and meters use of a shared laser cutter from RFID badges.
//!
//! # Module Structure
//!
//! - [`timer`] - Injected-time countdown timer
//! - [`auth`] - Whitelist admission and session ownership
//! - [`display`] - Two-line display content
//! - [`controller`] - The authorization state machine
//! - [`cycle`] - Poll loop, whitelist cadence, shutdown
//! - [`console`] - Operator console for the simulated controller
//!
//! # Dependency order
//!
//! ```text
//! Timer ──┐
//!         ├──► Controller ──► CycleRunner
//! Auth ───┤
//! ResourceChannel (lasergate_hal)
//! ```

pub mod auth;
pub mod console;
pub mod controller;
pub mod cycle;
pub mod display;
pub mod timer;

// Re-export key types for convenience
pub use crate::auth::{AuthManager, Session};
pub use crate::controller::{Controller, ControllerParams, ControllerSnapshot};
pub use crate::cycle::{CycleError, CycleRunner, CycleStats};
pub use crate::timer::Timer;
