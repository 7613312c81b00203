//! # LaserGate HAL Library
//!
//! Synchronous request/reply driver for the microcontroller that gates the
//! laser's firing line, plus the byte transports it runs over.
//!
//! # Module Structure
//!
//! - [`channel`] - `ResourceChannel`, last known resource state
//! - [`transports`] - `Transport` implementations (serial tty, simulation)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   lasergate_hal (single crate)                │
//! │  ┌──────────────────┐        ┌─────────────────────────────┐  │
//! │  │ ResourceChannel  │───────►│  Transport (trait object)   │  │
//! │  │ (state + codec)  │        │                             │  │
//! │  └──────────────────┘        └──────┬───────────────┬──────┘  │
//! │                                     ▼               ▼         │
//! │                          ┌────────────────┐ ┌──────────────┐  │
//! │                          │SerialTransport │ │SimulatedLaser│  │
//! │                          └────────────────┘ └──────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod channel;
pub mod transports;

// Re-export key types for convenience
pub use crate::channel::{ResourceChannel, ResourceState};
pub use crate::transports::serial::SerialTransport;
pub use crate::transports::simulation::{SimulatedLaser, SimulatorHandle};
