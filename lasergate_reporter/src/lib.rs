//! # LaserGate Reporter
//!
//! Delivery of usage reports to the membership backend and retrieval of
//! the credential whitelist.
//!
//! # Module Structure
//!
//! - [`client`] - HTTP client for the reporting endpoints
//! - [`reporter`] - Background delivery task and its non-blocking sender
//! - [`sync`] - Whitelist download and atomic cache write
//!
//! # Architecture
//!
//! ```text
//! control loop ──try_send──► mpsc queue ──► UsageReporter (tokio task) ──► HTTP
//! ```
//!
//! The control loop never waits on the network: a full or closed queue
//! drops the report with a warning.

pub mod client;
pub mod reporter;
pub mod sync;

// Re-export key types for convenience
pub use crate::client::{ReportClient, ReportError};
pub use crate::reporter::{ReportSender, UsageEvent, UsageReporter};
