//! Usage records and the reporting sink contract.
//!
//! The controller hands attempt reports and completed cut records to a
//! [`UsageSink`]. Sinks must return immediately: delivery happens elsewhere
//! (see `lasergate_reporter`) and a delivery failure never reaches the
//! control loop.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::credential::Credential;

/// Odometer units per billed minute.
///
/// The firmware odometer is assumed to count seconds.
pub const ODOMETER_UNITS_PER_MINUTE: f64 = 60.0;

/// Cost of `duration` odometer units at `unit_price` per minute.
#[inline]
pub fn cost_for(duration: u64, unit_price: f64) -> f64 {
    duration as f64 / ODOMETER_UNITS_PER_MINUTE * unit_price
}

/// One completed firing episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutRecord {
    /// Credential of the session that owned the cut.
    pub credential: Credential,
    /// Odometer value when firing began.
    pub start_odometer: u64,
    /// Odometer value when the episode closed.
    pub end_odometer: u64,
    /// `end - start`, saturating at zero.
    pub duration: u64,
    /// `duration / 60 * unit_price`.
    pub cost: f64,
    /// Wall-clock start of the episode.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the episode.
    pub ended_at: DateTime<Utc>,
}

impl CutRecord {
    /// Build a record from odometer bounds, computing duration and cost.
    pub fn new(
        credential: Credential,
        start_odometer: u64,
        end_odometer: u64,
        unit_price: f64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let duration = end_odometer.saturating_sub(start_odometer);
        Self {
            credential,
            start_odometer,
            end_odometer,
            duration,
            cost: cost_for(duration, unit_price),
            started_at,
            ended_at,
        }
    }
}

/// Destination for usage reports.
///
/// Implementations must not block and must not fail observably; errors are
/// logged by the implementation.
pub trait UsageSink: Send + Sync {
    /// A credential was presented; `success` is the admission decision.
    fn report_attempt(&self, credential: &Credential, success: bool);

    /// A firing episode completed.
    fn report_cut(&self, record: &CutRecord);
}

/// Sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl UsageSink for NullSink {
    fn report_attempt(&self, _credential: &Credential, _success: bool) {}

    fn report_cut(&self, _record: &CutRecord) {}
}

/// Sink that keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    attempts: Mutex<Vec<(Credential, bool)>>,
    cuts: Mutex<Vec<CutRecord>>,
}

impl RecordingSink {
    /// Attempt reports in arrival order.
    pub fn attempts(&self) -> Vec<(Credential, bool)> {
        self.attempts.lock().clone()
    }

    /// Cut records in arrival order.
    pub fn cuts(&self) -> Vec<CutRecord> {
        self.cuts.lock().clone()
    }
}

impl UsageSink for RecordingSink {
    fn report_attempt(&self, credential: &Credential, success: bool) {
        self.attempts.lock().push((credential.clone(), success));
    }

    fn report_cut(&self, record: &CutRecord) {
        self.cuts.lock().push(record.clone());
    }
}
