//! Background usage reporter.
//!
//! Main components:
//!   - `UsageReporter`: tokio task draining the event queue into HTTP calls
//!   - `ReportSender`: non-blocking [`UsageSink`] handed to the control loop
//!
//! The reporter stops once every sender has been dropped and the queue is
//! empty, so queued reports are still delivered during shutdown.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lasergate_common::credential::Credential;
use lasergate_common::usage::{CutRecord, UsageSink};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use crate::client::ReportClient;

/// Report waiting for delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum UsageEvent {
    /// A credential was presented.
    Attempt {
        credential: Credential,
        success: bool,
        at: DateTime<Utc>,
    },
    /// A firing episode completed.
    Cut(CutRecord),
}

/// Background task delivering queued usage events.
pub struct UsageReporter {
    client: Arc<ReportClient>,
    event_rx: mpsc::Receiver<UsageEvent>,
}

impl UsageReporter {
    /// Creates a reporter and the sender feeding it.
    ///
    /// # Arguments
    /// * `client` - Shared client for the reporting endpoints
    /// * `capacity` - Queue length; events beyond it are dropped
    pub fn new(client: Arc<ReportClient>, capacity: usize) -> (Self, ReportSender) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { client, event_rx: rx }, ReportSender::new(tx))
    }

    /// Deliver events until all senders are gone.
    pub async fn run(mut self) {
        info!("Usage reporter started");
        let mut delivered = 0u64;
        let mut failed = 0u64;

        while let Some(event) = self.event_rx.recv().await {
            let result = match &event {
                UsageEvent::Attempt {
                    credential,
                    success,
                    at,
                } => self.client.report_attempt(credential, *success, *at).await,
                UsageEvent::Cut(record) => self.client.report_cut(record).await,
            };
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!("Usage report failed: {e}");
                }
            }
        }

        info!("Usage reporter stopped ({delivered} delivered, {failed} failed)");
    }
}

/// Thread-safe, non-blocking sender for usage events.
///
/// Can be cloned and shared; a disabled sender discards everything.
#[derive(Debug, Clone)]
pub struct ReportSender {
    tx: Option<mpsc::Sender<UsageEvent>>,
}

impl ReportSender {
    /// Creates a new enabled sender with the given channel.
    pub fn new(tx: mpsc::Sender<UsageEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Creates a disabled sender that discards all events.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Queue an event without waiting.
    pub fn send(&self, event: UsageEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Report queue full, dropping usage event"),
            Err(TrySendError::Closed(_)) => warn!("Usage reporter gone, dropping usage event"),
        }
    }
}

impl UsageSink for ReportSender {
    fn report_attempt(&self, credential: &Credential, success: bool) {
        self.send(UsageEvent::Attempt {
            credential: credential.clone(),
            success,
            at: Utc::now(),
        });
    }

    fn report_cut(&self, record: &CutRecord) {
        self.send(UsageEvent::Cut(record.clone()));
    }
}
