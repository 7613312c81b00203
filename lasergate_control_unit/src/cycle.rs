//! Cooperative poll loop: whitelist refresh → controller tick → sleep.
//!
//! ## Cycle
//! The whitelist is reloaded on its own cadence *before* the controller
//! tick, so a swap never interleaves with scan resolution. The loop paces
//! itself with `std::thread::sleep` for the remainder of the poll interval
//! and records tick timing in [`CycleStats`].
//!
//! ## Shutdown
//! The loop observes a shared `running` flag (cleared by the signal
//! handler) and then runs the controller's shutdown path: close any open
//! episode, disable the firing line, log out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use lasergate_common::config::LasergateConfig;
use lasergate_common::hal::HalError;
use lasergate_common::state::ControllerState;
use lasergate_common::whitelist::WhitelistSource;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::Controller;

/// Ticks between periodic statistics log lines.
pub const STATS_LOG_INTERVAL_TICKS: u64 = 1200;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick duration [ns].
    pub last_tick_ns: u64,
    /// Maximum tick duration [ns].
    pub max_tick_ns: u64,
    /// Running sum for average computation.
    pub sum_tick_ns: u128,
    /// Ticks that took longer than the poll interval.
    pub overruns: u64,
}

impl CycleStats {
    /// Record one tick duration.
    #[inline]
    pub fn record(&mut self, duration: Duration, budget: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.tick_count += 1;
        self.last_tick_ns = ns;
        self.max_tick_ns = self.max_tick_ns.max(ns);
        self.sum_tick_ns += u128::from(ns);
        if duration > budget {
            self.overruns += 1;
        }
    }

    /// Average tick time [ns] (0 if no ticks).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            u64::try_from(self.sum_tick_ns / u128::from(self.tick_count)).unwrap_or(u64::MAX)
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors that stop the cycle loop.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The controller could not be brought to a safe initial state.
    #[error("controller start failed: {0}")]
    Start(#[from] HalError),
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the controller and the whitelist source and drives both.
pub struct CycleRunner {
    controller: Controller,
    whitelist: Box<dyn WhitelistSource>,
    poll_interval: Duration,
    refresh_interval: Duration,
    /// Time of the last reload attempt; `None` forces a load on the next tick.
    last_refresh: Option<Instant>,
    running: Arc<AtomicBool>,
    stats: CycleStats,
}

impl CycleRunner {
    pub fn new(
        controller: Controller,
        whitelist: Box<dyn WhitelistSource>,
        config: &LasergateConfig,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            controller,
            whitelist,
            poll_interval: config.controller.poll_interval(),
            refresh_interval: config.whitelist.refresh_interval(),
            last_refresh: None,
            running,
            stats: CycleStats::default(),
        }
    }

    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Reload the whitelist if the refresh interval has elapsed.
    ///
    /// A failed reload keeps the current whitelist and is retried at the
    /// next interval.
    pub fn refresh_whitelist_if_due(&mut self, now: Instant) {
        let due = self
            .last_refresh
            .is_none_or(|last| now.saturating_duration_since(last) >= self.refresh_interval);
        if !due {
            return;
        }
        self.last_refresh = Some(now);

        match self.whitelist.load() {
            Ok(whitelist) => {
                debug!("Whitelist reloaded ({} credentials)", whitelist.len());
                self.controller.refresh_whitelist(whitelist);
            }
            Err(e) => warn!("Whitelist reload failed, keeping previous list: {e}"),
        }
    }

    /// One cycle at time `now`: refresh if due, then tick.
    pub fn run_once(&mut self, now: Instant) -> ControllerState {
        self.refresh_whitelist_if_due(now);
        self.controller.tick(now)
    }

    /// Enter the poll loop until the running flag is cleared, then shut the
    /// controller down.
    ///
    /// # Errors
    /// Returns `CycleError::Start` if the firing line cannot be disabled at
    /// power-up.
    pub fn run(&mut self) -> Result<(), CycleError> {
        self.controller.start()?;
        info!(
            "Entering poll loop (interval {:?}, whitelist refresh {:?})",
            self.poll_interval, self.refresh_interval
        );

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            self.run_once(tick_start);

            let elapsed = tick_start.elapsed();
            self.stats.record(elapsed, self.poll_interval);
            if elapsed > self.poll_interval {
                debug!("Tick overrun: {elapsed:?} > {:?}", self.poll_interval);
            }
            if self.stats.tick_count % STATS_LOG_INTERVAL_TICKS == 0 {
                debug!(
                    "Cycle stats: ticks={} avg={}µs max={}µs overruns={} state={}",
                    self.stats.tick_count,
                    self.stats.avg_tick_ns() / 1000,
                    self.stats.max_tick_ns / 1000,
                    self.stats.overruns,
                    self.controller.state()
                );
            }

            // Sleep for remaining time.
            if let Some(remaining) = self.poll_interval.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        info!("Poll loop stopped after {} ticks", self.stats.tick_count);
        self.controller.shutdown(Instant::now());
        Ok(())
    }
}
