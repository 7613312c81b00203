//! Authorization state machine.
//!
//! One [`Controller::tick`] per poll interval:
//!
//! 1. Poll the resource. A failed poll reuses the last known state, so no
//!    firing edge is derived from it.
//! 2. `firing` ⇔ the odometer advanced since the previous successful poll.
//! 3. Resolve a pending badge scan in `Init` / `Enabled`. While `Firing` the
//!    badge is read and dropped.
//! 4. Compute the next state; first matching rule wins:
//!
//! | # | Condition                                              | Next    |
//! |---|--------------------------------------------------------|---------|
//! | a | firing ∧ (¬authorized ∨ ¬enabled)                      | Init ⚠  |
//! | b | firing                                                 | Firing  |
//! | c | ¬authorized                                            | Init    |
//! | d | authorized ∧ ¬recently_firing                          | Enabled |
//! | e | authorized ∧ recently_firing ∧ prev = Firing           | Firing  |
//! | f | activity timer expired (overrides a–e)                 | Init    |
//!
//! `recently_firing` holds while the debounce timer, restarted on every
//! firing tick, has not expired. Rule (a) is a safety violation: it is
//! logged at `error!`, counted, and forces the `Init` side effects even
//! when the controller already was in `Init`.
//!
//! 5. Apply transition side effects and refresh the display.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lasergate_common::config::ControllerConfig;
use lasergate_common::credential::Credential;
use lasergate_common::hal::HalError;
use lasergate_common::state::ControllerState;
use lasergate_common::usage::{CutRecord, UsageSink};
use lasergate_common::whitelist::Whitelist;
use lasergate_hal::ResourceChannel;
use tracing::{debug, error, info, warn};

use crate::auth::AuthManager;
use crate::display;
use crate::timer::Timer;

// ─── Parameters ─────────────────────────────────────────────────────

/// Timing and billing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerParams {
    /// Idle time before an open session is closed.
    pub activity_timeout: Duration,
    /// Hold window absorbing odometer plateaus while firing.
    pub debounce: Duration,
    /// Price per minute of firing.
    pub unit_price: f64,
}

impl From<&ControllerConfig> for ControllerParams {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            activity_timeout: config.activity_timeout(),
            debounce: config.debounce(),
            unit_price: config.unit_price,
        }
    }
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self::from(&ControllerConfig::default())
    }
}

/// Read-only view of the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    /// Credential of the open session.
    pub credential: Option<Credential>,
    /// Firing line enabled.
    pub enabled: bool,
    /// Last known odometer.
    pub odometer: u64,
    /// Odometer reference for the usage display.
    pub firing_start: u64,
    pub safety_violations: u64,
    pub cuts_completed: u64,
    pub whitelist_len: usize,
}

/// Firing episode in progress.
#[derive(Debug, Clone)]
struct Episode {
    credential: Credential,
    start_odometer: u64,
    started_at: DateTime<Utc>,
}

// ─── Controller ─────────────────────────────────────────────────────

/// The finite-state machine gating the firing line.
pub struct Controller {
    channel: ResourceChannel,
    auth: AuthManager,
    sink: Arc<dyn UsageSink>,
    params: ControllerParams,

    state: ControllerState,
    activity: Timer,
    debounce: Timer,

    /// Odometer of the previous successful poll; `None` until the first.
    last_odometer: Option<u64>,
    firing_start: u64,
    episode: Option<Episode>,

    safety_violations: u64,
    cuts_completed: u64,
}

impl Controller {
    pub fn new(
        channel: ResourceChannel,
        auth: AuthManager,
        params: ControllerParams,
        sink: Arc<dyn UsageSink>,
    ) -> Self {
        Self {
            channel,
            auth,
            sink,
            params,
            state: ControllerState::Init,
            activity: Timer::new(params.activity_timeout),
            debounce: Timer::new(params.debounce),
            last_odometer: None,
            firing_start: 0,
            episode: None,
            safety_violations: 0,
            cuts_completed: 0,
        }
    }

    /// Power-up: firing line off, idle prompt.
    ///
    /// # Errors
    ///
    /// Fails if the disable command cannot be written; the caller must not
    /// enter the poll loop with the line in an unknown state.
    pub fn start(&mut self) -> Result<(), HalError> {
        self.channel.disable()?;
        self.show(display::idle());
        self.state = ControllerState::Init;
        info!(
            "Controller started over '{}' transport, {} whitelisted credentials",
            self.channel.transport_name(),
            self.auth.whitelist_len()
        );
        Ok(())
    }

    /// Run one control cycle at time `now`. Returns the new state.
    pub fn tick(&mut self, now: Instant) -> ControllerState {
        use ControllerState::*;

        let prev = self.state;

        // ── Poll ──
        let fresh = self.channel.status().ok();
        let odometer = self.channel.state().odometer;
        let prev_odometer = self.last_odometer.unwrap_or(odometer);
        let firing = match (fresh, self.last_odometer) {
            (Some(status), Some(last)) => status.odometer > last,
            _ => false,
        };
        if fresh.is_some() {
            self.last_odometer = Some(odometer);
        }

        // ── Scan ──
        let mut session_opened = false;
        if fresh.is_some_and(|status| status.scan_pending) {
            if prev.accepts_scans() {
                session_opened = self.resolve_scan(now);
            } else {
                // Consume the badge so the swipe is not replayed after the cut.
                match self.channel.read_credential() {
                    Some(credential) => debug!("Scan by {credential} ignored while firing"),
                    None => debug!("Scan ignored while firing"),
                }
            }
        }
        if session_opened && self.activity.is_running() {
            self.activity.reset(now);
        }

        // ── Next state ──
        let authorized = self.auth.is_authorized();
        let enabled = self.channel.is_enabled();
        if firing {
            self.activity.reset(now);
            self.debounce.start(now);
        }
        let recently_firing = self.debounce.is_running() && !self.debounce.expired(now);

        let violation = firing && (!authorized || !enabled);
        let mut next = if violation {
            Init
        } else if firing {
            Firing
        } else if !authorized {
            Init
        } else if !recently_firing {
            Enabled
        } else if prev == Firing {
            Firing
        } else {
            Enabled
        };
        if self.activity.expired(now) {
            info!(
                "No activity for {:?}, closing session",
                self.params.activity_timeout
            );
            next = Init;
        }

        // ── Side effects ──
        if violation {
            self.safety_violations += 1;
            error!(
                "SAFETY VIOLATION #{}: odometer advanced {} -> {} with authorized={} enabled={}, forcing INIT",
                self.safety_violations, prev_odometer, odometer, authorized, enabled
            );
        }

        if prev == Firing && next != Firing {
            self.finish_episode(odometer);
        }

        if next == Init {
            if prev != Init || violation {
                self.enter_init(now);
            } else if self.channel.is_enabled() {
                // A previous disable did not go through.
                if let Err(e) = self.channel.disable() {
                    error!("Firing line still enabled in INIT: {e}");
                }
            }
        } else {
            if prev == Init {
                self.activity.start(now);
            }
            if !self.channel.is_enabled() {
                if let Err(e) = self.channel.enable() {
                    warn!("Failed to enable firing line: {e}");
                }
            }

            let welcome = next == Enabled && (prev == Init || session_opened);
            if welcome {
                self.firing_start = odometer;
            }
            if next == Firing && prev != Firing {
                self.begin_episode(now, prev_odometer);
            }

            let lines = match self.auth.credential().filter(|_| welcome) {
                Some(credential) => display::welcome(credential),
                None => display::usage(
                    odometer.saturating_sub(self.firing_start),
                    self.params.unit_price,
                ),
            };
            self.show(lines);
        }

        if next != prev {
            info!("{prev} -> {next}");
        }
        self.state = next;
        next
    }

    /// Close any open episode and session, disable the firing line.
    pub fn shutdown(&mut self, now: Instant) {
        if self.state == ControllerState::Firing {
            let odometer = self.channel.state().odometer;
            self.finish_episode(odometer);
        }
        self.enter_init(now);
        self.state = ControllerState::Init;
        info!(
            "Controller stopped ({} cuts, {} safety violations)",
            self.cuts_completed, self.safety_violations
        );
    }

    /// Replace the whitelist; an open session is kept.
    pub fn refresh_whitelist(&mut self, whitelist: Whitelist) {
        self.auth.refresh_whitelist(whitelist);
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[inline]
    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    #[inline]
    pub fn channel(&self) -> &ResourceChannel {
        &self.channel
    }

    #[inline]
    pub fn firing_start(&self) -> u64 {
        self.firing_start
    }

    #[inline]
    pub fn safety_violations(&self) -> u64 {
        self.safety_violations
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            credential: self.auth.credential().cloned(),
            enabled: self.channel.is_enabled(),
            odometer: self.channel.state().odometer,
            firing_start: self.firing_start,
            safety_violations: self.safety_violations,
            cuts_completed: self.cuts_completed,
            whitelist_len: self.auth.whitelist_len(),
        }
    }

    // ─── Internals ──────────────────────────────────────────────────

    /// Read the presented badge and log in, out, or switch user. An
    /// unreadable badge still ends the open session.
    ///
    /// Returns `true` when a new session was opened.
    fn resolve_scan(&mut self, now: Instant) -> bool {
        let read = self.channel.read_credential();
        let previous = self.auth.logout();
        let Some(credential) = read else {
            debug!("Scan flag set but no credential could be read");
            return false;
        };

        if previous
            .as_ref()
            .is_some_and(|session| session.credential() == &credential)
        {
            return false;
        }
        self.auth.login(credential, now)
    }

    fn begin_episode(&mut self, now: Instant, start_odometer: u64) {
        self.activity.reset(now);
        self.firing_start = start_odometer;
        match self.auth.credential() {
            Some(credential) => {
                debug!("Cut started by {credential} at odometer {start_odometer}");
                self.episode = Some(Episode {
                    credential: credential.clone(),
                    start_odometer,
                    started_at: Utc::now(),
                });
            }
            None => warn!("Firing without a session; cut will not be recorded"),
        }
    }

    fn finish_episode(&mut self, end_odometer: u64) {
        let Some(episode) = self.episode.take() else {
            return;
        };
        let record = CutRecord::new(
            episode.credential,
            episode.start_odometer,
            end_odometer,
            self.params.unit_price,
            episode.started_at,
            Utc::now(),
        );
        info!(
            "Cut finished: {} used {} units (${:.2})",
            record.credential, record.duration, record.cost
        );
        self.cuts_completed += 1;
        self.sink.report_cut(&record);
    }

    fn enter_init(&mut self, now: Instant) {
        if let Err(e) = self.channel.disable() {
            error!("Failed to disable firing line: {e}");
        }
        self.auth.logout();
        self.activity.stop();
        self.activity.reset(now);
        self.debounce.stop();
        self.debounce.reset(now);
        self.episode = None;
        self.show(display::idle());
    }

    fn show(&mut self, (line1, line2): (String, String)) {
        // Failures are logged by the channel; the display is best effort.
        let _ = self.channel.display(&line1, &line2);
    }
}
