//! Shared rig for the integration tests.
//!
//! The rig owns a [`Controller`] wired to a [`SimulatedLaser`] and a
//! [`RecordingSink`], and steps injected time one poll interval per tick.

mod cycle;
mod safety;
mod scenarios;
mod sessions;

use std::sync::Arc;
use std::time::{Duration, Instant};

use lasergate_common::credential::Credential;
use lasergate_common::state::ControllerState;
use lasergate_common::usage::RecordingSink;
use lasergate_common::whitelist::Whitelist;
use lasergate_control_unit::{AuthManager, Controller, ControllerParams};
use lasergate_hal::{ResourceChannel, SimulatedLaser, SimulatorHandle};

/// Poll interval used by every rig.
pub const TICK: Duration = Duration::from_millis(50);
pub const DEBOUNCE: Duration = Duration::from_secs(2);
pub const ACTIVITY_TIMEOUT: Duration = Duration::from_secs(10);
pub const UNIT_PRICE: f64 = 0.5;

pub const ALICE: &str = "ABC12345";
pub const BOB: &str = "DEF67890";
pub const MALLORY: &str = "ZZZ99999";

pub fn cred(raw: &str) -> Credential {
    Credential::new(raw).unwrap()
}

pub fn whitelist(entries: &[&str]) -> Whitelist {
    entries.iter().map(|e| cred(e)).collect()
}

pub fn params() -> ControllerParams {
    ControllerParams {
        activity_timeout: ACTIVITY_TIMEOUT,
        debounce: DEBOUNCE,
        unit_price: UNIT_PRICE,
    }
}

pub struct Rig {
    pub controller: Controller,
    pub sim: SimulatorHandle,
    pub sink: Arc<RecordingSink>,
    pub now: Instant,
}

impl Rig {
    /// Started controller with ALICE and BOB whitelisted.
    pub fn new() -> Self {
        let laser = SimulatedLaser::new();
        let sim = laser.handle();
        let sink = Arc::new(RecordingSink::default());
        let auth = AuthManager::new(whitelist(&[ALICE, BOB]), sink.clone());
        let mut controller = Controller::new(
            ResourceChannel::new(Box::new(laser)),
            auth,
            params(),
            sink.clone(),
        );
        controller.start().unwrap();
        Self {
            controller,
            sim,
            sink,
            now: Instant::now(),
        }
    }

    /// Advance one poll interval and tick.
    pub fn tick(&mut self) -> ControllerState {
        self.now += TICK;
        self.controller.tick(self.now)
    }

    /// Let `duration` pass without ticking.
    pub fn wait(&mut self, duration: Duration) {
        self.now += duration;
    }

    /// First poll at `odometer`.
    pub fn baseline(&mut self, odometer: u64) -> ControllerState {
        self.sim.set_odometer(odometer);
        self.tick()
    }

    /// Present `badge` and tick once.
    pub fn scan(&mut self, badge: &str) -> ControllerState {
        self.sim.present_badge(badge);
        self.tick()
    }

    /// Baseline at `odometer` and log ALICE in.
    pub fn logged_in(odometer: u64) -> Self {
        let mut rig = Self::new();
        rig.baseline(odometer);
        assert_eq!(rig.scan(ALICE), ControllerState::Enabled);
        rig
    }

    /// Set the odometer and tick once.
    pub fn fire_to(&mut self, odometer: u64) -> ControllerState {
        self.sim.set_odometer(odometer);
        self.tick()
    }

    /// Let the debounce window run out, then tick.
    pub fn settle(&mut self) -> ControllerState {
        self.wait(DEBOUNCE);
        self.tick()
    }

    pub fn display(&self) -> (String, String) {
        let (l1, l2) = self.sim.display();
        (l1.trim_end().to_string(), l2.trim_end().to_string())
    }
}
