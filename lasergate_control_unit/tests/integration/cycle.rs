//! Integration test: poll loop with a file-backed whitelist.
//!
//! Validates the reload cadence, fallback to the previous list when the
//! file disappears, and the start/shutdown path of `CycleRunner::run`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use lasergate_common::config::{LasergateConfig, LogLevel, SharedConfig, WhitelistConfig};
use lasergate_common::state::ControllerState;
use lasergate_common::usage::RecordingSink;
use lasergate_common::whitelist::{FileWhitelist, Whitelist};
use lasergate_control_unit::{AuthManager, Controller, CycleRunner};
use lasergate_hal::{ResourceChannel, SimulatedLaser, SimulatorHandle};
use tempfile::TempDir;

use super::{ALICE, BOB, params};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(whitelist_path: &Path) -> LasergateConfig {
    LasergateConfig {
        shared: SharedConfig {
            log_level: LogLevel::Debug,
            service_name: "laser-test".to_string(),
        },
        device: Default::default(),
        controller: Default::default(),
        whitelist: WhitelistConfig {
            path: whitelist_path.to_path_buf(),
            refresh_interval_s: 60,
        },
        reporting: None,
    }
}

fn runner(dir: &TempDir, running: bool) -> (CycleRunner, SimulatorHandle) {
    let path = dir.path().join("authorized.txt");
    let laser = SimulatedLaser::new();
    let sim = laser.handle();
    let sink = Arc::new(RecordingSink::default());
    let controller = Controller::new(
        ResourceChannel::new(Box::new(laser)),
        AuthManager::new(Whitelist::new(), sink.clone()),
        params(),
        sink,
    );
    let runner = CycleRunner::new(
        controller,
        Box::new(FileWhitelist::new(&path)),
        &config(&path),
        Arc::new(AtomicBool::new(running)),
    );
    (runner, sim)
}

fn write_whitelist(dir: &TempDir, entries: &[&str]) {
    let mut body = entries.join("\n");
    body.push('\n');
    fs::write(dir.path().join("authorized.txt"), body).unwrap();
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn first_cycle_loads_whitelist() {
    let dir = TempDir::new().unwrap();
    write_whitelist(&dir, &[ALICE]);
    let (mut runner, sim) = runner(&dir, true);
    let t0 = Instant::now();

    sim.present_badge(ALICE);
    assert_eq!(runner.run_once(t0), ControllerState::Enabled);
    assert_eq!(runner.controller().snapshot().whitelist_len, 1);
}

#[test]
fn whitelist_reloads_on_cadence() {
    let dir = TempDir::new().unwrap();
    write_whitelist(&dir, &[ALICE]);
    let (mut runner, sim) = runner(&dir, true);
    let t0 = Instant::now();
    runner.run_once(t0);

    write_whitelist(&dir, &[ALICE, BOB]);
    runner.run_once(t0 + Duration::from_secs(30));
    assert_eq!(runner.controller().snapshot().whitelist_len, 1);

    sim.present_badge(BOB);
    assert_eq!(runner.run_once(t0 + Duration::from_secs(59)), ControllerState::Init);

    sim.present_badge(BOB);
    assert_eq!(runner.run_once(t0 + Duration::from_secs(60)), ControllerState::Enabled);
    assert_eq!(runner.controller().snapshot().whitelist_len, 2);
}

#[test]
fn missing_file_keeps_previous_whitelist() {
    let dir = TempDir::new().unwrap();
    write_whitelist(&dir, &[ALICE, BOB]);
    let (mut runner, _sim) = runner(&dir, true);
    let t0 = Instant::now();
    runner.run_once(t0);

    fs::remove_file(dir.path().join("authorized.txt")).unwrap();
    runner.run_once(t0 + Duration::from_secs(60));
    assert_eq!(runner.controller().snapshot().whitelist_len, 2);
}

#[test]
fn missing_file_at_startup_is_retried() {
    let dir = TempDir::new().unwrap();
    let (mut runner, _sim) = runner(&dir, true);
    let t0 = Instant::now();

    runner.run_once(t0);
    assert_eq!(runner.controller().snapshot().whitelist_len, 0);

    write_whitelist(&dir, &[ALICE]);
    runner.run_once(t0 + Duration::from_secs(60));
    assert_eq!(runner.controller().snapshot().whitelist_len, 1);
}

#[test]
fn run_disables_line_and_stops_when_flag_cleared() {
    let dir = TempDir::new().unwrap();
    write_whitelist(&dir, &[ALICE]);
    let (mut runner, sim) = runner(&dir, false);

    runner.run().unwrap();

    assert_eq!(runner.stats().tick_count, 0);
    assert!(!sim.is_enabled());
    assert_eq!(sim.commands().first().map(String::as_str), Some("d"));
    assert_eq!(runner.controller().state(), ControllerState::Init);
    assert_eq!(sim.display().0.trim_end(), "Scan badge");
}

#[test]
fn run_fails_when_line_cannot_be_disabled() {
    let dir = TempDir::new().unwrap();
    let (mut runner, sim) = runner(&dir, false);
    sim.fail_next(b'd');

    assert!(runner.run().is_err());
}
