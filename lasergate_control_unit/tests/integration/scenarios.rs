//! Integration test: one complete session, step by step.
//!
//! Login → firing → plateau inside the debounce window → cut closed.

use lasergate_common::state::ControllerState;

use super::{ALICE, Rig, UNIT_PRICE, cred};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn whitelisted_scan_on_idle_odometer_enables() {
    let mut rig = Rig::new();
    assert_eq!(rig.baseline(1000), ControllerState::Init);

    assert_eq!(rig.scan(ALICE), ControllerState::Enabled);

    let snap = rig.controller.snapshot();
    assert_eq!(snap.credential, Some(cred(ALICE)));
    assert!(snap.enabled);
    assert_eq!(snap.odometer, 1000);
    assert!(rig.sim.is_enabled());
    assert_eq!(rig.sink.attempts(), vec![(cred(ALICE), true)]);
    assert_eq!(rig.display(), ("Welcome".to_string(), ALICE.to_string()));
}

#[test]
fn odometer_advance_while_enabled_starts_firing() {
    let mut rig = Rig::logged_in(1000);

    assert_eq!(rig.fire_to(1100), ControllerState::Firing);
    assert_eq!(rig.controller.firing_start(), 1000);
    assert!(rig.sim.is_enabled());
    assert_eq!(rig.display(), ("Time: 1:40".to_string(), "Cost: $0.83".to_string()));
}

#[test]
fn plateau_inside_debounce_keeps_firing() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1100);

    // 1.5 s of plateau, well inside the 2 s window.
    for _ in 0..30 {
        assert_eq!(rig.tick(), ControllerState::Firing);
    }
    assert!(rig.sink.cuts().is_empty());
}

#[test]
fn plateau_past_debounce_closes_the_cut() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1100);
    rig.tick();

    assert_eq!(rig.settle(), ControllerState::Enabled);

    let cuts = rig.sink.cuts();
    assert_eq!(cuts.len(), 1);
    let cut = &cuts[0];
    assert_eq!(cut.credential, cred(ALICE));
    assert_eq!(cut.start_odometer, 1000);
    assert_eq!(cut.end_odometer, 1100);
    assert_eq!(cut.duration, 100);
    assert_eq!(cut.cost, 100.0 / 60.0 * UNIT_PRICE);

    // The session stays open and the line enabled.
    assert!(rig.sim.is_enabled());
    assert_eq!(rig.controller.snapshot().credential, Some(cred(ALICE)));
    assert_eq!(rig.controller.snapshot().cuts_completed, 1);
}

#[test]
fn intermittent_firing_is_one_cut() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1010);

    // Short pauses between pulses never reach the debounce window.
    let mut odometer = 1010;
    for _ in 0..5 {
        for _ in 0..10 {
            assert_eq!(rig.tick(), ControllerState::Firing);
        }
        odometer += 10;
        assert_eq!(rig.fire_to(odometer), ControllerState::Firing);
    }

    assert_eq!(rig.settle(), ControllerState::Enabled);
    let cuts = rig.sink.cuts();
    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].duration, 60);
}

#[test]
fn usage_display_tracks_latest_cut() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1030);
    rig.settle();
    rig.fire_to(1060);
    rig.settle();

    assert_eq!(rig.display(), ("Time: 0:30".to_string(), "Cost: $0.25".to_string()));
    let cuts = rig.sink.cuts();
    assert_eq!(cuts.len(), 2);
    assert_eq!(cuts[1].start_odometer, 1030);
}

#[test]
fn ticks_without_activity_keep_enabled() {
    let mut rig = Rig::logged_in(1000);
    for _ in 0..20 {
        assert_eq!(rig.tick(), ControllerState::Enabled);
    }
    assert!(rig.sink.cuts().is_empty());
}
