//! Integration test: session ownership.
//!
//! Badge swipes log in, log out, or switch user; sessions end on
//! inactivity; whitelist reloads never touch the open session.

use lasergate_common::state::ControllerState;

use super::{ACTIVITY_TIMEOUT, ALICE, BOB, MALLORY, Rig, TICK, cred, whitelist};

// ── Swipes ──────────────────────────────────────────────────────────

#[test]
fn scan_on_first_poll_logs_in() {
    let mut rig = Rig::new();
    rig.sim.set_odometer(500);
    assert_eq!(rig.scan(ALICE), ControllerState::Enabled);
    assert_eq!(rig.controller.firing_start(), 500);
    assert_eq!(rig.controller.safety_violations(), 0);
}

#[test]
fn different_badge_switches_user() {
    let mut rig = Rig::logged_in(1000);

    assert_eq!(rig.scan(BOB), ControllerState::Enabled);

    assert_eq!(rig.controller.snapshot().credential, Some(cred(BOB)));
    assert!(rig.sim.is_enabled());
    assert_eq!(rig.display(), ("Welcome".to_string(), BOB.to_string()));
    assert_eq!(
        rig.sink.attempts(),
        vec![(cred(ALICE), true), (cred(BOB), true)]
    );
}

#[test]
fn same_badge_logs_out() {
    let mut rig = Rig::logged_in(1000);

    assert_eq!(rig.scan(ALICE), ControllerState::Init);

    assert!(!rig.controller.auth().is_authorized());
    assert!(!rig.sim.is_enabled());
    assert_eq!(rig.display(), ("Scan badge".to_string(), "to begin".to_string()));
    // Logging out is not an admission attempt.
    assert_eq!(rig.sink.attempts().len(), 1);

    // A third swipe logs back in.
    assert_eq!(rig.scan(ALICE), ControllerState::Enabled);
}

#[test]
fn unknown_badge_ends_current_session() {
    let mut rig = Rig::logged_in(1000);

    assert_eq!(rig.scan(MALLORY), ControllerState::Init);

    assert!(!rig.sim.is_enabled());
    assert_eq!(rig.sink.attempts().last(), Some(&(cred(MALLORY), false)));
}

#[test]
fn scan_while_firing_is_discarded() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1100);

    rig.sim.present_badge(BOB);
    for _ in 0..5 {
        assert_eq!(rig.tick(), ControllerState::Firing);
        assert_eq!(rig.controller.snapshot().credential, Some(cred(ALICE)));
    }

    // The cut closes under the original owner.
    assert_eq!(rig.settle(), ControllerState::Enabled);
    let cuts = rig.sink.cuts();
    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].credential, cred(ALICE));

    // The swipe does not come back once the cut has ended.
    assert_eq!(rig.tick(), ControllerState::Enabled);
    assert_eq!(rig.controller.snapshot().credential, Some(cred(ALICE)));
    assert_eq!(rig.sink.attempts().len(), 1);
}

#[test]
fn owner_swipe_mid_cut_keeps_session() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1100);

    rig.sim.present_badge(ALICE);
    assert_eq!(rig.tick(), ControllerState::Firing);
    assert_eq!(rig.settle(), ControllerState::Enabled);

    assert_eq!(rig.tick(), ControllerState::Enabled);
    assert_eq!(rig.controller.snapshot().credential, Some(cred(ALICE)));
    assert!(rig.sim.is_enabled());
}

#[test]
fn unreadable_badge_ends_current_session() {
    let mut rig = Rig::logged_in(1000);

    rig.sim.inject_reply("o1000x1");
    rig.sim.inject_reply("r");
    assert_eq!(rig.tick(), ControllerState::Init);

    assert!(!rig.controller.auth().is_authorized());
    assert!(!rig.sim.is_enabled());
    // No admission attempt for an empty read.
    assert_eq!(rig.sink.attempts().len(), 1);
}

#[test]
fn unreadable_badge_while_idle_does_nothing() {
    let mut rig = Rig::new();
    rig.baseline(1000);

    rig.sim.inject_reply("o1000x1");
    rig.sim.inject_reply("r");
    assert_eq!(rig.tick(), ControllerState::Init);
    assert!(rig.sink.attempts().is_empty());
}

// ── Inactivity ──────────────────────────────────────────────────────

#[test]
fn activity_timeout_returns_to_init() {
    let mut rig = Rig::logged_in(1000);

    rig.wait(ACTIVITY_TIMEOUT - TICK * 2);
    assert_eq!(rig.tick(), ControllerState::Enabled);

    rig.wait(TICK);
    assert_eq!(rig.tick(), ControllerState::Init);
    assert!(!rig.sim.is_enabled());
    assert!(!rig.controller.auth().is_authorized());
    assert_eq!(rig.display(), ("Scan badge".to_string(), "to begin".to_string()));
}

#[test]
fn firing_counts_as_activity() {
    let mut rig = Rig::logged_in(1000);

    rig.wait(ACTIVITY_TIMEOUT - TICK * 40);
    assert_eq!(rig.fire_to(1010), ControllerState::Firing);
    assert_eq!(rig.settle(), ControllerState::Enabled);

    // Measured from the last firing tick, not from login.
    rig.wait(ACTIVITY_TIMEOUT - super::DEBOUNCE - TICK * 4);
    assert_eq!(rig.tick(), ControllerState::Enabled);
    rig.wait(TICK * 4);
    assert_eq!(rig.tick(), ControllerState::Init);
}

#[test]
fn switching_user_restarts_activity_timer() {
    let mut rig = Rig::logged_in(1000);

    rig.wait(ACTIVITY_TIMEOUT - TICK * 4);
    assert_eq!(rig.scan(BOB), ControllerState::Enabled);

    rig.wait(TICK * 8);
    assert_eq!(rig.tick(), ControllerState::Enabled);
    assert_eq!(rig.controller.snapshot().credential, Some(cred(BOB)));
}

// ── Whitelist reloads ───────────────────────────────────────────────

#[test]
fn whitelist_swap_keeps_open_session() {
    let mut rig = Rig::logged_in(1000);

    rig.controller.refresh_whitelist(whitelist(&[BOB]));
    assert_eq!(rig.tick(), ControllerState::Enabled);
    assert_eq!(rig.controller.snapshot().credential, Some(cred(ALICE)));
    assert_eq!(rig.controller.snapshot().whitelist_len, 1);

    // The removed badge may still cut until the session ends.
    assert_eq!(rig.fire_to(1050), ControllerState::Firing);
    assert_eq!(rig.settle(), ControllerState::Enabled);
    assert_eq!(rig.sink.cuts().len(), 1);

    assert_eq!(rig.scan(ALICE), ControllerState::Init);
    assert_eq!(rig.scan(ALICE), ControllerState::Init);
    assert_eq!(rig.sink.attempts().last(), Some(&(cred(ALICE), false)));
}

#[test]
fn whitelist_swap_admits_new_badge() {
    let mut rig = Rig::new();
    rig.baseline(0);
    assert_eq!(rig.scan(MALLORY), ControllerState::Init);

    rig.controller
        .refresh_whitelist(whitelist(&[ALICE, BOB, MALLORY]));
    assert_eq!(rig.scan(MALLORY), ControllerState::Enabled);
}
