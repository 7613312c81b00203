//! Integration test: firing line enforcement.
//!
//! The odometer advancing without an authorized, enabled session is a
//! safety violation: the controller forces INIT, disables the line, and
//! counts the event. Failed line writes are retried on the next tick.

use lasergate_common::state::ControllerState;
use proptest::prelude::*;

use super::{ALICE, BOB, MALLORY, Rig, cred};

// ── Violations ──────────────────────────────────────────────────────

#[test]
fn odometer_advance_without_session_is_a_violation() {
    let mut rig = Rig::new();
    rig.baseline(1000);
    let disables = rig.sim.command_count(b'd');

    assert_eq!(rig.fire_to(1010), ControllerState::Init);

    assert_eq!(rig.controller.safety_violations(), 1);
    assert!(!rig.sim.is_enabled());
    // INIT side effects are re-applied even though the state did not change.
    assert_eq!(rig.sim.command_count(b'd'), disables + 1);
    assert!(rig.sink.cuts().is_empty());
}

#[test]
fn every_violating_tick_is_counted() {
    let mut rig = Rig::new();
    rig.baseline(1000);
    rig.fire_to(1010);
    rig.fire_to(1020);
    rig.tick();

    assert_eq!(rig.controller.safety_violations(), 2);
    assert_eq!(rig.controller.state(), ControllerState::Init);
}

#[test]
fn odometer_advance_after_logout_is_a_violation() {
    let mut rig = Rig::logged_in(1000);
    assert_eq!(rig.scan(ALICE), ControllerState::Init);

    assert_eq!(rig.fire_to(1005), ControllerState::Init);
    assert_eq!(rig.controller.safety_violations(), 1);
}

#[test]
fn firing_with_line_disabled_is_a_violation() {
    let mut rig = Rig::new();
    rig.baseline(1000);
    rig.sim.fail_next(b'e');
    assert_eq!(rig.scan(ALICE), ControllerState::Enabled);
    assert!(!rig.controller.snapshot().enabled);

    // The firmware reports beam time although the line was never enabled.
    assert_eq!(rig.fire_to(1010), ControllerState::Init);

    assert_eq!(rig.controller.safety_violations(), 1);
    assert!(!rig.controller.auth().is_authorized());
    assert!(!rig.sim.is_enabled());
    assert!(rig.sink.cuts().is_empty());
}

#[test]
fn first_poll_never_counts_as_firing() {
    let mut rig = Rig::new();
    rig.sim.set_odometer(987_654);
    assert_eq!(rig.tick(), ControllerState::Init);
    assert_eq!(rig.tick(), ControllerState::Init);
    assert_eq!(rig.controller.safety_violations(), 0);
}

// ── Line reconciliation ─────────────────────────────────────────────

#[test]
fn failed_enable_is_retried_next_tick() {
    let mut rig = Rig::new();
    rig.baseline(1000);
    rig.sim.fail_next(b'e');

    assert_eq!(rig.scan(ALICE), ControllerState::Enabled);
    assert!(!rig.sim.is_enabled());

    assert_eq!(rig.tick(), ControllerState::Enabled);
    assert!(rig.sim.is_enabled());
    assert_eq!(rig.sim.command_count(b'e'), 1);

    // Enabled lines are not re-commanded.
    rig.tick();
    assert_eq!(rig.sim.command_count(b'e'), 1);
}

#[test]
fn failed_disable_is_retried_in_init() {
    let mut rig = Rig::logged_in(1000);
    rig.sim.fail_next(b'd');

    assert_eq!(rig.scan(ALICE), ControllerState::Init);
    assert!(rig.sim.is_enabled());
    assert!(rig.controller.snapshot().enabled);

    assert_eq!(rig.tick(), ControllerState::Init);
    assert!(!rig.sim.is_enabled());
    assert!(!rig.controller.snapshot().enabled);
}

// ── Faulty polls ────────────────────────────────────────────────────

#[test]
fn malformed_status_keeps_state_and_odometer() {
    let mut rig = Rig::logged_in(1000);
    let faults = rig.controller.channel().fault_count();

    rig.sim.set_odometer(1100);
    rig.sim.inject_reply("garbage");
    assert_eq!(rig.tick(), ControllerState::Enabled);
    assert_eq!(rig.controller.snapshot().odometer, 1000);
    assert_eq!(rig.controller.channel().fault_count(), faults + 1);

    // The next good poll sees the advance against the last good value.
    assert_eq!(rig.tick(), ControllerState::Firing);
    assert_eq!(rig.controller.firing_start(), 1000);
}

#[test]
fn failed_poll_while_firing_keeps_firing() {
    let mut rig = Rig::logged_in(1000);
    rig.fire_to(1010);

    rig.sim.fail_next(b'o');
    assert_eq!(rig.tick(), ControllerState::Firing);
    assert!(rig.sink.cuts().is_empty());
}

#[test]
fn stale_status_lines_are_skipped() {
    let mut rig = Rig::logged_in(1000);
    rig.sim.set_odometer(1040);
    rig.sim.inject_reply("o1000x0\r\no1040x0");

    assert_eq!(rig.tick(), ControllerState::Firing);
    assert_eq!(rig.controller.snapshot().odometer, 1040);
}

// ── Properties ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Step {
    Scan(usize),
    Advance(u64),
    WaitMs(u64),
    FailEnable,
    FailDisable,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..3).prop_map(Step::Scan),
        (0u64..4).prop_map(Step::Advance),
        (0u64..4000).prop_map(Step::WaitMs),
        Just(Step::FailEnable),
        Just(Step::FailDisable),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn controller_invariants_hold(steps in prop::collection::vec(step(), 1..120)) {
        let badges = [ALICE, BOB, MALLORY];
        let mut rig = Rig::new();
        rig.baseline(0);

        for step in steps {
            let before = rig.controller.snapshot();
            let mut advanced = false;
            match step {
                Step::Scan(i) => rig.sim.present_badge(badges[i]),
                Step::Advance(n) => {
                    rig.sim.advance_odometer(n);
                    advanced = n > 0;
                }
                Step::WaitMs(ms) => rig.wait(std::time::Duration::from_millis(ms)),
                Step::FailEnable => rig.sim.fail_next(b'e'),
                Step::FailDisable => rig.sim.fail_next(b'd'),
            }

            let state = rig.tick();
            let after = rig.controller.snapshot();

            // The channel's view of the line always matches the hardware.
            prop_assert_eq!(after.enabled, rig.sim.is_enabled());

            if state == ControllerState::Firing {
                prop_assert!(after.enabled);
                prop_assert!(after.credential.is_some());
            }
            if state == ControllerState::Init {
                prop_assert!(after.credential.is_none());
            }
            if before.state != ControllerState::Firing && state == ControllerState::Firing {
                prop_assert!(advanced);
            }

            // Beam time on a line that was off before the tick is always caught.
            if advanced && !before.enabled {
                prop_assert_eq!(state, ControllerState::Init);
                prop_assert_eq!(after.safety_violations, before.safety_violations + 1);
            }
            prop_assert!(after.safety_violations >= before.safety_violations);

            let cuts = rig.sink.cuts();
            prop_assert_eq!(cuts.len() as u64, after.cuts_completed);
            for cut in &cuts {
                prop_assert_eq!(cut.duration, cut.end_odometer.saturating_sub(cut.start_odometer));
                prop_assert!(cut.credential == cred(ALICE) || cut.credential == cred(BOB));
            }
        }
    }
}
