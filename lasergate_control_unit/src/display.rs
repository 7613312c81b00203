//! Two-line display content.

use lasergate_common::consts::{IDLE_PROMPT, WELCOME_LINE};
use lasergate_common::credential::Credential;
use lasergate_common::usage::cost_for;

/// Lines shown while no session is open.
pub fn idle() -> (String, String) {
    (IDLE_PROMPT.0.to_string(), IDLE_PROMPT.1.to_string())
}

/// Lines shown right after a login.
pub fn welcome(credential: &Credential) -> (String, String) {
    (WELCOME_LINE.to_string(), credential.to_string())
}

/// `Time: m:ss` / `Cost: $d.cc` for `elapsed` odometer units.
pub fn usage(elapsed: u64, unit_price: f64) -> (String, String) {
    let minutes = elapsed / 60;
    let seconds = elapsed % 60;
    (
        format!("Time: {minutes}:{seconds:02}"),
        format!("Cost: ${:.2}", cost_for(elapsed, unit_price)),
    )
}
