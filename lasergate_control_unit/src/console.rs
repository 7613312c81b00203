//! Operator console for `--simulate`.
//!
//! Reads commands from a line-oriented input and applies them to the
//! simulated controller:
//!
//! | Command           | Effect                             |
//! |-------------------|------------------------------------|
//! | `scan <badge>`    | present a badge to the reader      |
//! | `beam on\|off`    | switch the beam                    |
//! | `advance <units>` | add units to the odometer          |
//! | `show`            | log odometer, line and display     |

use std::io::BufRead;

use lasergate_hal::SimulatorHandle;
use tracing::{info, warn};

/// One parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Scan(String),
    Beam(bool),
    Advance(u64),
    Show,
}

impl ConsoleCommand {
    /// Parse one input line. `None` for blank or unknown input.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match (words.next()?, words.next()) {
            ("scan", Some(badge)) => Self::Scan(badge.to_string()),
            ("beam", Some("on")) => Self::Beam(true),
            ("beam", Some("off")) => Self::Beam(false),
            ("advance", Some(units)) => Self::Advance(units.parse().ok()?),
            ("show", None) => Self::Show,
            _ => return None,
        };
        words.next().is_none().then_some(command)
    }

    /// Apply the command to the simulator.
    pub fn apply(&self, sim: &SimulatorHandle) {
        match self {
            Self::Scan(badge) => sim.present_badge(badge),
            Self::Beam(on) => sim.set_beam(*on),
            Self::Advance(units) => sim.advance_odometer(*units),
            Self::Show => {
                let (line1, line2) = sim.display();
                info!(
                    "odometer={} enabled={} display=[{}|{}]",
                    sim.odometer(),
                    sim.is_enabled(),
                    line1.trim_end(),
                    line2.trim_end()
                );
            }
        }
    }
}

/// Apply commands from `input` until it is exhausted.
pub fn run<R: BufRead>(input: R, sim: &SimulatorHandle) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match ConsoleCommand::parse(&line) {
            Some(command) => command.apply(sim),
            None => warn!(
                "Unknown console command {line:?} (scan <badge> | beam on|off | advance <units> | show)"
            ),
        }
    }
}
