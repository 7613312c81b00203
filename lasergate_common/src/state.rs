//! Controller state enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization controller state.
///
/// Exactly one state is active; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ControllerState {
    /// No session; firing line disabled.
    #[default]
    Init = 0,
    /// Session open, firing line enabled, tool idle.
    Enabled = 1,
    /// Tool is cutting (odometer advancing, or inside the hold window).
    Firing = 2,
}

impl ControllerState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Init),
            1 => Some(Self::Enabled),
            2 => Some(Self::Firing),
            _ => None,
        }
    }

    /// States in which a session is active and the display shows usage.
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Enabled | Self::Firing)
    }

    /// States in which a badge swipe is processed.
    #[inline]
    pub const fn accepts_scans(&self) -> bool {
        matches!(self, Self::Init | Self::Enabled)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "INIT",
            Self::Enabled => "ENABLED",
            Self::Firing => "FIRING",
        })
    }
}
