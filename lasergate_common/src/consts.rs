//! System-wide constants and configuration defaults.

use static_assertions::const_assert_eq;

// ─── Credentials ────────────────────────────────────────────────────

/// Canonical credential length (characters).
pub const CREDENTIAL_LEN: usize = 8;

/// Length of the long wire variant returned by some reader firmware.
pub const WIRE_CREDENTIAL_LEN: usize = 10;

/// Leading characters dropped from the long wire variant.
pub const WIRE_CREDENTIAL_PREFIX_LEN: usize = 2;

const_assert_eq!(WIRE_CREDENTIAL_LEN - WIRE_CREDENTIAL_PREFIX_LEN, CREDENTIAL_LEN);

// ─── Display ────────────────────────────────────────────────────────

/// Character columns per display line.
pub const DISPLAY_WIDTH: usize = 16;

/// Idle prompt shown while no session is active.
pub const IDLE_PROMPT: (&str, &str) = ("Scan badge", "to begin");

/// First line shown right after a successful login.
pub const WELCOME_LINE: &str = "Welcome";

// ─── Device ─────────────────────────────────────────────────────────

/// Default serial device of the attached controller.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/ttyACM0";

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default upper bound on waiting for a reply line [ms].
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 500;

// ─── Controller ─────────────────────────────────────────────────────

/// Default sleep between controller ticks [ms].
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default idle time before a session is closed [s].
pub const DEFAULT_ACTIVITY_TIMEOUT_S: u64 = 300;

/// Default hold window absorbing odometer plateaus while firing [ms].
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// Default price per minute of firing.
pub const DEFAULT_UNIT_PRICE: f64 = 0.50;

// ─── Whitelist ──────────────────────────────────────────────────────

/// Default whitelist cache file (one credential per line).
pub const DEFAULT_WHITELIST_PATH: &str = "authorized.txt";

/// Default whitelist reload cadence [s].
pub const DEFAULT_WHITELIST_REFRESH_S: u64 = 60;

// ─── Reporting ──────────────────────────────────────────────────────

/// Default HTTP request timeout for report delivery [s].
pub const DEFAULT_REQUEST_TIMEOUT_S: u64 = 10;

/// Default capacity of the outbound report queue.
pub const DEFAULT_REPORT_QUEUE_CAPACITY: usize = 256;
