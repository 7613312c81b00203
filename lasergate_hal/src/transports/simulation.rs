//! Simulated laser controller.
//!
//! `SimulatedLaser` emulates the controller firmware in-process so the
//! control unit can run without hardware (`--simulate`) and tests can drive
//! the odometer and badge reader deterministically.
//!
//! The firmware state lives behind a shared [`SimulatorHandle`]; the
//! transport half is handed to the resource channel while the handle stays
//! with the test or the operator console.
//!
//! | Request | Emulated behavior                                   |
//! |---------|-----------------------------------------------------|
//! | `e`/`d` | set/clear the firing line                           |
//! | `o`     | reply `o<odometer>x<scan>`; accrue beam time first  |
//! | `r`     | reply `r<badge>` and clear the scan flag            |
//! | `p`/`q` | store display line                                  |
//! | `x`     | zero the odometer                                   |
//! | `y`/`z` | latch / report the cut time                         |

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lasergate_common::hal::{HalError, Transport};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Emulated firmware state.
#[derive(Debug)]
struct FirmwareState {
    odometer: u64,
    enabled: bool,
    badge: Option<String>,
    scan_pending: bool,
    cut_time: u64,
    display: (String, String),
    /// Beam switched on by the operator; accrues odometer while enabled.
    beam_since: Option<Instant>,
    /// Sub-second beam time not yet accounted on the odometer.
    beam_carry: Duration,
    /// Replies waiting to be read.
    outbox: VecDeque<String>,
    /// Replies that replace the next generated reply.
    injected: VecDeque<String>,
    /// Every request line received, without the terminator.
    commands: Vec<String>,
    /// Opcode whose next request fails with an I/O error.
    fail_next: Option<u8>,
    /// The next receive times out and leaves its reply queued.
    late_reply: bool,
    /// Replies already queued when the current request was sent. They reach
    /// the reader ahead of the new reply, which is still in flight.
    stale_lines: usize,
}

impl FirmwareState {
    fn new() -> Self {
        Self {
            odometer: 0,
            enabled: false,
            badge: None,
            scan_pending: false,
            cut_time: 0,
            display: (String::new(), String::new()),
            beam_since: None,
            beam_carry: Duration::ZERO,
            outbox: VecDeque::new(),
            injected: VecDeque::new(),
            commands: Vec::new(),
            fail_next: None,
            late_reply: false,
            stale_lines: 0,
        }
    }

    /// Move whole seconds of beam time onto the odometer.
    fn accrue_beam(&mut self, now: Instant) {
        let Some(since) = self.beam_since else {
            return;
        };
        if self.enabled {
            let total = self.beam_carry + now.saturating_duration_since(since);
            self.odometer += total.as_secs();
            self.beam_carry = Duration::from_nanos(u64::from(total.subsec_nanos()));
        }
        self.beam_since = Some(now);
    }

    fn reply(&mut self, generated: String) {
        let line = self.injected.pop_front().unwrap_or(generated);
        self.outbox.push_back(line);
    }

    fn execute(&mut self, line: &str) {
        let mut chars = line.chars();
        let Some(opcode) = chars.next() else {
            return;
        };
        let payload = chars.as_str();

        match opcode {
            'e' => self.enabled = true,
            'd' => {
                self.accrue_beam(Instant::now());
                self.enabled = false;
            }
            'o' => {
                self.accrue_beam(Instant::now());
                let reply = format!("o{}x{}", self.odometer, u8::from(self.scan_pending));
                self.reply(reply);
            }
            'r' => {
                let reply = format!("r{}", self.badge.take().unwrap_or_default());
                self.scan_pending = false;
                self.reply(reply);
            }
            'p' => self.display.0 = payload.to_string(),
            'q' => self.display.1 = payload.to_string(),
            'x' => {
                self.odometer = 0;
                self.beam_carry = Duration::ZERO;
            }
            'y' => self.cut_time = self.odometer,
            'z' => {
                let reply = format!("z{}", self.cut_time);
                self.reply(reply);
            }
            other => debug!("Simulated firmware ignoring opcode {other:?}"),
        }
    }
}

/// Control handle for a [`SimulatedLaser`].
///
/// Cloning the handle shares the same emulated firmware.
#[derive(Debug, Clone)]
pub struct SimulatorHandle {
    state: Arc<Mutex<FirmwareState>>,
}

impl SimulatorHandle {
    // ─── Stimuli ────────────────────────────────────────────────────

    /// Present a badge to the reader; raises the scan flag.
    pub fn present_badge(&self, raw: &str) {
        let mut state = self.state.lock();
        state.badge = Some(raw.to_string());
        state.scan_pending = true;
    }

    /// Advance the odometer regardless of the firing line.
    pub fn advance_odometer(&self, delta: u64) {
        self.state.lock().odometer += delta;
    }

    /// Overwrite the odometer.
    pub fn set_odometer(&self, value: u64) {
        self.state.lock().odometer = value;
    }

    /// Switch the beam on or off. While on and enabled, the odometer
    /// counts wall-clock seconds.
    pub fn set_beam(&self, on: bool) {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.accrue_beam(now);
        state.beam_since = on.then_some(now);
        if !on {
            state.beam_carry = Duration::ZERO;
        }
    }

    /// Replace the next generated reply with `reply`.
    pub fn inject_reply(&self, reply: &str) {
        self.state.lock().injected.push_back(reply.to_string());
    }

    /// Let the next reply arrive only after its request has timed out.
    pub fn delay_next_reply(&self) {
        self.state.lock().late_reply = true;
    }

    /// Make the next request with `opcode` fail with an I/O error.
    pub fn fail_next(&self, opcode: u8) {
        self.state.lock().fail_next = Some(opcode);
    }

    // ─── Observations ───────────────────────────────────────────────

    /// Current odometer.
    pub fn odometer(&self) -> u64 {
        self.state.lock().odometer
    }

    /// Firing line state as commanded.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Current display lines.
    pub fn display(&self) -> (String, String) {
        self.state.lock().display.clone()
    }

    /// All request lines received so far.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    /// Number of requests with the given opcode.
    pub fn command_count(&self, opcode: u8) -> usize {
        self.state
            .lock()
            .commands
            .iter()
            .filter(|c| c.as_bytes().first() == Some(&opcode))
            .count()
    }

    /// Forget the request log.
    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }
}

/// In-process emulation of the controller firmware.
#[derive(Debug)]
pub struct SimulatedLaser {
    handle: SimulatorHandle,
}

impl SimulatedLaser {
    /// Create a powered-up controller: odometer 0, firing line disabled.
    pub fn new() -> Self {
        Self {
            handle: SimulatorHandle {
                state: Arc::new(Mutex::new(FirmwareState::new())),
            },
        }
    }

    /// Shared control handle.
    pub fn handle(&self) -> SimulatorHandle {
        self.handle.clone()
    }
}

impl Default for SimulatedLaser {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedLaser {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn send(&mut self, request: &[u8]) -> Result<(), HalError> {
        let mut state = self.handle.state.lock();
        if state.fail_next.is_some() && state.fail_next == request.first().copied() {
            state.fail_next = None;
            return Err(HalError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }

        state.stale_lines = state.outbox.len();
        let text = String::from_utf8_lossy(request);
        for line in text.split('\n').filter(|l| !l.is_empty()) {
            trace!("sim -> {line:?}");
            state.commands.push(line.to_string());
            state.execute(line);
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<String, HalError> {
        let mut state = self.handle.state.lock();
        if state.outbox.is_empty() || std::mem::take(&mut state.late_reply) {
            return Err(HalError::Timeout(Duration::ZERO));
        }
        let available = match std::mem::take(&mut state.stale_lines) {
            0 => state.outbox.len(),
            stale => stale,
        };
        let mut buffer = String::new();
        for line in state.outbox.drain(..available) {
            buffer.push_str(&line);
            buffer.push_str("\r\n");
        }
        Ok(buffer)
    }

    fn discard_input(&mut self) -> Result<(), HalError> {
        let mut state = self.handle.state.lock();
        if !state.outbox.is_empty() {
            debug!("Simulator discarding {} unread replies", state.outbox.len());
            state.outbox.clear();
        }
        state.stale_lines = 0;
        Ok(())
    }
}
