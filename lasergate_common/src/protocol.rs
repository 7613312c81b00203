//! Wire protocol of the attached laser controller.
//!
//! Strict request/reply over a byte stream. Every request is one ASCII
//! command character, optionally followed by a text payload, terminated by
//! `\n`. Only read-type commands produce a reply line.
//!
//! | Byte | Operation            | Reply             |
//! |------|----------------------|-------------------|
//! | `e`  | enable firing line   | –                 |
//! | `d`  | disable firing line  | –                 |
//! | `o`  | status poll          | `o<digits>x<0|1>` |
//! | `r`  | read credential      | `r<8 or 10 chars>`|
//! | `p`  | display line 1       | –                 |
//! | `q`  | display line 2       | –                 |
//! | `x`  | reset odometer       | –                 |
//! | `y`  | latch cut time       | –                 |
//! | `z`  | read cut time        | `[z]<digits>`     |

use thiserror::Error;

use crate::consts::DISPLAY_WIDTH;
use crate::credential::{Credential, CredentialError};

/// Line terminator for requests and replies.
pub const LINE_END: u8 = b'\n';

/// Separator between odometer digits and scan flag in a status reply.
pub const STATUS_FLAG_DELIMITER: char = 'x';

/// Malformed reply from the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// No reply line in the received buffer.
    #[error("empty reply")]
    Empty,

    /// Reply does not start with the expected opcode.
    #[error("expected reply prefix '{expected}', got {reply:?}")]
    UnexpectedPrefix { expected: char, reply: String },

    /// Status reply without the `x` delimiter.
    #[error("status reply missing delimiter: {0:?}")]
    MissingDelimiter(String),

    /// Counter field is empty, non-numeric or overflows.
    #[error("invalid counter in reply: {0:?}")]
    InvalidCounter(String),

    /// Scan flag is not `0` or `1`.
    #[error("invalid scan flag in reply: {0:?}")]
    InvalidFlag(String),

    /// Credential payload has the wrong shape.
    #[error("invalid credential in reply: {0}")]
    Credential(#[from] CredentialError),
}

// ─── Requests ───────────────────────────────────────────────────────

/// One request to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Enable,
    Disable,
    Status,
    ReadCredential,
    DisplayLine1(&'a str),
    DisplayLine2(&'a str),
    ResetCounter,
    UpdateCutTime,
    ReadCutTime,
}

impl Command<'_> {
    /// Opcode byte.
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Enable => b'e',
            Self::Disable => b'd',
            Self::Status => b'o',
            Self::ReadCredential => b'r',
            Self::DisplayLine1(_) => b'p',
            Self::DisplayLine2(_) => b'q',
            Self::ResetCounter => b'x',
            Self::UpdateCutTime => b'y',
            Self::ReadCutTime => b'z',
        }
    }

    /// Whether the controller answers this command with a reply line.
    pub const fn expects_reply(&self) -> bool {
        matches!(self, Self::Status | Self::ReadCredential | Self::ReadCutTime)
    }

    /// Encode as a newline-terminated request.
    ///
    /// Display payloads are fitted to the display width first.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DISPLAY_WIDTH + 2);
        out.push(self.opcode());
        if let Self::DisplayLine1(text) | Self::DisplayLine2(text) = self {
            out.extend_from_slice(fit_display_line(text).as_bytes());
        }
        out.push(LINE_END);
        out
    }
}

/// Fit display text to one fixed-width line.
///
/// Non-printable and non-ASCII characters become spaces; the result is
/// padded or truncated to exactly [`DISPLAY_WIDTH`] characters.
pub fn fit_display_line(text: &str) -> String {
    let mut line: String = text
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { ' ' })
        .take(DISPLAY_WIDTH)
        .collect();
    while line.len() < DISPLAY_WIDTH {
        line.push(' ');
    }
    line
}

// ─── Replies ────────────────────────────────────────────────────────

/// Parsed status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReply {
    /// Hardware odometer (firmware time units).
    pub odometer: u64,
    /// A new credential is waiting to be read.
    pub scan_pending: bool,
}

/// Return the last non-empty line of a receive buffer.
///
/// A read may drain more than one line when the controller emitted stale
/// output; the most recent line is authoritative.
pub fn last_line(buffer: &str) -> Option<&str> {
    buffer.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

/// Parse `o<digits>x<0|1>`.
pub fn parse_status(reply: &str) -> Result<StatusReply, ProtocolError> {
    let line = last_line(reply).ok_or(ProtocolError::Empty)?;
    let body = strip_prefix(line, 'o')?;
    let (digits, flag) = body
        .split_once(STATUS_FLAG_DELIMITER)
        .ok_or_else(|| ProtocolError::MissingDelimiter(line.to_string()))?;

    let odometer =
        parse_counter(digits).ok_or_else(|| ProtocolError::InvalidCounter(line.to_string()))?;
    let scan_pending = match flag {
        "0" => false,
        "1" => true,
        _ => return Err(ProtocolError::InvalidFlag(line.to_string())),
    };

    Ok(StatusReply {
        odometer,
        scan_pending,
    })
}

/// Parse `r<8 or 10 chars>` into a normalized credential.
pub fn parse_credential(reply: &str) -> Result<Credential, ProtocolError> {
    let line = last_line(reply).ok_or(ProtocolError::Empty)?;
    let body = strip_prefix(line, 'r')?;
    Ok(Credential::from_wire(body)?)
}

/// Parse a cut-time reply; the leading `z` is optional.
pub fn parse_cut_time(reply: &str) -> Result<u64, ProtocolError> {
    let line = last_line(reply).ok_or(ProtocolError::Empty)?;
    let digits = line.strip_prefix('z').unwrap_or(line);
    parse_counter(digits).ok_or_else(|| ProtocolError::InvalidCounter(line.to_string()))
}

fn strip_prefix(line: &str, expected: char) -> Result<&str, ProtocolError> {
    line.strip_prefix(expected)
        .ok_or_else(|| ProtocolError::UnexpectedPrefix {
            expected,
            reply: line.to_string(),
        })
}

fn parse_counter(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
