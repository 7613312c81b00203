//! RFID credential token.
//!
//! A [`Credential`] is a fixed-length opaque token read from a presented
//! RFID fob. It is stored inline (no heap) so that it can be copied through
//! the control loop and used as a whitelist key.
//!
//! Two normalization rules exist:
//!
//! | Source | Accepted input | Result |
//! |--------|----------------|--------|
//! | wire reply (`r…`) | 8 or 10 chars | 10 → last 8 |
//! | whitelist entry | ≥ 8 chars | last 8 |

use std::fmt;
use std::str::FromStr;

use heapless::String as InlineString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::consts::{CREDENTIAL_LEN, WIRE_CREDENTIAL_LEN, WIRE_CREDENTIAL_PREFIX_LEN};

/// Errors produced while normalizing a credential string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Input length does not match any accepted variant.
    #[error("invalid credential length {len} (expected {expected})")]
    InvalidLength { len: usize, expected: &'static str },

    /// Input contains whitespace, control or non-ASCII characters.
    #[error("credential contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Normalized 8-character credential.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Credential(InlineString<CREDENTIAL_LEN>);

impl Credential {
    /// Parse a canonical 8-character credential.
    pub fn new(raw: &str) -> Result<Self, CredentialError> {
        if raw.len() != CREDENTIAL_LEN {
            return Err(CredentialError::InvalidLength {
                len: raw.len(),
                expected: "8",
            });
        }
        Self::from_canonical(raw)
    }

    /// Normalize a credential as sent by the reader firmware.
    ///
    /// The 10-character variant carries two leading characters that are not
    /// part of the token; only its last 8 characters are authoritative.
    pub fn from_wire(raw: &str) -> Result<Self, CredentialError> {
        match raw.len() {
            CREDENTIAL_LEN => Self::from_canonical(raw),
            WIRE_CREDENTIAL_LEN => Self::from_canonical(tail(raw, WIRE_CREDENTIAL_PREFIX_LEN)?),
            len => Err(CredentialError::InvalidLength {
                len,
                expected: "8 or 10",
            }),
        }
    }

    /// Normalize a whitelist entry: tokens longer than 8 characters keep
    /// their last 8.
    pub fn from_whitelist_entry(raw: &str) -> Result<Self, CredentialError> {
        let raw = raw.trim();
        if raw.len() < CREDENTIAL_LEN {
            return Err(CredentialError::InvalidLength {
                len: raw.len(),
                expected: ">= 8",
            });
        }
        Self::from_canonical(tail(raw, raw.len() - CREDENTIAL_LEN)?)
    }

    /// Token as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn from_canonical(raw: &str) -> Result<Self, CredentialError> {
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii_graphic()) {
            return Err(CredentialError::InvalidCharacter(bad));
        }
        let inner = InlineString::try_from(raw).map_err(|_| CredentialError::InvalidLength {
            len: raw.len(),
            expected: "8",
        })?;
        Ok(Self(inner))
    }
}

/// Slice off the first `skip` bytes, rejecting a split inside a multi-byte char.
fn tail(raw: &str, skip: usize) -> Result<&str, CredentialError> {
    raw.get(skip..).ok_or_else(|| {
        let bad = raw.chars().find(|c| !c.is_ascii()).unwrap_or('\u{FFFD}');
        CredentialError::InvalidCharacter(bad)
    })
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.as_str())
    }
}

impl AsRef<str> for Credential {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Credential::new(&raw).map_err(serde::de::Error::custom)
    }
}
