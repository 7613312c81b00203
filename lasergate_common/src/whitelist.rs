//! Whitelist sources.
//!
//! The whitelist is a set of credentials permitted to operate the tool. It
//! is loaded wholesale and swapped atomically between controller ticks.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::credential::Credential;

/// Credential set.
pub type Whitelist = HashSet<Credential>;

/// Whitelist loading failure.
#[derive(Debug, Error)]
pub enum WhitelistError {
    /// Backing file could not be read.
    #[error("failed to read whitelist {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file could not be written.
    #[error("failed to write whitelist {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote source failed.
    #[error("whitelist fetch failed: {0}")]
    Fetch(String),
}

/// Provider of the full credential set.
pub trait WhitelistSource: Send {
    /// Load the complete whitelist.
    fn load(&mut self) -> Result<Whitelist, WhitelistError>;
}

/// Parse a newline-separated credential list.
///
/// Blank lines and `#` comments are skipped. Entries longer than the
/// canonical length keep their last 8 characters; invalid entries are
/// logged and skipped.
pub fn parse_whitelist(text: &str) -> Whitelist {
    let mut out = Whitelist::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Credential::from_whitelist_entry(line) {
            Ok(credential) => {
                out.insert(credential);
            }
            Err(e) => warn!("Skipping whitelist line {}: {e}", idx + 1),
        }
    }
    out
}

/// Whitelist backed by a flat file, one credential per line.
#[derive(Debug, Clone)]
pub struct FileWhitelist {
    path: PathBuf,
}

impl FileWhitelist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WhitelistSource for FileWhitelist {
    fn load(&mut self) -> Result<Whitelist, WhitelistError> {
        let text = fs::read_to_string(&self.path).map_err(|source| WhitelistError::Read {
            path: self.path.clone(),
            source,
        })?;
        let whitelist = parse_whitelist(&text);
        debug!("Loaded {} credentials from {:?}", whitelist.len(), self.path);
        Ok(whitelist)
    }
}

/// Fixed in-memory whitelist.
#[derive(Debug, Clone, Default)]
pub struct StaticWhitelist(pub Whitelist);

impl WhitelistSource for StaticWhitelist {
    fn load(&mut self) -> Result<Whitelist, WhitelistError> {
        Ok(self.0.clone())
    }
}
