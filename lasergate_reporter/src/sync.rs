//! Whitelist download and local cache.
//!
//! The downloaded body is normalized with the same rules the control unit
//! applies when loading the cache, then written to a sibling temp file and
//! renamed over the cache so the control unit never reads a partial list.

use std::fs;
use std::path::{Path, PathBuf};

use lasergate_common::whitelist::{Whitelist, WhitelistError, parse_whitelist};
use tracing::{debug, info};

use crate::client::{ReportClient, ReportError};

/// Write `whitelist` to `path`, one credential per line, sorted.
pub fn write_cache(path: &Path, whitelist: &Whitelist) -> Result<(), WhitelistError> {
    let mut entries: Vec<&str> = whitelist.iter().map(|c| c.as_str()).collect();
    entries.sort_unstable();

    let mut body = entries.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }

    let tmp = temp_path(path);
    fs::write(&tmp, body).map_err(|source| WhitelistError::Write {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| WhitelistError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Whitelist cache written to {path:?}");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Fetch the whitelist and replace the cache at `path`.
///
/// Returns the number of credentials written.
pub async fn sync_whitelist(client: &ReportClient, path: &Path) -> Result<usize, ReportError> {
    let body = client.fetch_whitelist().await?;
    let whitelist = parse_whitelist(&body);
    write_cache(path, &whitelist)?;
    info!("Whitelist synchronized: {} fobs", whitelist.len());
    Ok(whitelist.len())
}
