//! Credential admission and session ownership.
//!
//! `AuthManager` holds the whitelist and at most one open [`Session`].
//! "Authorized" is exactly "a session exists"; there is no separate flag
//! that could disagree with the stored credential.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use lasergate_common::credential::Credential;
use lasergate_common::usage::UsageSink;
use lasergate_common::whitelist::Whitelist;
use tracing::{debug, info, warn};

/// An open, authorized session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    credential: Credential,
    started_at: Instant,
    started_wall: DateTime<Utc>,
}

impl Session {
    /// Credential that owns the session.
    #[inline]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Monotonic login time.
    #[inline]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Wall-clock login time.
    #[inline]
    pub fn started_wall(&self) -> DateTime<Utc> {
        self.started_wall
    }
}

/// Whitelist membership plus the current session.
pub struct AuthManager {
    whitelist: Whitelist,
    session: Option<Session>,
    sink: Arc<dyn UsageSink>,
}

impl AuthManager {
    /// Create a manager with an initial whitelist.
    pub fn new(whitelist: Whitelist, sink: Arc<dyn UsageSink>) -> Self {
        Self {
            whitelist,
            session: None,
            sink,
        }
    }

    /// Whitelist membership test. Every call emits one attempt report.
    pub fn check_credential(&self, credential: &Credential) -> bool {
        let allowed = self.whitelist.contains(credential);
        self.sink.report_attempt(credential, allowed);
        allowed
    }

    /// Open a session for `credential` if it is whitelisted.
    ///
    /// Returns whether a session is now open for it.
    pub fn login(&mut self, credential: Credential, now: Instant) -> bool {
        if !self.check_credential(&credential) {
            warn!("Access denied for {credential}");
            return false;
        }
        info!("Login: {credential}");
        self.session = Some(Session {
            credential,
            started_at: now,
            started_wall: Utc::now(),
        });
        true
    }

    /// Close the current session, if any. Idempotent.
    pub fn logout(&mut self) -> Option<Session> {
        let closed = self.session.take();
        if let Some(session) = &closed {
            info!("Logout: {}", session.credential);
        }
        closed
    }

    /// Replace the whitelist wholesale.
    ///
    /// An open session stays open even if its credential was removed.
    pub fn refresh_whitelist(&mut self, whitelist: Whitelist) {
        debug!(
            "Whitelist replaced: {} -> {} credentials",
            self.whitelist.len(),
            whitelist.len()
        );
        self.whitelist = whitelist;
    }

    #[inline]
    pub fn is_authorized(&self) -> bool {
        self.session.is_some()
    }

    /// Credential of the open session.
    #[inline]
    pub fn credential(&self) -> Option<&Credential> {
        self.session.as_ref().map(Session::credential)
    }

    #[inline]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[inline]
    pub fn whitelist_len(&self) -> usize {
        self.whitelist.len()
    }
}
