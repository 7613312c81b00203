//! HTTP client for the reporting endpoints.
//!
//! | Call              | Method | Body                                          |
//! |-------------------|--------|-----------------------------------------------|
//! | attempt           | POST   | form: access_point, activity_date, credential, success |
//! | cut               | POST   | JSON: cut record + access_point               |
//! | whitelist         | GET    | –, newline-separated credentials returned     |
//!
//! Every request carries `Authorization: Token <token>`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use lasergate_common::config::ReportingConfig;
use lasergate_common::credential::Credential;
use lasergate_common::usage::CutRecord;
use lasergate_common::whitelist::WhitelistError;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// User-Agent sent when downloading the whitelist; the backend only
/// serves it to wget-like clients.
pub const WHITELIST_USER_AGENT: &str = "Wget/1.20.1 (linux-gnu)";

/// Reporting failure.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Transport-level failure (connect, timeout, TLS, body).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("{url} answered {status}")]
    Status { url: String, status: u16 },

    /// Optional endpoint not configured.
    #[error("reporting.{0} is not configured")]
    MissingUrl(&'static str),

    /// Local whitelist cache could not be written.
    #[error(transparent)]
    Cache(#[from] WhitelistError),
}

/// Form body of an attempt report.
#[derive(Debug, Serialize)]
struct AttemptForm<'a> {
    access_point: &'a str,
    activity_date: String,
    credential: &'a str,
    success: bool,
}

/// JSON body of a cut report.
#[derive(Debug, Serialize)]
struct CutReport<'a> {
    access_point: &'a str,
    #[serde(flatten)]
    record: &'a CutRecord,
}

/// Client for the reporting backend.
pub struct ReportClient {
    config: ReportingConfig,
    http: Client,
}

impl ReportClient {
    /// Build a client with the configured request timeout.
    pub fn new(config: ReportingConfig) -> Result<Self, ReportError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_http(config, http))
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http(config: ReportingConfig, http: Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    fn token_header(&self) -> String {
        format!("Token {}", self.config.token)
    }

    /// Report one admission attempt.
    pub async fn report_attempt(
        &self,
        credential: &Credential,
        success: bool,
        at: DateTime<Utc>,
    ) -> Result<(), ReportError> {
        let form = AttemptForm {
            access_point: &self.config.asset_id,
            activity_date: at.to_rfc3339(),
            credential: credential.as_str(),
            success,
        };
        let response = self
            .http
            .post(&self.config.attempts_url)
            .header(AUTHORIZATION, self.token_header())
            .form(&form)
            .send()
            .await?;
        check_status(response)?;
        debug!("Attempt reported: {credential} success={success}");
        Ok(())
    }

    /// Report one completed cut.
    pub async fn report_cut(&self, record: &CutRecord) -> Result<(), ReportError> {
        let body = CutReport {
            access_point: &self.config.asset_id,
            record,
        };
        let response = self
            .http
            .post(&self.config.sessions_url)
            .header(AUTHORIZATION, self.token_header())
            .json(&body)
            .send()
            .await?;
        check_status(response)?;
        debug!(
            "Cut reported: {} {} units",
            record.credential, record.duration
        );
        Ok(())
    }

    /// Download the raw whitelist body.
    pub async fn fetch_whitelist(&self) -> Result<String, ReportError> {
        let url = self
            .config
            .whitelist_url
            .as_deref()
            .ok_or(ReportError::MissingUrl("whitelist_url"))?;
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, WHITELIST_USER_AGENT)
            .header(AUTHORIZATION, self.token_header())
            .send()
            .await?;
        Ok(check_status(response)?.text().await?)
    }
}

fn check_status(response: Response) -> Result<Response, ReportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ReportError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}
