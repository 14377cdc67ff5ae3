//! Portal client over HTTP.
//!
//! Every call carries the credential as the `Authorization` header and is
//! bounded by the agent's connect and overall timeouts, so no send can stall
//! an episode indefinitely.
//!
//! Only status polls are retried (with exponential backoff). Start and send
//! change portal state, so a failed attempt is surfaced immediately.

use super::wire::{self, PortalRequest, PORTAL_ENDPOINT, START_ENDPOINT, STATUS_ENDPOINT};
use super::{SendCollaborator, StartCollaborator, StatusCollaborator};
use crate::config::Credential;
use mx_common::{Channel, EpisodeStatus, Error, Result, SendOutcome};
use std::io;
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connection settings for [`HttpPortalClient`].
#[derive(Debug, Clone)]
pub struct HttpPortalConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    pub credential: Credential,
    /// Upper bound on a whole request, including reading the body.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Extra attempts for a failed status poll.
    pub status_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_backoff: Duration,
}

/// Blocking portal client backed by a shared `ureq` agent.
#[derive(Debug)]
pub struct HttpPortalClient {
    agent: ureq::Agent,
    config: HttpPortalConfig,
}

impl HttpPortalClient {
    pub fn new(mut config: HttpPortalConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("mortyx/", env!("CARGO_PKG_VERSION")))
            .build();
        HttpPortalClient { agent, config }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    fn read_body(&self, endpoint: &str, response: ureq::Response) -> Result<String> {
        response
            .into_string()
            .map_err(|e| self.map_io(endpoint, e))
    }

    fn map_error(&self, endpoint: &str, err: ureq::Error) -> Error {
        match err {
            ureq::Error::Status(status @ (401 | 403), _) => Error::Auth { status },
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                Error::Transport(format!(
                    "{} returned HTTP {}: {}",
                    endpoint,
                    status,
                    truncate(&body, 200)
                ))
            }
            ureq::Error::Transport(transport) => {
                let timed_out = std::error::Error::source(&transport)
                    .and_then(|s| s.downcast_ref::<io::Error>())
                    .is_some_and(|e| is_timeout(e.kind()));
                if timed_out {
                    Error::Timeout {
                        seconds: self.config.request_timeout.as_secs(),
                    }
                } else {
                    Error::Transport(format!("{}: {}", endpoint, transport))
                }
            }
        }
    }

    fn map_io(&self, endpoint: &str, err: io::Error) -> Error {
        if is_timeout(err.kind()) {
            Error::Timeout {
                seconds: self.config.request_timeout.as_secs(),
            }
        } else {
            Error::Transport(format!("{}: reading body: {}", endpoint, err))
        }
    }

    fn decode_status(endpoint: &str, body: &str) -> Result<EpisodeStatus> {
        wire::parse_status(body.as_bytes()).map_err(|e| Error::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: format!("{} (body: {})", e, truncate(body, 200)),
        })
    }

    fn fetch_status_once(&self) -> Result<EpisodeStatus> {
        let response = self
            .agent
            .get(&self.url(STATUS_ENDPOINT))
            .set("Authorization", self.config.credential.expose())
            .call()
            .map_err(|e| self.map_error(STATUS_ENDPOINT, e))?;
        let body = self.read_body(STATUS_ENDPOINT, response)?;
        Self::decode_status(STATUS_ENDPOINT, &body)
    }
}

impl StartCollaborator for HttpPortalClient {
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    fn start(&self) -> Result<EpisodeStatus> {
        debug!("starting episode");
        let response = self
            .agent
            .post(&self.url(START_ENDPOINT))
            .set("Authorization", self.config.credential.expose())
            .call()
            .map_err(|e| self.map_error(START_ENDPOINT, e))?;
        let body = self.read_body(START_ENDPOINT, response)?;
        Self::decode_status(START_ENDPOINT, &body)
    }
}

impl SendCollaborator for HttpPortalClient {
    fn send(&self, channel: Channel, count: u32) -> Result<SendOutcome> {
        let response = self
            .agent
            .post(&self.url(PORTAL_ENDPOINT))
            .set("Authorization", self.config.credential.expose())
            .send_json(PortalRequest::new(channel, count))
            .map_err(|e| self.map_error(PORTAL_ENDPOINT, e))?;
        let body = self.read_body(PORTAL_ENDPOINT, response)?;
        let outcome = wire::parse_portal(body.as_bytes()).map_err(|e| Error::MalformedResponse {
            endpoint: PORTAL_ENDPOINT.to_string(),
            message: format!("{} (body: {})", e, truncate(&body, 200)),
        })?;
        debug!(
            channel = %channel,
            count,
            sent = outcome.sent,
            survived = outcome.survived,
            "portal send"
        );
        Ok(outcome)
    }
}

impl StatusCollaborator for HttpPortalClient {
    fn status(&self) -> Result<EpisodeStatus> {
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0;
        loop {
            match self.fetch_status_once() {
                Ok(status) => return Ok(status),
                Err(err) if attempt < self.config.status_retries && is_retryable(&err) => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max = self.config.status_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "status poll failed, retrying"
                    );
                    thread::sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_retryable(err: &Error) -> bool {
    matches!(err, Error::Transport(_) | Error::Timeout { .. })
}

fn is_timeout(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &s[..end])
}
