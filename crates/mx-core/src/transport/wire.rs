//! JSON shapes of the portal API.
//!
//! Field names follow the service; conversion into the shared episode
//! types happens here so nothing else depends on them.

use mx_common::{Channel, EpisodeStatus, SendOutcome};
use serde::{Deserialize, Serialize};

pub const START_ENDPOINT: &str = "/api/mortys/start/";
pub const PORTAL_ENDPOINT: &str = "/api/mortys/portal/";
pub const STATUS_ENDPOINT: &str = "/api/mortys/status/";

/// Body of `POST /api/mortys/portal/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalRequest {
    pub planet: usize,
    pub morty_count: u32,
}

impl PortalRequest {
    pub fn new(channel: Channel, count: u32) -> Self {
        PortalRequest {
            planet: channel.index(),
            morty_count: count,
        }
    }
}

/// Response of the start and status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub morties_in_citadel: u32,
    pub morties_on_planet_jessica: u32,
    pub morties_lost: u32,
    pub steps_taken: u32,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl From<StatusResponse> for EpisodeStatus {
    fn from(r: StatusResponse) -> Self {
        EpisodeStatus {
            remaining_in_source: r.morties_in_citadel,
            delivered: r.morties_on_planet_jessica,
            lost: r.morties_lost,
            steps_taken: r.steps_taken,
            status_message: r.status_message.filter(|m| !m.is_empty()),
        }
    }
}

/// Response of the portal endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalResponse {
    pub morties_sent: u32,
    pub survived: bool,
    pub morties_in_citadel: u32,
    pub morties_on_planet_jessica: u32,
    pub morties_lost: u32,
    pub steps_taken: u32,
}

impl From<PortalResponse> for SendOutcome {
    fn from(r: PortalResponse) -> Self {
        SendOutcome {
            sent: r.morties_sent,
            survived: r.survived,
            remaining_in_source: r.morties_in_citadel,
            delivered: r.morties_on_planet_jessica,
            lost: r.morties_lost,
            steps_taken: r.steps_taken,
        }
    }
}

/// Decode a start/status body.
pub fn parse_status(body: &[u8]) -> Result<EpisodeStatus, serde_json::Error> {
    serde_json::from_slice::<StatusResponse>(body).map(EpisodeStatus::from)
}

/// Decode a portal body.
pub fn parse_portal(body: &[u8]) -> Result<SendOutcome, serde_json::Error> {
    serde_json::from_slice::<PortalResponse>(body).map(SendOutcome::from)
}
