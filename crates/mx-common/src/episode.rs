//! Episode state as reported by the portal, and per-channel step outcomes.

use crate::action::Channel;
use serde::{Deserialize, Serialize};

/// Snapshot of the episode counters.
///
/// Owned by the portal; the client only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeStatus {
    /// Units still waiting to be sent.
    pub remaining_in_source: u32,
    /// Units that arrived safely.
    pub delivered: u32,
    /// Units lost in transit.
    pub lost: u32,
    /// Portal-side step counter.
    pub steps_taken: u32,
    /// Free-form message from the portal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl EpisodeStatus {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_in_source == 0
    }
}

/// Result of committing units to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    /// Units the portal accepted for this send.
    pub sent: u32,
    /// Whether the batch survived.
    pub survived: bool,
    /// Pool size after the send.
    pub remaining_in_source: u32,
    pub delivered: u32,
    pub lost: u32,
    pub steps_taken: u32,
}

/// What one channel contributed to a step's reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub sent: u32,
    pub survived: bool,
}

impl ChannelOutcome {
    /// A channel that received nothing this step.
    pub fn idle(channel: Channel) -> Self {
        ChannelOutcome {
            channel,
            sent: 0,
            survived: false,
        }
    }

    /// Units that made it through.
    pub fn survived_units(&self) -> u32 {
        if self.survived {
            self.sent
        } else {
            0
        }
    }
}
