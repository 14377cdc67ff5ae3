//! Actions and the channels they dispatch to.
//!
//! An [`Action`] is one step's dispatch plan: how many units go to each of
//! the three channels. It is a plain value type, compared and hashed by its
//! components, so it can key the action table directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of channels in the game.
pub const CHANNEL_COUNT: usize = 3;

/// One of the three delivery targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    OnACob,
    CronenbergWorld,
    PurgePlanet,
}

impl Channel {
    /// All channels in wire index order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::OnACob,
        Channel::CronenbergWorld,
        Channel::PurgePlanet,
    ];

    /// Wire index of the channel (the `planet` field of a portal request).
    pub fn index(self) -> usize {
        match self {
            Channel::OnACob => 0,
            Channel::CronenbergWorld => 1,
            Channel::PurgePlanet => 2,
        }
    }

    /// Channel for a wire index, if valid.
    pub fn from_index(index: usize) -> Option<Channel> {
        Channel::ALL.get(index).copied()
    }

    /// Human-readable planet name.
    pub fn name(self) -> &'static str {
        match self {
            Channel::OnACob => "On a Cob Planet",
            Channel::CronenbergWorld => "Cronenberg World",
            Channel::PurgePlanet => "The Purge Planet",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-channel unit counts for a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action([u32; CHANNEL_COUNT]);

impl Action {
    pub const fn new(a0: u32, a1: u32, a2: u32) -> Self {
        Action([a0, a1, a2])
    }

    /// Commit `count` units to the first channel and none to the others.
    pub const fn single_channel(count: u32) -> Self {
        Action([count, 0, 0])
    }

    pub fn components(&self) -> [u32; CHANNEL_COUNT] {
        self.0
    }

    /// Units sent to `channel`.
    pub fn count(&self, channel: Channel) -> u32 {
        self.0[channel.index()]
    }

    /// Total units across all channels.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Channels with a non-zero count, paired with that count.
    pub fn dispatches(&self) -> impl Iterator<Item = (Channel, u32)> + '_ {
        Channel::ALL
            .into_iter()
            .map(|ch| (ch, self.count(ch)))
            .filter(|&(_, n)| n > 0)
    }
}

impl From<[u32; CHANNEL_COUNT]> for Action {
    fn from(components: [u32; CHANNEL_COUNT]) -> Self {
        Action(components)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    /// Parses `a,b,c` (optionally wrapped in parentheses).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != CHANNEL_COUNT {
            return Err(format!("expected 3 comma-separated counts, got '{}'", s));
        }
        let mut out = [0u32; CHANNEL_COUNT];
        for (slot, part) in out.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid count '{}' in '{}'", part, s))?;
        }
        Ok(Action(out))
    }
}
