//! Collaborators the episode loop talks to.
//!
//! The policy core never touches the network itself. It depends on three
//! narrow capabilities, implemented by:
//! - [`HttpPortalClient`]: the real portal API over HTTPS
//! - [`SimulatedPortal`]: an offline game with fixed survival odds
//!
//! Retry policy lives here, not in the episode loop.

pub mod http;
pub mod sim;
pub mod wire;

pub use http::{HttpPortalClient, HttpPortalConfig};
pub use sim::{SimulatedPortal, SimulationConfig};

use mx_common::{Channel, EpisodeStatus, Result, SendOutcome};

/// Begins an episode and reports the initial pool.
pub trait StartCollaborator {
    fn start(&self) -> Result<EpisodeStatus>;
}

/// Commits units to a single channel.
///
/// Sends for one step may be issued from several threads at once.
pub trait SendCollaborator: Sync {
    fn send(&self, channel: Channel, count: u32) -> Result<SendOutcome>;
}

/// Polls the current episode counters.
pub trait StatusCollaborator {
    fn status(&self) -> Result<EpisodeStatus>;
}

/// Everything an episode needs from the outside world.
pub trait Portal: StartCollaborator + SendCollaborator + StatusCollaborator {}

impl<T> Portal for T where T: StartCollaborator + SendCollaborator + StatusCollaborator {}
