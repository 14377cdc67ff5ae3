//! mortyx core library.
//!
//! An epsilon-greedy agent that plays the portal game: each step it splits
//! the remaining pool across three channels, observes which batches
//! survived, and folds the fraction that made it into a per-action reward
//! estimate.
//!
//! - [`policy`]: reward estimator, action table and the policy engine
//! - [`transport`]: collaborator traits, the HTTP client and a simulator
//! - [`episode`]: the loop tying policy and transport together

pub mod config;
pub mod episode;
pub mod exit_codes;
pub mod logging;
pub mod policy;
pub mod report;
pub mod transport;

pub use episode::{EpisodeOutcome, EpisodeReport, EpisodeRunner};
pub use exit_codes::ExitCode;
