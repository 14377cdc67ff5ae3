//! mortyx common types and errors.
//!
//! This crate provides the foundational types shared across mx-core:
//! - `Action` and `Channel`, the step-level dispatch vocabulary
//! - Episode status and per-channel outcome records
//! - The unified error type
//! - Output format specifications

pub mod action;
pub mod episode;
pub mod error;
pub mod output;

pub use action::{Action, Channel, CHANNEL_COUNT};
pub use episode::{ChannelOutcome, EpisodeStatus, SendOutcome};
pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;
