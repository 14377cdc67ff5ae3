//! Structured event vocabulary for logging.
//!
//! Every episode event carries the run ID and a stage so JSONL output can
//! be filtered per run and per phase of a step.

use serde::{Deserialize, Serialize};

/// Phases of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Episode start call.
    Start,
    /// Policy selection.
    Decide,
    /// Per-channel portal sends.
    Send,
    /// Reward computation and table update.
    Observe,
    /// Status poll after a step.
    Status,
    /// Episode wrap-up and report.
    Finish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Start => "start",
            Stage::Decide => "decide",
            Stage::Send => "send",
            Stage::Observe => "observe",
            Stage::Status => "status",
            Stage::Finish => "finish",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";

    pub const EPISODE_STARTED: &str = "episode.started";
    pub const EPISODE_STEP: &str = "episode.step";
    pub const EPISODE_FINISHED: &str = "episode.finished";
    pub const EPISODE_ABORTED: &str = "episode.aborted";
    pub const EPISODE_CANCELLED: &str = "episode.cancelled";

    pub const POLICY_DECIDED: &str = "policy.decided";
    pub const POLICY_UPDATED: &str = "policy.updated";

    pub const PORTAL_SENT: &str = "portal.sent";
}

/// Correlation data attached to every episode event.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Whether the run talks to the real portal or the simulator.
    pub mode: &'static str,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, mode: &'static str) -> Self {
        LogContext {
            run_id: run_id.into(),
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Start,
            Stage::Decide,
            Stage::Send,
            Stage::Observe,
            Stage::Status,
            Stage::Finish,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::EPISODE_STEP, "episode.step");
        assert_eq!(event_names::PORTAL_SENT, "portal.sent");
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc", "simulated");
        assert_eq!(ctx.run_id, "run-abc");
        assert_eq!(ctx.mode, "simulated");
    }
}
