//! Running reward estimate for a single action.

use mx_math::{clamp_unit, mean};
use serde::Serialize;

/// Observed rewards for one action and their mean.
///
/// `history` is append-only and `avg_reward` always equals its mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionStats {
    history: Vec<f64>,
    avg_reward: f64,
}

impl ActionStats {
    /// Stats for an action observed once with `reward`.
    pub fn new(reward: f64) -> Self {
        let reward = clamp_unit(reward);
        ActionStats {
            history: vec![reward],
            avg_reward: reward,
        }
    }

    /// Record one more reward and recompute the mean over the full history.
    pub fn observe(&mut self, reward: f64) {
        self.history.push(clamp_unit(reward));
        self.avg_reward = mean(&self.history);
    }

    pub fn avg_reward(&self) -> f64 {
        self.avg_reward
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Number of observations.
    pub fn pulls(&self) -> usize {
        self.history.len()
    }
}
