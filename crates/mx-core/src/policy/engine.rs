//! Epsilon-greedy action selection over the action table.
//!
//! # Selection
//!
//! ```text
//! p ~ U[0,1)
//! p <  epsilon  → explore: each component ~ U{min..=max}
//! p >= epsilon  → exploit: argmax avg_reward (first inserted on ties)
//!                 empty table → random action (fallback)
//! capacity < 3  → (capacity, 0, 0), whatever the branch
//! ```
//!
//! # Update
//!
//! The reward of a step is `survived_units / sent_units` over all three
//! channels, with 0 when nothing was sent.

use super::table::ActionTable;
use crate::logging::{event_names, Stage};
use mx_common::{Action, ChannelOutcome, Error, Result, CHANNEL_COUNT};
use mx_math::ratio_or_zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, trace};

/// Below this capacity the whole remainder goes to a single channel.
pub const MIN_SPLIT_CAPACITY: u32 = CHANNEL_COUNT as u32;

/// Tunable parameters of the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyParams {
    /// Probability of exploring on a given step, in (0,1].
    pub epsilon: f64,
    /// Smallest per-channel count drawn when exploring.
    pub explore_min: u32,
    /// Largest per-channel count drawn when exploring.
    pub explore_max: u32,
}

impl Default for PolicyParams {
    fn default() -> Self {
        PolicyParams {
            epsilon: 0.4,
            explore_min: 1,
            explore_max: 3,
        }
    }
}

impl PolicyParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(Error::Config(format!(
                "epsilon must be in (0, 1], got {}",
                self.epsilon
            )));
        }
        if self.explore_min == 0 {
            return Err(Error::Config(
                "explore_min must be at least 1 so every channel is sampled".to_string(),
            ));
        }
        if self.explore_min > self.explore_max {
            return Err(Error::Config(format!(
                "explore range is empty: {}..={}",
                self.explore_min, self.explore_max
            )));
        }
        Ok(())
    }
}

/// Which branch produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    Explore,
    Exploit,
    /// Exploit was rolled but the table had no candidate.
    Fallback,
}

impl std::fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionMode::Explore => write!(f, "explore"),
            DecisionMode::Exploit => write!(f, "exploit"),
            DecisionMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// Outcome of one `choose` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub mode: DecisionMode,
    /// Whether the capacity clamp replaced the branch's action.
    pub clamped: bool,
    /// The uniform draw compared against epsilon.
    pub roll: f64,
}

/// Epsilon-greedy policy owning its action table and randomness.
#[derive(Debug)]
pub struct PolicyEngine<R = StdRng> {
    params: PolicyParams,
    table: ActionTable,
    rng: R,
}

impl PolicyEngine<StdRng> {
    /// Engine with an OS-seeded RNG, or a deterministic one when `seed` is set.
    pub fn from_seed(params: PolicyParams, table: ActionTable, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(params, table, rng)
    }
}

impl<R: Rng> PolicyEngine<R> {
    pub fn new(params: PolicyParams, table: ActionTable, rng: R) -> Result<Self> {
        params.validate()?;
        Ok(PolicyEngine { params, table, rng })
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    /// Select the next action for a pool holding `remaining_capacity` units.
    pub fn choose(&mut self, remaining_capacity: u32) -> Decision {
        let roll: f64 = self.rng.random();
        self.choose_with_roll(roll, remaining_capacity)
    }

    /// Same as [`choose`](Self::choose) with a caller-supplied roll.
    pub fn choose_with_roll(&mut self, roll: f64, remaining_capacity: u32) -> Decision {
        let (action, mode) = if roll < self.params.epsilon {
            (self.random_action(), DecisionMode::Explore)
        } else {
            match self.table.best() {
                Some((action, _)) => (action, DecisionMode::Exploit),
                None => (self.random_action(), DecisionMode::Fallback),
            }
        };

        let decision = if remaining_capacity < MIN_SPLIT_CAPACITY {
            Decision {
                action: Action::single_channel(remaining_capacity),
                mode,
                clamped: true,
                roll,
            }
        } else {
            Decision {
                action,
                mode,
                clamped: false,
                roll,
            }
        };

        trace!(
            roll,
            epsilon = self.params.epsilon,
            mode = %decision.mode,
            action = %decision.action,
            clamped = decision.clamped,
            "policy decision"
        );
        decision
    }

    /// Fold the observed per-channel outcomes of `action` into the table.
    ///
    /// Returns the reward recorded for the step.
    pub fn update(&mut self, action: Action, outcomes: &[ChannelOutcome; CHANNEL_COUNT]) -> f64 {
        let reward = step_reward(outcomes);
        self.table.upsert(action, reward);
        debug!(
            event = event_names::POLICY_UPDATED,
            stage = %Stage::Observe,
            action = %action,
            reward,
            avg_reward = self.table.get(&action).map(|s| s.avg_reward()).unwrap_or(reward),
            table_size = self.table.len(),
            "policy updated"
        );
        reward
    }

    fn random_action(&mut self) -> Action {
        let range = self.params.explore_min..=self.params.explore_max;
        Action::new(
            self.rng.random_range(range.clone()),
            self.rng.random_range(range.clone()),
            self.rng.random_range(range),
        )
    }
}

/// Fraction of sent units that survived across all channels; 0 if none were sent.
pub fn step_reward(outcomes: &[ChannelOutcome; CHANNEL_COUNT]) -> f64 {
    let sent: u64 = outcomes.iter().map(|o| u64::from(o.sent)).sum();
    let survived: u64 = outcomes.iter().map(|o| u64::from(o.survived_units())).sum();
    ratio_or_zero(survived, sent)
}
