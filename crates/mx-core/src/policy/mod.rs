//! Policy core: reward estimation, the action table, and epsilon-greedy selection.
//!
//! ```text
//! ActionStats  ← running mean of one action's rewards
//!     ↑
//! ActionTable  ← Action → ActionStats, insertion ordered
//!     ↑
//! PolicyEngine ← choose(capacity) / update(action, outcomes)
//! ```

pub mod engine;
pub mod estimator;
pub mod table;

pub use engine::{step_reward, Decision, DecisionMode, PolicyEngine, PolicyParams, MIN_SPLIT_CAPACITY};
pub use estimator::ActionStats;
pub use table::{ActionSummary, ActionTable};
