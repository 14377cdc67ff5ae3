//! Property-based tests for the policy core invariants.

use mx_common::{Action, Channel, ChannelOutcome};
use mx_core::policy::{step_reward, ActionTable, DecisionMode, PolicyEngine, PolicyParams};
use proptest::prelude::*;

fn action_strategy() -> impl Strategy<Value = Action> {
    (0u32..5, 0u32..5, 0u32..5).prop_map(|(a, b, c)| Action::new(a, b, c))
}

fn outcomes_strategy() -> impl Strategy<Value = [ChannelOutcome; 3]> {
    prop::array::uniform3((0u32..50, any::<bool>())).prop_map(|pairs| {
        let mut out = Channel::ALL.map(ChannelOutcome::idle);
        for (slot, (sent, survived)) in out.iter_mut().zip(pairs) {
            slot.sent = sent;
            slot.survived = survived;
        }
        out
    })
}

fn engine(seed: u64, table: ActionTable) -> PolicyEngine {
    PolicyEngine::from_seed(PolicyParams::default(), table, Some(seed)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    /// After any sequence of updates, every entry's average is the mean of its history.
    #[test]
    fn avg_reward_is_mean_of_history(
        updates in prop::collection::vec((action_strategy(), 0.0f64..=1.0), 1..60)
    ) {
        let mut table = ActionTable::new();
        for (action, reward) in &updates {
            table.upsert(*action, *reward);
        }
        for (_, stats) in table.iter() {
            let history = stats.history();
            prop_assert!(!history.is_empty());
            let mean = history.iter().sum::<f64>() / history.len() as f64;
            prop_assert!((stats.avg_reward() - mean).abs() < 1e-9);
        }
        let total: usize = table.iter().map(|(_, s)| s.pulls()).sum();
        prop_assert_eq!(total, updates.len());
    }

    /// Low capacity always sends the whole remainder through the first channel.
    #[test]
    fn low_capacity_clamps(seed in any::<u64>(), capacity in 0u32..3) {
        let mut engine = engine(seed, ActionTable::seeded(Action::new(2, 2, 2), 0.1));
        let decision = engine.choose(capacity);
        prop_assert_eq!(decision.action, Action::new(capacity, 0, 0));
        prop_assert!(decision.clamped);
    }

    /// Unclamped decisions never contain a zero component with the default range.
    #[test]
    fn unclamped_actions_use_every_channel(seed in any::<u64>(), capacity in 3u32..10_000) {
        let mut engine = engine(seed, ActionTable::seeded(Action::new(2, 2, 2), 0.1));
        for _ in 0..20 {
            let decision = engine.choose(capacity);
            prop_assert!(!decision.clamped);
            for c in decision.action.components() {
                prop_assert!((1..=3).contains(&c));
            }
        }
    }

    /// Exploit returns the entry with the strictly greatest average.
    #[test]
    fn exploit_picks_argmax(rewards in prop::collection::vec(0.0f64..=1.0, 1..20)) {
        let mut table = ActionTable::new();
        for (i, reward) in rewards.iter().enumerate() {
            table.upsert(Action::new(i as u32 + 1, 1, 1), *reward);
        }
        let mut best = 0;
        for (i, reward) in rewards.iter().enumerate() {
            if *reward > rewards[best] {
                best = i;
            }
        }
        let mut engine = engine(1, table);
        let decision = engine.choose_with_roll(0.999, 100);
        prop_assert_eq!(decision.mode, DecisionMode::Exploit);
        prop_assert_eq!(decision.action, Action::new(best as u32 + 1, 1, 1));
    }

    /// Step rewards are finite and within [0, 1].
    #[test]
    fn step_reward_is_a_fraction(outcomes in outcomes_strategy()) {
        let reward = step_reward(&outcomes);
        prop_assert!(reward.is_finite());
        prop_assert!((0.0..=1.0).contains(&reward));
    }

    /// Repeated identical rewards converge the estimate to that reward.
    #[test]
    fn constant_reward_converges(reward in 0.0f64..=1.0, prior in 0.0f64..=1.0, n in 1usize..200) {
        let action = Action::new(1, 2, 3);
        let mut table = ActionTable::seeded(action, prior);
        for _ in 0..n {
            table.upsert(action, reward);
        }
        let stats = table.get(&action).unwrap();
        let expected = (prior + reward * n as f64) / (n as f64 + 1.0);
        prop_assert!((stats.avg_reward() - expected).abs() < 1e-9);
    }
}

#[test]
fn bootstrap_entry_is_exploited() {
    let mut engine = engine(3, ActionTable::seeded(Action::new(2, 2, 2), 0.1));
    let decision = engine.choose_with_roll(0.4, 1000);
    assert_eq!(decision.mode, DecisionMode::Exploit);
    assert_eq!(decision.action, Action::new(2, 2, 2));
}

#[test]
fn partial_survival_scores_fraction_of_units() {
    let mut engine = engine(3, ActionTable::new());
    let mut outcomes = Channel::ALL.map(ChannelOutcome::idle);
    outcomes[0].sent = 1;
    outcomes[0].survived = true;
    outcomes[1].sent = 2;
    outcomes[1].survived = false;
    let reward = engine.update(Action::new(1, 2, 0), &outcomes);
    assert!((reward - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn all_zero_action_scores_zero() {
    let outcomes = Channel::ALL.map(ChannelOutcome::idle);
    assert_eq!(step_reward(&outcomes), 0.0);
}
