//! Fuzz target driving the policy engine with arbitrary step sequences.
//!
//! Checks that decisions respect the capacity clamp and that rewards and
//! estimates stay within [0, 1].

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mx_common::{Action, Channel, ChannelOutcome};
use mx_core::policy::{ActionTable, PolicyEngine, PolicyParams};

#[derive(Debug, Arbitrary)]
struct Step {
    capacity: u16,
    survived: [bool; 3],
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    epsilon_permille: u16,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let params = PolicyParams {
        epsilon: f64::from(input.epsilon_permille % 1000 + 1) / 1000.0,
        ..PolicyParams::default()
    };
    let table = ActionTable::seeded(Action::new(2, 2, 2), 0.1);
    let Ok(mut engine) = PolicyEngine::from_seed(params, table, Some(input.seed)) else {
        return;
    };

    for step in input.steps.iter().take(256) {
        let capacity = u32::from(step.capacity);
        let decision = engine.choose(capacity);
        if capacity < 3 {
            assert_eq!(decision.action, Action::single_channel(capacity));
        }

        let mut outcomes = Channel::ALL.map(ChannelOutcome::idle);
        for (channel, count) in decision.action.dispatches() {
            let slot = &mut outcomes[channel.index()];
            slot.sent = count;
            slot.survived = step.survived[channel.index()];
        }
        let reward = engine.update(decision.action, &outcomes);
        assert!((0.0..=1.0).contains(&reward));
    }

    for (_, stats) in engine.table().iter() {
        let avg = stats.avg_reward();
        assert!(avg.is_finite() && (-1e-9..=1.0 + 1e-9).contains(&avg));
    }
});
