//! Fuzz target for config.json parsing.
//!
//! Parsing and validation must reject bad input with an error. Anything that
//! validates must also build a usable policy engine.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mx_core::config::AgentConfig;
use mx_core::policy::{ActionTable, PolicyEngine};

fuzz_target!(|data: &[u8]| {
    let Ok(agent) = serde_json::from_slice::<AgentConfig>(data) else {
        return;
    };
    if agent.validate().is_err() {
        return;
    }
    let table = ActionTable::seeded(agent.bootstrap_action, agent.bootstrap_reward);
    assert!(PolicyEngine::from_seed(agent.policy_params(), table, Some(0)).is_ok());
});
