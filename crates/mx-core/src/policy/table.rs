//! Action table: everything the policy has learned during an episode.

use super::estimator::ActionStats;
use mx_common::Action;
use serde::Serialize;
use std::collections::HashMap;

/// Mapping from action to its reward statistics.
///
/// Entries are kept in insertion order; `best()` breaks ties in favour of
/// the entry inserted first. The table only ever grows.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    entries: Vec<(Action, ActionStats)>,
    index: HashMap<Action, usize>,
}

/// Serializable view of one table entry.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSummary {
    pub action: Action,
    pub avg_reward: f64,
    pub pulls: usize,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding a single bootstrap entry, so the exploit branch has a
    /// candidate before any real observation.
    pub fn seeded(action: Action, prior_reward: f64) -> Self {
        let mut table = Self::new();
        table.upsert(action, prior_reward);
        table
    }

    pub fn get(&self, action: &Action) -> Option<&ActionStats> {
        self.index.get(action).map(|&i| &self.entries[i].1)
    }

    /// Record `reward` for `action`, creating the entry on first sight.
    pub fn upsert(&mut self, action: Action, reward: f64) {
        match self.index.get(&action) {
            Some(&i) => self.entries[i].1.observe(reward),
            None => {
                self.index.insert(action, self.entries.len());
                self.entries.push((action, ActionStats::new(reward)));
            }
        }
    }

    /// Action with the strictly highest average reward.
    ///
    /// `None` on an empty table. On ties the earliest-inserted action wins.
    pub fn best(&self) -> Option<(Action, &ActionStats)> {
        let mut best: Option<(Action, &ActionStats)> = None;
        for (action, stats) in &self.entries {
            match best {
                Some((_, current)) if stats.avg_reward() <= current.avg_reward() => {}
                _ => best = Some((*action, stats)),
            }
        }
        best
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Action, &ActionStats)> {
        self.entries.iter().map(|(a, s)| (a, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by average reward, best first.
    pub fn ranked(&self) -> Vec<ActionSummary> {
        let mut out: Vec<ActionSummary> = self
            .entries
            .iter()
            .map(|(action, stats)| ActionSummary {
                action: *action,
                avg_reward: stats.avg_reward(),
                pulls: stats.pulls(),
            })
            .collect();
        // Stable sort keeps insertion order among equal averages.
        out.sort_by(|a, b| b.avg_reward.total_cmp(&a.avg_reward));
        out
    }
}
