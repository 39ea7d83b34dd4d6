//! Per-state learned policy — reward and regret vectors over the fixed
//! action set, epsilon-greedy and minimax-regret selection, and the online
//! smoothing update applied on feedback.

use crate::state::StateKey;
use churn_core::types::{Action, Strategy};
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Risk reported when the exploration branch fires and no estimate applies.
const EXPLORATION_RISK: f64 = 0.5;
/// Fixed risk reported by the defensive minimax-regret strategy.
const MINIMAX_RISK: f64 = 0.8;

/// Reward and regret estimates for one state, one slot per action.
///
/// A freshly observed state starts at all zeros, which makes the greedy
/// branch deterministic from the first request onward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyVectors {
    pub reward: [f64; Action::COUNT],
    pub regret: [f64; Action::COUNT],
}

/// Concurrent policy table keyed by discretized customer state.
///
/// Entries are created lazily on first touch; updates for the same state are
/// serialized through the map's entry lock so no feedback is lost.
pub struct PolicyStore {
    entries: DashMap<StateKey, PolicyVectors>,
    learning_rate: f64,
}

impl PolicyStore {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            entries: DashMap::new(),
            learning_rate,
        }
    }

    /// Current vectors for a state, creating the zeroed entry on first touch.
    pub fn get_or_create(&self, state: &StateKey) -> PolicyVectors {
        *self.entries.entry(state.clone()).or_default()
    }

    /// Current vectors for a state, without creating an entry.
    pub fn get(&self, state: &StateKey) -> Option<PolicyVectors> {
        self.entries.get(state).map(|entry| *entry.value())
    }

    /// Apply one observed outcome to the state's vectors.
    ///
    /// `reward` moves the chosen action's reward estimate by an exponential
    /// moving average; the regret estimate tracks how often the action lost
    /// (negative reward). Unknown action names are ignored.
    pub fn record_outcome(&self, state: &StateKey, action_name: &str, reward: f64) {
        let action = match Action::from_name(action_name) {
            Some(a) => a,
            None => {
                debug!(action = action_name, "Ignoring feedback for unknown action");
                return;
            }
        };

        let idx = action.index();
        let alpha = self.learning_rate;
        let mut entry = self.entries.entry(state.clone()).or_default();
        entry.reward[idx] += alpha * (reward - entry.reward[idx]);
        let loss = if reward < 0.0 { 1.0 } else { 0.0 };
        entry.regret[idx] += alpha * (loss - entry.regret[idx]);
    }

    /// Number of states observed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the full table, for snapshots.
    pub(crate) fn export(&self) -> HashMap<StateKey, PolicyVectors> {
        let mut table = HashMap::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            table.insert(entry.key().clone(), *entry.value());
        }
        table
    }

    /// Replace the full table, for snapshot restore.
    pub(crate) fn replace_all(&self, table: HashMap<StateKey, PolicyVectors>) {
        self.entries.clear();
        for (state, vectors) in table {
            self.entries.insert(state, vectors);
        }
    }
}

/// Choose an action and a churn-risk estimate for one request.
///
/// The standard strategy is epsilon-greedy over the reward vector; its risk
/// is the raw complement of the chosen action's reward estimate, which only
/// stays inside [0, 1] while the reward estimates do. The game-theory
/// strategy picks the minimum-regret action and reports a fixed conservative
/// risk. Ties break toward the lowest action index in both strategies.
pub fn select_action(
    vectors: &PolicyVectors,
    strategy: Strategy,
    epsilon: f64,
    rng: &mut impl Rng,
) -> (Action, f64) {
    match strategy {
        Strategy::Standard => {
            if rng.gen::<f64>() < epsilon {
                let idx = rng.gen_range(0..Action::COUNT);
                return (Action::ALL[idx], EXPLORATION_RISK);
            }
            let idx = argmax(&vectors.reward);
            (Action::ALL[idx], 1.0 - vectors.reward[idx])
        }
        Strategy::GameTheory => {
            let idx = argmin(&vectors.regret);
            (Action::ALL[idx], MINIMAX_RISK)
        }
    }
}

fn argmax(values: &[f64; Action::COUNT]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn argmin(values: &[f64; Action::COUNT]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v < values[best] {
            best = i;
        }
    }
    best
}
