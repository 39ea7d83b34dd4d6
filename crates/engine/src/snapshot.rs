//! Serializable engine state: the full policy table plus the remaining
//! budget. Restoring a snapshot reproduces the engine's decision behavior
//! for identical subsequent inputs.

use crate::policy::PolicyVectors;
use crate::state::StateKey;
use churn_core::error::{ChurnError, ChurnResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub policy_table: HashMap<StateKey, PolicyVectors>,
    pub remaining_budget: f64,
}

impl EngineSnapshot {
    /// Reject snapshots that could corrupt a running engine.
    pub fn validate(&self) -> ChurnResult<()> {
        if !self.remaining_budget.is_finite() || self.remaining_budget < 0.0 {
            return Err(ChurnError::Snapshot(format!(
                "invalid remaining budget: {}",
                self.remaining_budget
            )));
        }
        for (state, vectors) in &self.policy_table {
            let all_finite = vectors
                .reward
                .iter()
                .chain(vectors.regret.iter())
                .all(|v| v.is_finite());
            if !all_finite {
                return Err(ChurnError::Snapshot(format!(
                    "non-finite policy entry for state {}",
                    state
                )));
            }
        }
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> ChurnResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: EngineSnapshot = serde_json::from_str(&raw)?;
        Ok(snapshot)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> ChurnResult<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}
