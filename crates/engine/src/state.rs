//! Customer-state discretization for policy lookup.

use churn_core::types::{CustomerContext, StateFeatures};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data-usage threshold (GB) separating the High and Low usage buckets.
const HIGH_USAGE_GB: f64 = 50.0;
/// Tenure threshold (months) separating New and Loyal customers.
const LOYAL_TENURE_MONTHS: u32 = 12;

/// Discretized policy-table key: `{usage}_{tenure}_{contract_type}`.
///
/// The same customer features always produce the same key, so outcome
/// feedback and later decisions land on the same policy entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map state features onto their discrete policy key.
pub fn encode(features: &StateFeatures) -> StateKey {
    let usage = if features.data_usage_gb > HIGH_USAGE_GB {
        "High"
    } else {
        "Low"
    };
    let tenure = if features.tenure_months < LOYAL_TENURE_MONTHS {
        "New"
    } else {
        "Loyal"
    };
    StateKey(format!("{}_{}_{}", usage, tenure, features.contract_type))
}

/// Convenience wrapper over [`encode`] for a full customer context.
pub fn encode_context(context: &CustomerContext) -> StateKey {
    encode(&context.state_features())
}
