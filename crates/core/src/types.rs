use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Customer Context ───────────────────────────────────────────────────

/// Immutable snapshot of one customer, as submitted by callers of the
/// decision API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerContext {
    pub customer_id: String,
    pub tenure_months: u32,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub num_support_tickets: u32,
    pub data_usage_gb: f64,
    /// e.g. "Electronic check", "Credit card".
    pub payment_method: String,
    /// e.g. "Month-to-month", "One year", "Two year".
    pub contract_type: String,
}

impl CustomerContext {
    /// The subset of fields that determines the policy state.
    pub fn state_features(&self) -> StateFeatures {
        StateFeatures {
            tenure_months: self.tenure_months,
            data_usage_gb: self.data_usage_gb,
            contract_type: self.contract_type.clone(),
        }
    }
}

/// State-derivation fields of a customer context. Feedback events carry this
/// partial view so outcomes can be attributed without replaying the full
/// original request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFeatures {
    #[serde(default)]
    pub tenure_months: u32,
    #[serde(default)]
    pub data_usage_gb: f64,
    #[serde(default)]
    pub contract_type: String,
}

// ─── Retention Actions ──────────────────────────────────────────────────

/// The fixed, ordered set of retention actions. Every policy vector is
/// indexed in this declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    #[serde(rename = "NO_ACTION")]
    NoAction,
    #[serde(rename = "DISCOUNT_10")]
    Discount10,
    #[serde(rename = "UPGRADE_PLAN")]
    UpgradePlan,
    #[serde(rename = "PRIORITY_SUPPORT")]
    PrioritySupport,
    #[serde(rename = "LOYALTY_GIFT")]
    LoyaltyGift,
}

impl Action {
    /// Number of actions; the fixed length of every policy vector.
    pub const COUNT: usize = 5;

    /// All actions in vector-index order.
    pub const ALL: [Action; Action::COUNT] = [
        Action::NoAction,
        Action::Discount10,
        Action::UpgradePlan,
        Action::PrioritySupport,
        Action::LoyaltyGift,
    ];

    /// Position of this action in the policy vectors.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name, as carried by API payloads and feedback events.
    pub fn name(self) -> &'static str {
        match self {
            Action::NoAction => "NO_ACTION",
            Action::Discount10 => "DISCOUNT_10",
            Action::UpgradePlan => "UPGRADE_PLAN",
            Action::PrioritySupport => "PRIORITY_SUPPORT",
            Action::LoyaltyGift => "LOYALTY_GIFT",
        }
    }

    /// Resolve a wire name. `None` for anything outside the fixed set.
    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Fixed execution cost in budget units.
    pub fn cost(self) -> f64 {
        match self {
            Action::NoAction => 0.0,
            Action::Discount10 => 15.0,
            Action::UpgradePlan => 5.0,
            Action::PrioritySupport => 25.0,
            Action::LoyaltyGift => 10.0,
        }
    }
}

// ─── Decisions ──────────────────────────────────────────────────────────

/// Which decision strategy served a request, assigned by the traffic split.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Standard,
    GameTheory,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Standard => "standard",
            Strategy::GameTheory => "game_theory",
        }
    }
}

/// Whether the proposed action fit the remaining campaign budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeasibilityStatus {
    Feasible,
    Blocked,
}

impl FeasibilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeasibilityStatus::Feasible => "feasible",
            FeasibilityStatus::Blocked => "blocked",
        }
    }
}

/// Final intervention decision for one customer request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: Uuid,
    pub customer_id: String,
    pub recommended_action: Action,
    /// Churn-risk estimate in [0.0, 1.0] under the serving strategy.
    pub risk_score: f64,
    /// Budget actually reserved for this decision (0.0 when blocked).
    pub budget_allocated: f64,
    pub feasibility_status: FeasibilityStatus,
    pub strategy_used: Strategy,
    pub decided_at: DateTime<Utc>,
}

/// An observed outcome reported back after an intervention was served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub customer_id: String,
    /// Wire name of the action that was taken. Unknown names are accepted
    /// and ignored by the policy.
    pub action_taken: String,
    /// e.g. +1.0 for a retained customer, -1.0 for a churn.
    pub reward: f64,
    /// State fields for attributing the outcome to a policy state.
    #[serde(default)]
    pub state: StateFeatures,
}
