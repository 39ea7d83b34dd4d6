//! Budget-gated feasibility check for proposed interventions.
//!
//! A proposed action is executed at full allocation or skipped entirely.
//! With a non-negative risk objective that choice reduces to a constraint
//! check: execute exactly when every registered constraint allows the spend.

use churn_core::types::Action;
use tracing::debug;

/// Cost in budget units for a wire-format action name. Unknown names price
/// at zero, matching the policy layer's tolerance for them. All proposal
/// pricing goes through this table.
pub fn action_cost(name: &str) -> f64 {
    Action::from_name(name).map(Action::cost).unwrap_or(0.0)
}

/// One proposed spend, as seen by the constraint set.
#[derive(Debug, Clone, Copy)]
pub struct SpendProposal {
    pub action: Action,
    pub cost: f64,
    pub risk_score: f64,
    pub budget_remaining: f64,
}

/// A single veto rule over a proposed spend.
pub trait SpendConstraint: Send + Sync {
    fn name(&self) -> &'static str;
    fn allows(&self, proposal: &SpendProposal) -> bool;
}

/// Allows a spend only while its full cost fits the remaining budget.
pub struct BudgetConstraint;

impl SpendConstraint for BudgetConstraint {
    fn name(&self) -> &'static str {
        "budget"
    }

    fn allows(&self, proposal: &SpendProposal) -> bool {
        proposal.cost <= proposal.budget_remaining
    }
}

/// Outcome of a feasibility evaluation.
#[derive(Debug, Clone, Copy)]
pub struct FeasibilityOutcome {
    pub feasible: bool,
    /// Full cost of the proposed action, whether or not it was feasible.
    pub cost: f64,
}

/// Evaluates proposals against an extensible constraint set.
pub struct FeasibilityModel {
    constraints: Vec<Box<dyn SpendConstraint>>,
}

impl FeasibilityModel {
    /// Model with the budget constraint only.
    pub fn new() -> Self {
        Self {
            constraints: vec![Box::new(BudgetConstraint)],
        }
    }

    /// Add a further constraint; all registered constraints must allow a
    /// spend for it to be feasible.
    pub fn with_constraint(mut self, constraint: Box<dyn SpendConstraint>) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn evaluate(
        &self,
        action: Action,
        risk_score: f64,
        budget_remaining: f64,
    ) -> FeasibilityOutcome {
        let proposal = SpendProposal {
            action,
            cost: action_cost(action.name()),
            risk_score,
            budget_remaining,
        };
        let refusing = self.constraints.iter().find(|c| !c.allows(&proposal));
        if let Some(constraint) = refusing {
            debug!(
                constraint = constraint.name(),
                action = action.name(),
                cost = proposal.cost,
                budget_remaining,
                "Constraint refused proposal"
            );
        }
        FeasibilityOutcome {
            feasible: refusing.is_none(),
            cost: proposal.cost,
        }
    }
}

impl Default for FeasibilityModel {
    fn default() -> Self {
        Self::new()
    }
}
