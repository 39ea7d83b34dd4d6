//! Decision orchestration: strategy assignment, policy selection,
//! feasibility gating, and budget reservation for one customer request.

use crate::budget::BudgetLedger;
use crate::feasibility::FeasibilityModel;
use crate::policy::{self, PolicyStore, PolicyVectors};
use crate::snapshot::EngineSnapshot;
use crate::state;
use churn_core::config::EngineConfig;
use churn_core::error::ChurnResult;
use churn_core::types::{
    Action, CustomerContext, Decision, FeasibilityStatus, StateFeatures, Strategy,
};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

/// The retention decision engine.
///
/// Thread-safe; one shared instance serves all concurrent API requests.
pub struct InterventionEngine {
    policies: PolicyStore,
    ledger: BudgetLedger,
    feasibility: FeasibilityModel,
    config: EngineConfig,
}

impl InterventionEngine {
    pub fn new(config: EngineConfig) -> Self {
        info!(
            initial_budget = config.initial_budget,
            epsilon = config.epsilon,
            standard_share = config.standard_share,
            "Intervention engine initialized"
        );
        Self {
            policies: PolicyStore::new(config.learning_rate),
            ledger: BudgetLedger::new(config.initial_budget),
            feasibility: FeasibilityModel::new(),
            config,
        }
    }

    /// Decide an intervention for one customer, assigning the strategy by
    /// the configured traffic split.
    pub fn decide(&self, context: &CustomerContext) -> Decision {
        let strategy = self.assign_strategy(&mut rand::thread_rng());
        self.decide_with_strategy(context, strategy)
    }

    /// Decide under a caller-fixed strategy.
    pub fn decide_with_strategy(&self, context: &CustomerContext, strategy: Strategy) -> Decision {
        let state = state::encode_context(context);
        let vectors = self.policies.get_or_create(&state);
        let (proposed, risk_score) = policy::select_action(
            &vectors,
            strategy,
            self.config.epsilon,
            &mut rand::thread_rng(),
        );

        // The peek is advisory; the reservation below is the atomic step, so
        // a concurrent spend between the two can only turn this decision into
        // a block, never into an overdraft.
        let outcome = self
            .feasibility
            .evaluate(proposed, risk_score, self.ledger.peek());
        let reserved = outcome.feasible && self.ledger.reserve(outcome.cost);

        let (recommended_action, budget_allocated, feasibility_status) = if reserved {
            (proposed, outcome.cost, FeasibilityStatus::Feasible)
        } else {
            (Action::NoAction, 0.0, FeasibilityStatus::Blocked)
        };

        let decision = Decision {
            decision_id: Uuid::new_v4(),
            customer_id: context.customer_id.clone(),
            recommended_action,
            risk_score,
            budget_allocated,
            feasibility_status,
            strategy_used: strategy,
            decided_at: Utc::now(),
        };
        debug!(
            decision_id = %decision.decision_id,
            state = %state,
            action = recommended_action.name(),
            strategy = strategy.as_str(),
            risk = risk_score,
            "Decision issued"
        );
        decision
    }

    /// Fold one observed outcome into the policy for the matching state.
    /// Unknown action names leave the policy untouched.
    pub fn learn(&self, features: &StateFeatures, action_name: &str, reward: f64) {
        let state = state::encode(features);
        self.policies.record_outcome(&state, action_name, reward);
    }

    /// Remaining budget at this instant.
    pub fn budget_snapshot(&self) -> f64 {
        self.ledger.peek()
    }

    /// Learned vectors for one state, if any request or feedback has
    /// touched it yet.
    pub fn policy_snapshot(&self, features: &StateFeatures) -> Option<PolicyVectors> {
        self.policies.get(&state::encode(features))
    }

    /// Replace the remaining budget, e.g. at the start of a new campaign
    /// period. Negative amounts clamp to zero.
    pub fn reset_budget(&self, amount: f64) {
        info!(amount, "Budget reset");
        self.ledger.reset(amount);
    }

    /// Capture the current policy table and budget.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            policy_table: self.policies.export(),
            remaining_budget: self.ledger.peek(),
        }
    }

    /// Replace engine state from a snapshot after validating it.
    pub fn restore(&self, snapshot: EngineSnapshot) -> ChurnResult<()> {
        snapshot.validate()?;
        let states = snapshot.policy_table.len();
        self.policies.replace_all(snapshot.policy_table);
        self.ledger.reset(snapshot.remaining_budget);
        info!(
            states,
            remaining_budget = snapshot.remaining_budget,
            "Engine state restored from snapshot"
        );
        Ok(())
    }

    fn assign_strategy(&self, rng: &mut impl Rng) -> Strategy {
        if rng.gen::<f64>() < self.config.standard_share {
            Strategy::Standard
        } else {
            Strategy::GameTheory
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn make_config(initial_budget: f64) -> EngineConfig {
        EngineConfig {
            epsilon: 0.0,
            learning_rate: 0.1,
            standard_share: 1.0,
            initial_budget,
        }
    }

    fn make_context(data_usage_gb: f64) -> CustomerContext {
        CustomerContext {
            customer_id: "c-7".to_string(),
            tenure_months: 5,
            monthly_charges: 80.0,
            total_charges: 400.0,
            num_support_tickets: 2,
            data_usage_gb,
            payment_method: "Electronic check".to_string(),
            contract_type: "Month-to-month".to_string(),
        }
    }

    /// Push one action's reward estimate above the rest for the context's state.
    fn train(engine: &InterventionEngine, context: &CustomerContext, action: Action, times: u32) {
        let features = context.state_features();
        for _ in 0..times {
            engine.learn(&features, action.name(), 1.0);
        }
    }

    #[test]
    fn test_cold_start_decision_is_deterministic() {
        let engine = InterventionEngine::new(make_config(1000.0));
        let context = make_context(60.0);

        let first = engine.decide_with_strategy(&context, Strategy::Standard);
        let second = engine.decide_with_strategy(&context, Strategy::Standard);

        assert_eq!(first.recommended_action, Action::NoAction);
        assert_eq!(second.recommended_action, Action::NoAction);
        assert_eq!(first.feasibility_status, FeasibilityStatus::Feasible);
        assert!((first.risk_score - 1.0).abs() < 1e-12);
        assert_eq!(first.customer_id, "c-7");
    }

    #[test]
    fn test_trained_action_is_served_and_charged() {
        let engine = InterventionEngine::new(make_config(100.0));
        let context = make_context(60.0);
        train(&engine, &context, Action::PrioritySupport, 5);

        let decision = engine.decide_with_strategy(&context, Strategy::Standard);

        assert_eq!(decision.recommended_action, Action::PrioritySupport);
        assert_eq!(decision.feasibility_status, FeasibilityStatus::Feasible);
        assert!((decision.budget_allocated - 25.0).abs() < 1e-12);
        assert!((engine.budget_snapshot() - 75.0).abs() < 1e-12);
        // risk = 1 - reward estimate after five unit rewards
        let expected_risk = 0.9f64.powi(5);
        assert!((decision.risk_score - expected_risk).abs() < 1e-9);
    }

    #[test]
    fn test_unaffordable_action_degrades_to_no_action() {
        let engine = InterventionEngine::new(make_config(10.0));
        let context = make_context(60.0);
        train(&engine, &context, Action::PrioritySupport, 5);

        let decision = engine.decide_with_strategy(&context, Strategy::Standard);

        assert_eq!(decision.recommended_action, Action::NoAction);
        assert_eq!(decision.feasibility_status, FeasibilityStatus::Blocked);
        assert!(decision.budget_allocated.abs() < 1e-12);
        // The blocked fallback must not spend anything.
        assert!((engine.budget_snapshot() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_budget_never_goes_negative_over_many_decisions() {
        let engine = InterventionEngine::new(make_config(30.0));
        let context = make_context(60.0);
        train(&engine, &context, Action::PrioritySupport, 5);

        for _ in 0..10 {
            engine.decide_with_strategy(&context, Strategy::Standard);
            assert!(engine.budget_snapshot() >= 0.0);
        }
        // One 25-unit reservation fits into 30; every later attempt blocks.
        assert!((engine.budget_snapshot() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_game_theory_uses_minimax_regret() {
        let engine = InterventionEngine::new(make_config(1000.0));
        let context = make_context(60.0);
        // A churn after NO_ACTION raises its regret above the untouched rest.
        engine.learn(&context.state_features(), Action::NoAction.name(), -1.0);

        let decision = engine.decide_with_strategy(&context, Strategy::GameTheory);

        assert_eq!(decision.recommended_action, Action::Discount10);
        assert_eq!(decision.strategy_used, Strategy::GameTheory);
        assert!((decision.risk_score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_traffic_split_honors_standard_share() {
        let all_standard = InterventionEngine::new(EngineConfig {
            standard_share: 1.0,
            ..make_config(1000.0)
        });
        let all_game_theory = InterventionEngine::new(EngineConfig {
            standard_share: 0.0,
            ..make_config(1000.0)
        });
        let context = make_context(20.0);

        for _ in 0..20 {
            assert_eq!(all_standard.decide(&context).strategy_used, Strategy::Standard);
            assert_eq!(
                all_game_theory.decide(&context).strategy_used,
                Strategy::GameTheory
            );
        }
    }

    #[test]
    fn test_policy_snapshot_reads_without_creating() {
        let engine = InterventionEngine::new(make_config(1000.0));
        let context = make_context(60.0);
        let features = context.state_features();

        assert!(engine.policy_snapshot(&features).is_none());

        train(&engine, &context, Action::Discount10, 1);
        let vectors = engine.policy_snapshot(&features).unwrap();
        assert!((vectors.reward[Action::Discount10.index()] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_feedback_action_changes_nothing() {
        let engine = InterventionEngine::new(make_config(1000.0));
        let context = make_context(60.0);
        train(&engine, &context, Action::UpgradePlan, 3);
        let before = engine.snapshot();

        engine.learn(&context.state_features(), "SURPRISE_VOUCHER", 10.0);

        let after = engine.snapshot();
        assert_eq!(before.policy_table, after.policy_table);
    }

    #[test]
    fn test_snapshot_restore_reproduces_behavior() {
        let engine = InterventionEngine::new(make_config(500.0));
        let context = make_context(60.0);
        train(&engine, &context, Action::LoyaltyGift, 4);
        engine.decide_with_strategy(&context, Strategy::Standard);
        let snapshot = engine.snapshot();

        let restored = InterventionEngine::new(make_config(500.0));
        restored.restore(snapshot.clone()).unwrap();

        assert!((restored.budget_snapshot() - engine.budget_snapshot()).abs() < 1e-12);
        let a = engine.decide_with_strategy(&context, Strategy::Standard);
        let b = restored.decide_with_strategy(&context, Strategy::Standard);
        assert_eq!(a.recommended_action, b.recommended_action);
        assert!((a.risk_score - b.risk_score).abs() < 1e-12);
    }

    #[test]
    fn test_restore_rejects_corrupt_snapshot() {
        let engine = InterventionEngine::new(make_config(500.0));
        let mut snapshot = engine.snapshot();
        snapshot.remaining_budget = -10.0;

        assert!(engine.restore(snapshot).is_err());
        // The failed restore must leave the live budget alone.
        assert!((engine.budget_snapshot() - 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_budget_reopens_spending() {
        let engine = InterventionEngine::new(make_config(0.0));
        let context = make_context(60.0);
        train(&engine, &context, Action::UpgradePlan, 5);

        let blocked = engine.decide_with_strategy(&context, Strategy::Standard);
        assert_eq!(blocked.feasibility_status, FeasibilityStatus::Blocked);

        engine.reset_budget(50.0);
        let served = engine.decide_with_strategy(&context, Strategy::Standard);
        assert_eq!(served.feasibility_status, FeasibilityStatus::Feasible);
        assert_eq!(served.recommended_action, Action::UpgradePlan);
    }

    #[test]
    fn test_concurrent_decide_and_learn() {
        let engine = Arc::new(InterventionEngine::new(make_config(200.0)));
        let context = make_context(60.0);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = engine.clone();
            let context = context.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    engine.decide_with_strategy(&context, Strategy::Standard);
                }
            }));
        }
        for _ in 0..2 {
            let engine = engine.clone();
            let features = context.state_features();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    engine.learn(&features, "DISCOUNT_10", 1.0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(engine.budget_snapshot() >= 0.0);
    }
}
