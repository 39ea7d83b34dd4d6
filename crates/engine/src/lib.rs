//! Online decision engine for churn retention.
//!
//! Learns a per-state policy from streamed outcome feedback (reward and
//! regret vectors over a fixed action set), selects interventions with
//! epsilon-greedy or minimax-regret strategies, and gates every paid action
//! behind a shared spending budget.

pub mod budget;
pub mod engine;
pub mod feasibility;
pub mod policy;
pub mod snapshot;
pub mod state;

pub use budget::BudgetLedger;
pub use engine::InterventionEngine;
pub use feasibility::{FeasibilityModel, SpendConstraint, SpendProposal};
pub use policy::{PolicyStore, PolicyVectors};
pub use snapshot::EngineSnapshot;
pub use state::StateKey;
