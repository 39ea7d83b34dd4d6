//! REST API handlers for decision requests, outcome feedback, and the
//! retention dashboard.

use crate::history::OutcomeHistory;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use churn_core::types::{Action, CustomerContext, Decision, FeedbackEvent};
use churn_engine::InterventionEngine;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum string field length (customer ID, contract type, etc.).
const MAX_FIELD_LEN: usize = 256;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InterventionEngine>,
    pub history: Arc<OutcomeHistory>,
    pub node_id: String,
    pub start_time: Instant,
}

/// Validate a customer context at the API boundary.
fn validate_context(context: &CustomerContext) -> Result<(), &'static str> {
    if context.customer_id.is_empty() {
        return Err("'customer_id' must not be empty");
    }
    if context.customer_id.len() > MAX_FIELD_LEN {
        return Err("'customer_id' exceeds maximum length");
    }
    if context.contract_type.is_empty() {
        return Err("'contract_type' must not be empty");
    }
    if context.contract_type.len() > MAX_FIELD_LEN {
        return Err("'contract_type' exceeds maximum length");
    }
    if context.payment_method.len() > MAX_FIELD_LEN {
        return Err("'payment_method' exceeds maximum length");
    }
    if !context.monthly_charges.is_finite() || context.monthly_charges < 0.0 {
        return Err("'monthly_charges' must be non-negative");
    }
    if !context.total_charges.is_finite() || context.total_charges < 0.0 {
        return Err("'total_charges' must be non-negative");
    }
    if !context.data_usage_gb.is_finite() || context.data_usage_gb < 0.0 {
        return Err("'data_usage_gb' must be non-negative");
    }
    Ok(())
}

/// Validate a feedback event at the API boundary. Unknown action names stay
/// acceptable; only the reward number must be sane, since it flows into the
/// learned vectors.
fn validate_feedback(event: &FeedbackEvent) -> Result<(), &'static str> {
    if !event.reward.is_finite() {
        return Err("'reward' must be a finite number");
    }
    Ok(())
}

/// POST /v1/decide — recommend and reserve a retention intervention.
pub async fn handle_decide(
    State(state): State<AppState>,
    Json(context): Json<CustomerContext>,
) -> Result<Json<Decision>, (StatusCode, Json<ErrorResponse>)> {
    // Validate input at API boundary
    if let Err(msg) = validate_context(&context) {
        warn!(customer_id = %context.customer_id, error = msg, "Decision request validation failed");
        metrics::counter!("api.validation_errors").increment(1);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_customer_context".to_string(),
                message: msg.to_string(),
            }),
        ));
    }

    let decision = state.engine.decide(&context);

    metrics::counter!(
        "decisions.issued",
        "strategy" => decision.strategy_used.as_str(),
        "status" => decision.feasibility_status.as_str()
    )
    .increment(1);
    metrics::gauge!("budget.remaining").set(state.engine.budget_snapshot());

    Ok(Json(decision))
}

/// POST /v1/feedback — record an observed outcome.
///
/// Accepts any action name, known or not; the policy update runs after the
/// response is sent. Only a non-finite reward is rejected.
pub async fn handle_feedback(
    State(state): State<AppState>,
    Json(event): Json<FeedbackEvent>,
) -> Result<(StatusCode, Json<FeedbackResponse>), (StatusCode, Json<ErrorResponse>)> {
    if let Err(msg) = validate_feedback(&event) {
        warn!(customer_id = %event.customer_id, error = msg, "Feedback validation failed");
        metrics::counter!("api.validation_errors").increment(1);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_feedback_event".to_string(),
                message: msg.to_string(),
            }),
        ));
    }

    debug!(
        customer_id = %event.customer_id,
        action = %event.action_taken,
        reward = event.reward,
        "Feedback received"
    );
    if Action::from_name(&event.action_taken).is_none() {
        metrics::counter!("feedback.unknown_action").increment(1);
    }
    metrics::counter!("feedback.received").increment(1);

    let point = state.history.record(event.reward);
    metrics::gauge!("feedback.churn_rate").set(point.churn_rate);

    let engine = state.engine.clone();
    tokio::spawn(async move {
        engine.learn(&event.state, &event.action_taken, event.reward);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(FeedbackResponse {
            status: "accepted".to_string(),
            time: point.time,
        }),
    ))
}

/// GET /v1/dashboard — remaining budget and recent outcome history.
pub async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        remaining_budget: state.engine.budget_snapshot(),
        history: state.history.recent(OutcomeHistory::DASHBOARD_WINDOW),
    })
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
/// Returns 200 only when the service is ready to accept traffic.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub status: String,
    /// Sequence number assigned to the recorded outcome.
    pub time: u64,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub remaining_budget: f64,
    pub history: Vec<crate::history::OutcomePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::types::StateFeatures;

    fn make_context() -> CustomerContext {
        CustomerContext {
            customer_id: "c-1001".to_string(),
            tenure_months: 8,
            monthly_charges: 70.5,
            total_charges: 564.0,
            num_support_tickets: 3,
            data_usage_gb: 61.2,
            payment_method: "Electronic check".to_string(),
            contract_type: "Month-to-month".to_string(),
        }
    }

    #[test]
    fn test_valid_context_passes() {
        assert!(validate_context(&make_context()).is_ok());
    }

    #[test]
    fn test_empty_customer_id_is_rejected() {
        let mut context = make_context();
        context.customer_id = String::new();
        assert!(validate_context(&context).is_err());
    }

    #[test]
    fn test_oversized_fields_are_rejected() {
        let mut context = make_context();
        context.contract_type = "x".repeat(MAX_FIELD_LEN + 1);
        assert!(validate_context(&context).is_err());
    }

    #[test]
    fn test_negative_and_non_finite_charges_are_rejected() {
        let mut context = make_context();
        context.monthly_charges = -1.0;
        assert!(validate_context(&context).is_err());

        let mut context = make_context();
        context.data_usage_gb = f64::NAN;
        assert!(validate_context(&context).is_err());
    }

    fn make_feedback(reward: f64) -> FeedbackEvent {
        FeedbackEvent {
            customer_id: "c-1001".to_string(),
            action_taken: "DISCOUNT_10".to_string(),
            reward,
            state: StateFeatures::default(),
        }
    }

    #[test]
    fn test_finite_rewards_pass_either_sign() {
        assert!(validate_feedback(&make_feedback(1.0)).is_ok());
        assert!(validate_feedback(&make_feedback(-1.0)).is_ok());
        assert!(validate_feedback(&make_feedback(0.0)).is_ok());
    }

    #[test]
    fn test_non_finite_reward_is_rejected() {
        assert!(validate_feedback(&make_feedback(f64::INFINITY)).is_err());
        assert!(validate_feedback(&make_feedback(f64::NEG_INFINITY)).is_err());
        assert!(validate_feedback(&make_feedback(f64::NAN)).is_err());
    }
}
