//! In-memory feedback history backing the dashboard endpoint.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Cap on retained points; the oldest are dropped past this.
const MAX_POINTS: usize = 1000;

/// One recorded feedback outcome, as served to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomePoint {
    /// Monotonic sequence number, stable across trimming.
    pub time: u64,
    pub reward: f64,
    /// Fraction of negative-reward outcomes over the trailing window,
    /// computed at recording time.
    pub churn_rate: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Default)]
struct HistoryInner {
    points: Vec<OutcomePoint>,
    seq: u64,
}

/// Bounded, thread-safe log of feedback outcomes.
#[derive(Default)]
pub struct OutcomeHistory {
    inner: RwLock<HistoryInner>,
}

impl OutcomeHistory {
    /// Trailing points served to the dashboard and used for the rolling
    /// churn rate.
    pub const DASHBOARD_WINDOW: usize = 20;

    pub fn new() -> Self {
        Self::default()
    }

    /// Append one outcome and return the stored point.
    pub fn record(&self, reward: f64) -> OutcomePoint {
        let mut inner = self.inner.write();

        let prior_negatives = inner
            .points
            .iter()
            .rev()
            .take(Self::DASHBOARD_WINDOW - 1)
            .filter(|p| p.reward < 0.0)
            .count();
        let negatives = prior_negatives + usize::from(reward < 0.0);
        let window = inner.points.len().min(Self::DASHBOARD_WINDOW - 1) + 1;
        let churn_rate = negatives as f64 / window as f64;

        let point = OutcomePoint {
            time: inner.seq,
            reward,
            churn_rate,
            recorded_at: Utc::now(),
        };
        inner.seq += 1;
        inner.points.push(point.clone());

        if inner.points.len() > MAX_POINTS {
            let excess = inner.points.len() - MAX_POINTS;
            inner.points.drain(0..excess);
        }

        point
    }

    /// The most recent `n` points, oldest first.
    pub fn recent(&self, n: usize) -> Vec<OutcomePoint> {
        let inner = self.inner.read();
        let start = inner.points.len().saturating_sub(n);
        inner.points[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.read().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().points.is_empty()
    }
}
