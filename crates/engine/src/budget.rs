//! Shared intervention budget with atomic reservation.

use parking_lot::Mutex;
use tracing::debug;

/// Tracks the remaining campaign budget across all concurrent decisions.
///
/// Checking affordability and deducting the cost happen inside one critical
/// section, so two requests can never both spend the last budget units and
/// the balance can never go negative.
pub struct BudgetLedger {
    remaining: Mutex<f64>,
}

impl BudgetLedger {
    /// Open a ledger with the given starting balance. Negative starting
    /// values are clamped to zero.
    pub fn new(initial: f64) -> Self {
        Self {
            remaining: Mutex::new(initial.max(0.0)),
        }
    }

    /// Atomically reserve `cost` from the remaining budget.
    ///
    /// Returns `true` and deducts the cost when the balance covers it;
    /// returns `false` and leaves the balance untouched otherwise.
    /// A zero cost always succeeds.
    pub fn reserve(&self, cost: f64) -> bool {
        let mut remaining = self.remaining.lock();
        if cost <= *remaining {
            *remaining -= cost;
            true
        } else {
            debug!(cost, remaining = *remaining, "Budget reservation refused");
            false
        }
    }

    /// Current balance. Advisory only: another request may spend between
    /// this read and a later `reserve`.
    pub fn peek(&self) -> f64 {
        *self.remaining.lock()
    }

    /// Replace the balance, clamping negative amounts to zero.
    pub fn reset(&self, amount: f64) {
        *self.remaining.lock() = amount.max(0.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
