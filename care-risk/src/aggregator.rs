//! Risk aggregation.
//!
//! The score is the confidence-weighted mean severity of all factors,
//! normalized to 0 - 100. It is not a count: one critical factor at full
//! confidence and one low factor at 0.1 score far lower than two critical
//! factors.

use crate::types::RiskFactor;

/// Weight of the most severe level, used for normalization.
const MAX_WEIGHT: f64 = 4.0;

/// Compute the aggregate risk score (0 - 100).
pub fn risk_score(factors: &[RiskFactor]) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }

    let total: f64 = factors
        .iter()
        .map(|f| f.severity.weight() * f.confidence)
        .sum();

    (total / (factors.len() as f64 * MAX_WEIGHT) * 100.0).min(100.0)
}
