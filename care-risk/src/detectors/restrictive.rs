//! Restrictive eating detection.

use tracing::debug;

use crate::detectors::{DetectionWindow, RiskDetector};
use crate::types::{RiskCategory, RiskFactor, Severity, Trend};

const FACTOR_ID: &str = "restrictive-eating";
const MIN_RESTRICTIVE_DAYS: usize = 3;
const CRITICAL_RESTRICTIVE_DAYS: usize = 5;
const CONFIDENCE: f64 = 0.78;

const RECOMMENDATIONS: &[&str] = &[
    "Plan regular meals and snacks for tomorrow",
    "Share your meal plan with your nutritionist or care team",
    "Notice the thoughts that come up before skipping a meal",
];

/// Detector for repeated days with fewer than two meals.
pub struct RestrictiveEatingDetector;

impl RestrictiveEatingDetector {
    /// Create a new restrictive eating detector.
    pub fn new() -> Self {
        Self
    }
}

impl Default for RestrictiveEatingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskDetector for RestrictiveEatingDetector {
    fn id(&self) -> &'static str {
        FACTOR_ID
    }

    fn detect(&self, window: &DetectionWindow<'_>) -> Option<RiskFactor> {
        let restrictive_days = window
            .food_logs
            .iter()
            .filter(|log| log.is_restrictive())
            .count();

        if restrictive_days <= MIN_RESTRICTIVE_DAYS {
            return None;
        }

        let severity = if restrictive_days > CRITICAL_RESTRICTIVE_DAYS {
            Severity::Critical
        } else {
            Severity::High
        };

        debug!(
            restrictive_days = restrictive_days,
            logged_days = window.food_logs.len(),
            severity = severity.as_str(),
            "Restrictive eating pattern matched"
        );

        Some(
            RiskFactor::new(FACTOR_ID, RiskCategory::Behavioral, severity, CONFIDENCE, window.now)
                .with_description(format!(
                    "{} days this week with fewer than two meals logged",
                    restrictive_days
                ))
                .with_trend(Trend::Worsening)
                .with_recommendations(RECOMMENDATIONS),
        )
    }
}
