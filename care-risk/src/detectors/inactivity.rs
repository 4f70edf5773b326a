//! Inactivity detection.
//!
//! Measures the time since the last check-in or diary entry. A user with no
//! recorded activity at all produces no factor: there is nothing to be
//! inactive relative to.

use tracing::debug;

use crate::detectors::{DetectionWindow, RiskDetector};
use crate::types::{RiskCategory, RiskFactor, Severity, Trend};

const FACTOR_ID: &str = "inactivity";
const MIN_DAYS: f64 = 2.0;
const HIGH_DAYS: f64 = 5.0;
const CONFIDENCE: f64 = 0.95;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

const RECOMMENDATIONS: &[&str] = &[
    "Do a short check-in about how you feel today",
    "Set a gentle daily reminder to check in",
    "If things feel heavy, let someone on your support team know",
];

/// Detector for gaps in engagement.
pub struct InactivityDetector;

impl InactivityDetector {
    /// Create a new inactivity detector.
    pub fn new() -> Self {
        Self
    }
}

impl Default for InactivityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskDetector for InactivityDetector {
    fn id(&self) -> &'static str {
        FACTOR_ID
    }

    fn detect(&self, window: &DetectionWindow<'_>) -> Option<RiskFactor> {
        let last_activity = window.last_activity?;
        let days_since = (window.now - last_activity).num_milliseconds() as f64 / MILLIS_PER_DAY;

        if days_since <= MIN_DAYS {
            return None;
        }

        let severity = if days_since > HIGH_DAYS {
            Severity::High
        } else {
            Severity::Medium
        };

        debug!(
            days_since = days_since,
            severity = severity.as_str(),
            "Inactivity pattern matched"
        );

        Some(
            RiskFactor::new(FACTOR_ID, RiskCategory::Temporal, severity, CONFIDENCE, window.now)
                .with_description(format!(
                    "No check-ins or diary entries for {} days",
                    days_since.floor() as i64
                ))
                .with_trend(Trend::Worsening)
                .with_recommendations(RECOMMENDATIONS),
        )
    }
}
