//! Emotional distress detection.
//!
//! Fires when most recent check-ins report a negative emotion.

use tracing::debug;

use crate::detectors::{DetectionWindow, RiskDetector};
use crate::types::{RiskCategory, RiskFactor, Severity, Trend};

const FACTOR_ID: &str = "emotional-distress";
/// Share of negative check-ins above which the detector fires
const DISTRESS_RATIO: f64 = 0.7;
/// Share above which the factor is critical
const CRITICAL_RATIO: f64 = 0.9;
const CONFIDENCE: f64 = 0.85;

const RECOMMENDATIONS: &[&str] = &[
    "Try a guided breathing or grounding exercise",
    "Write about what is weighing on you in your diary",
    "Reach out to someone you trust or to your therapist",
];

/// Detector for sustained negative emotions.
pub struct EmotionalDistressDetector;

impl EmotionalDistressDetector {
    /// Create a new emotional distress detector.
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmotionalDistressDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskDetector for EmotionalDistressDetector {
    fn id(&self) -> &'static str {
        FACTOR_ID
    }

    fn detect(&self, window: &DetectionWindow<'_>) -> Option<RiskFactor> {
        if window.checkins.is_empty() {
            return None;
        }

        // Unclassified emotions stay in the denominator.
        let negative = window
            .checkins
            .iter()
            .filter(|c| c.emotion.is_negative())
            .count();
        let ratio = negative as f64 / window.checkins.len() as f64;

        if ratio <= DISTRESS_RATIO {
            return None;
        }

        let severity = if ratio > CRITICAL_RATIO {
            Severity::Critical
        } else {
            Severity::High
        };

        debug!(
            negative = negative,
            total = window.checkins.len(),
            ratio = ratio,
            severity = severity.as_str(),
            "Emotional distress pattern matched"
        );

        Some(
            RiskFactor::new(FACTOR_ID, RiskCategory::Emotional, severity, CONFIDENCE, window.now)
                .with_description(format!(
                    "{:.0}% of recent check-ins report difficult emotions ({} of {})",
                    ratio * 100.0,
                    negative,
                    window.checkins.len()
                ))
                .with_trend(Trend::Worsening)
                .with_recommendations(RECOMMENDATIONS),
        )
    }
}
