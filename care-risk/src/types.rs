//! Core types for risk analysis.
//!
//! With the `typescript` feature enabled, the report types can be exported
//! to TypeScript using ts-rs so the app consumes the same shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use care_records::StoreError;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Area of the user's life a risk factor relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Eating and other behaviors
    Behavioral,
    /// Mood and language
    Emotional,
    /// Bodily signals
    Physical,
    /// Engagement over time
    Temporal,
}

/// Severity of a risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth noting
    Low = 1,
    /// Requires attention
    Medium = 2,
    /// Needs support soon
    High = 3,
    /// Needs support now
    Critical = 4,
}

impl Severity {
    /// Weight used by the aggregator.
    pub fn weight(&self) -> f64 {
        *self as u8 as f64
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Direction a risk is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

/// A risk pattern detected in the recent window.
///
/// Factors are recomputed from scratch on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RiskFactor {
    /// Stable detector-specific identifier
    pub id: String,
    /// Category
    pub category: RiskCategory,
    /// Severity derived from the detector's thresholds
    pub severity: Severity,
    /// Human-readable description
    pub description: String,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Analysis time at which the factor was produced
    pub detected_at: DateTime<Utc>,
    /// Trend
    pub trend: Trend,
    /// Suggested next steps
    pub recommendations: Vec<String>,
}

impl RiskFactor {
    /// Create a factor. Confidence is clamped to `[0, 1]`.
    pub fn new(
        id: impl Into<String>,
        category: RiskCategory,
        severity: Severity,
        confidence: f64,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            description: String::new(),
            confidence: confidence.clamp(0.0, 1.0),
            detected_at,
            trend: Trend::Stable,
            recommendations: vec![],
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the trend.
    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trend = trend;
        self
    }

    /// Set the recommendations.
    pub fn with_recommendations(mut self, recommendations: &[&str]) -> Self {
        self.recommendations = recommendations.iter().map(|r| r.to_string()).collect();
        self
    }
}

/// Tier of a predictive alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Something is starting to slip
    EarlyWarning,
    /// Several serious patterns at once
    InterventionNeeded,
    /// At least one critical pattern
    CrisisRisk,
}

impl AlertKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::EarlyWarning => "early_warning",
            AlertKind::InterventionNeeded => "intervention_needed",
            AlertKind::CrisisRisk => "crisis_risk",
        }
    }
}

/// How quickly an alert should reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Alert synthesized from the factor set of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PredictiveAlert {
    /// Deterministic id derived from kind, analysis time and source factors
    pub id: String,
    /// Alert tier
    pub kind: AlertKind,
    /// Confidence of the tier
    pub confidence: f64,
    /// Urgency
    pub urgency: Urgency,
    /// Analysis time
    pub timestamp: DateTime<Utc>,
    /// Factors that put the run in this tier
    pub source_factor_ids: Vec<String>,
}

/// Coarse band of the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Band a 0 - 100 score.
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskLevel::Critical
        } else if score >= 50.0 {
            RiskLevel::High
        } else if score >= 25.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct AnalysisReport {
    /// Time the analysis was run for
    pub analyzed_at: DateTime<Utc>,
    /// Exclusive lower bound of the analysis window
    pub window_start: DateTime<Utc>,
    /// Detected factors, sorted by id
    pub factors: Vec<RiskFactor>,
    /// Aggregate score (0 - 100)
    pub score: f64,
    /// Score band
    pub level: RiskLevel,
    /// At most one alert
    pub alert: Option<PredictiveAlert>,
}

impl AnalysisReport {
    /// Recommendations from all factors, de-duplicated, in factor order.
    pub fn recommendations(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.factors
            .iter()
            .flat_map(|f| f.recommendations.iter())
            .filter(|r| seen.insert(r.as_str()))
            .map(|r| r.as_str())
            .collect()
    }

    /// Find a factor by id.
    pub fn factor(&self, id: &str) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.id == id)
    }

    /// Whether the run produced a critical alert.
    pub fn is_critical(&self) -> bool {
        self.alert
            .as_ref()
            .is_some_and(|a| a.urgency == Urgency::Critical)
    }
}

/// Error types for risk analysis.
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    /// Snapshot could not be read
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// A sink rejected a report or notification
    #[error("Sink error ({sink}): {message}")]
    Sink { sink: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;
