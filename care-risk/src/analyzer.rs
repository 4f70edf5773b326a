//! Analysis pipeline.
//!
//! Runs every detector over the trailing window, scores the factor set
//! and synthesizes at most one alert. The pipeline is pure: the same
//! snapshot and `now` always produce the same report.

use std::sync::Arc;
use tracing::{debug, warn};

use care_records::{
    CheckInRecord, DiaryEntryRecord, FoodLogRecord, RecordSnapshot, Timestamp,
};

use crate::aggregator::risk_score;
use crate::config::RiskConfig;
use crate::detectors::{default_detectors, DetectionWindow, RiskDetector};
use crate::synthesizer::synthesize_alert;
use crate::types::{AnalysisReport, RiskLevel};

/// Risk analyzer over record snapshots.
pub struct RiskAnalyzer {
    /// Trailing window in days
    window_days: u32,
    /// Registered detectors
    detectors: Vec<Arc<dyn RiskDetector>>,
}

impl RiskAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&RiskConfig::default())
    }

    /// Create an analyzer with the detectors enabled in `config`.
    pub fn with_config(config: &RiskConfig) -> Self {
        Self {
            window_days: config.analyzer.window_days,
            detectors: default_detectors(config),
        }
    }

    /// Create a builder.
    pub fn builder() -> RiskAnalyzerBuilder {
        RiskAnalyzerBuilder::new()
    }

    /// Window length in days.
    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Ids of the registered detectors.
    pub fn detector_ids(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    /// Analyze a snapshot as of `now`.
    pub fn analyze(&self, snapshot: &RecordSnapshot, now: Timestamp) -> AnalysisReport {
        let window = DetectionWindow::new(snapshot, now, self.window_days);

        debug!(
            checkins = window.checkins.len(),
            diary_entries = window.diary_entries.len(),
            food_logs = window.food_logs.len(),
            detectors = self.detectors.len(),
            "Running risk analysis"
        );

        let mut factors: Vec<_> = self
            .detectors
            .iter()
            .filter_map(|detector| detector.detect(&window))
            .collect();
        factors.sort_by(|a, b| a.id.cmp(&b.id));

        let score = risk_score(&factors);
        let alert = synthesize_alert(&factors, now);

        if let Some(alert) = &alert {
            warn!(
                alert_id = %alert.id,
                kind = alert.kind.as_str(),
                urgency = ?alert.urgency,
                sources = ?alert.source_factor_ids,
                score = score,
                "Risk alert raised"
            );
        }

        AnalysisReport {
            analyzed_at: now,
            window_start: window.since,
            factors,
            score,
            level: RiskLevel::from_score(score),
            alert,
        }
    }
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for RiskAnalyzer.
pub struct RiskAnalyzerBuilder {
    window_days: u32,
    detectors: Vec<Arc<dyn RiskDetector>>,
}

impl RiskAnalyzerBuilder {
    /// Create a builder with no detectors.
    pub fn new() -> Self {
        Self {
            window_days: RiskConfig::default().analyzer.window_days,
            detectors: Vec::new(),
        }
    }

    /// Set the window length.
    pub fn window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    /// Add a detector.
    pub fn with_detector(mut self, detector: Arc<dyn RiskDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Add the detectors enabled in `config`.
    pub fn with_default_detectors(mut self, config: &RiskConfig) -> Self {
        self.detectors.extend(default_detectors(config));
        self
    }

    /// Build the analyzer.
    pub fn build(self) -> RiskAnalyzer {
        RiskAnalyzer {
            window_days: self.window_days,
            detectors: self.detectors,
        }
    }
}

impl Default for RiskAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze a snapshot with the default analyzer.
///
/// The snapshot bundles the check-ins, diary entries and food logs together
/// with the store's last-activity hint. Use [`run_analysis_on_logs`] when
/// the three logs are at hand without a store.
pub fn run_analysis(snapshot: &RecordSnapshot, now: Timestamp) -> AnalysisReport {
    RiskAnalyzer::new().analyze(snapshot, now)
}

/// Analyze the three logs directly with the default analyzer.
///
/// Last activity is taken from the supplied records only.
pub fn run_analysis_on_logs(
    checkins: Vec<CheckInRecord>,
    diary_entries: Vec<DiaryEntryRecord>,
    food_logs: Vec<FoodLogRecord>,
    now: Timestamp,
) -> AnalysisReport {
    run_analysis(&RecordSnapshot::new(checkins, diary_entries, food_logs), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::*;
    use crate::detectors::{
        ConcerningLanguageDetector, EmotionalDistressDetector, InactivityDetector,
        RestrictiveEatingDetector,
    };
    use crate::types::{AlertKind, Severity, Urgency};
    use care_records::{InMemoryRecordStore, RecordStore};
    use chrono::Duration;

    fn scenario_a() -> RecordSnapshot {
        let emotions = [
            "sad", "anxious", "angry", "overwhelmed", "sad", "anxious", "sad", "angry", "happy",
            "calm",
        ];
        let checkins = emotions
            .iter()
            .enumerate()
            .map(|(i, e)| checkin(1.0 + i as f64 * 0.5, e))
            .collect();
        RecordSnapshot::new(checkins, vec![], vec![])
    }

    fn scenario_b() -> RecordSnapshot {
        let food_logs = (0..6).map(|d| food_log(d as f64 + 0.5, d % 2)).collect();
        let checkins = vec![
            checkin(0.5, "sad"),
            checkin(1.5, "overwhelmed"),
            checkin(2.5, "anxious"),
        ];
        RecordSnapshot::new(checkins, vec![], food_logs)
    }

    #[test]
    fn test_scenario_emotional_distress() {
        let report = run_analysis(&scenario_a(), now());

        assert_eq!(report.factors.len(), 1);
        let factor = &report.factors[0];
        assert_eq!(factor.id, "emotional-distress");
        assert_eq!(factor.severity, Severity::High);
        assert_eq!(factor.confidence, 0.85);
        assert!((report.score - 63.75).abs() < 1e-9);
        assert_eq!(report.level, RiskLevel::High);

        let alert = report.alert.unwrap();
        assert_eq!(alert.kind, AlertKind::EarlyWarning);
        assert_eq!(alert.source_factor_ids, vec!["emotional-distress"]);
    }

    #[test]
    fn test_scenario_crisis() {
        let report = run_analysis(&scenario_b(), now());

        let ids: Vec<_> = report.factors.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["emotional-distress", "restrictive-eating"]);
        assert!(report
            .factors
            .iter()
            .all(|f| f.severity == Severity::Critical));

        let alert = report.alert.as_ref().unwrap();
        assert_eq!(alert.kind, AlertKind::CrisisRisk);
        assert_eq!(alert.urgency, Urgency::Critical);
        assert!(report.is_critical());
    }

    #[test]
    fn test_scenario_inactivity_from_store_hint() {
        let snapshot = RecordSnapshot::default().with_last_activity(Some(days_ago(10.0)));
        let report = run_analysis(&snapshot, now());

        assert_eq!(report.factors.len(), 1);
        assert_eq!(report.factors[0].id, "inactivity");
        assert_eq!(report.factors[0].severity, Severity::High);
        assert!((report.score - 71.25).abs() < 1e-9);
        assert_eq!(report.alert.unwrap().kind, AlertKind::EarlyWarning);
    }

    #[test]
    fn test_scenario_no_history() {
        let report = run_analysis(&RecordSnapshot::default(), now());

        assert!(report.factors.is_empty());
        assert_eq!(report.score, 0.0);
        assert_eq!(report.level, RiskLevel::Low);
        assert!(report.alert.is_none());
        assert!(report.recommendations().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let snapshot = scenario_b();
        let first = run_analysis(&snapshot, now());
        let second = run_analysis(&snapshot, now());

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_detector_order_does_not_matter() {
        let forward = RiskAnalyzer::builder()
            .with_detector(Arc::new(EmotionalDistressDetector::new()))
            .with_detector(Arc::new(RestrictiveEatingDetector::new()))
            .with_detector(Arc::new(InactivityDetector::new()))
            .with_detector(Arc::new(ConcerningLanguageDetector::new()))
            .build();
        let reverse = RiskAnalyzer::builder()
            .with_detector(Arc::new(ConcerningLanguageDetector::new()))
            .with_detector(Arc::new(InactivityDetector::new()))
            .with_detector(Arc::new(RestrictiveEatingDetector::new()))
            .with_detector(Arc::new(EmotionalDistressDetector::new()))
            .build();

        let mut snapshot = scenario_b();
        snapshot.diary_entries.push(diary(0.3, "no puedo más"));

        assert_eq!(
            forward.analyze(&snapshot, now()),
            reverse.analyze(&snapshot, now())
        );
    }

    #[test]
    fn test_new_critical_factor_escalates_to_crisis() {
        let base = scenario_a();
        let before = run_analysis(&base, now());

        let mut worse = base.clone();
        for (i, text) in ["no puedo más", "quiero desaparecer", "odio mi cuerpo"]
            .iter()
            .enumerate()
        {
            worse.diary_entries.push(diary(0.5 + i as f64, text));
        }
        let after = run_analysis(&worse, now());

        assert!(after.score >= before.score);
        assert_eq!(after.alert.unwrap().kind, AlertKind::CrisisRisk);
    }

    #[test]
    fn test_disabled_detectors_are_skipped() {
        let mut config = RiskConfig::default();
        config.analyzer.emotional_distress = false;
        let analyzer = RiskAnalyzer::with_config(&config);

        assert!(!analyzer.detector_ids().contains(&"emotional-distress"));
        assert!(analyzer.analyze(&scenario_a(), now()).factors.is_empty());
    }

    #[test]
    fn test_window_bounds_in_report() {
        let analyzer = RiskAnalyzer::builder()
            .window_days(3)
            .with_default_detectors(&RiskConfig::default())
            .build();
        let report = analyzer.analyze(&scenario_a(), now());

        assert_eq!(report.analyzed_at, now());
        assert_eq!(report.window_start, now() - Duration::days(3));
        assert_eq!(analyzer.window_days(), 3);
        // only the four negative check-ins fall inside three days
        assert_eq!(report.factor("emotional-distress").unwrap().severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_malformed_records_do_not_block_analysis() {
        let base = now().timestamp_millis();
        let day = 86_400_000i64;
        let export = serde_json::json!({
            "checkins": [
                {"timestamp": base - day, "emotion": "triste", "emotionIntensity": 4, "bingeRisk": 3},
                {"timestamp": base - 2 * day, "emotion": "ansiosa", "emotionIntensity": 5, "bingeRisk": 2},
                {"emotion": "triste", "emotionIntensity": 4, "bingeRisk": 3},
                {"timestamp": base - 3 * day, "emotion": 7, "emotionIntensity": 4, "bingeRisk": 3},
                {"timestamp": base - 3 * day, "emotion": "enojada", "emotionIntensity": 9, "bingeRisk": 3}
            ],
            "diary": [
                {"timestamp": "not a date", "emotion": "triste", "text": "no puedo más"}
            ]
        })
        .to_string();

        let (store, summary) = InMemoryRecordStore::from_export_json(&export).unwrap();
        // the out-of-range intensity is clamped, the record is kept
        assert_eq!(summary.checkins, 3);
        assert_eq!(summary.skipped, 3);

        let snapshot = store.snapshot(now() - Duration::days(7)).await.unwrap();
        let report = run_analysis(&snapshot, now());

        let factor = report.factor("emotional-distress").unwrap();
        assert_eq!(factor.severity, Severity::Critical);
        assert!(report.factor("concerning-language").is_none());
    }

    #[tokio::test]
    async fn test_checkins_without_scales_still_count() {
        let base = now().timestamp_millis();
        let hour = 3_600_000i64;
        let export = serde_json::json!({
            "checkins": [
                {"timestamp": base - hour, "emotion": "triste"},
                {"timestamp": base - 2 * hour, "emotion": "triste"},
                {"timestamp": base - 3 * hour, "emotion": "ansiosa"},
                {"timestamp": base - 4 * hour, "emotion": "feliz", "emotionIntensity": 2, "bingeRisk": 1}
            ]
        })
        .to_string();

        let (store, summary) = InMemoryRecordStore::from_export_json(&export).unwrap();
        assert_eq!(summary.checkins, 4);
        assert_eq!(summary.skipped, 0);

        let snapshot = store.snapshot(now() - Duration::days(7)).await.unwrap();
        let report = run_analysis(&snapshot, now());

        let factor = report.factor("emotional-distress").unwrap();
        assert_eq!(factor.severity, Severity::High);
    }

    #[test]
    fn test_run_analysis_on_logs_matches_snapshot() {
        let checkins = vec![
            checkin(1.0, "triste"),
            checkin(2.0, "ansiosa"),
            checkin(3.0, "triste"),
        ];
        let diary_entries = vec![diary(1.5, "quiero desaparecer")];
        let food_logs = vec![food_log(1.0, 0), food_log(2.0, 1)];

        let from_logs = run_analysis_on_logs(
            checkins.clone(),
            diary_entries.clone(),
            food_logs.clone(),
            now(),
        );
        let from_snapshot = run_analysis(
            &RecordSnapshot::new(checkins, diary_entries, food_logs),
            now(),
        );

        assert_eq!(from_logs, from_snapshot);
        assert!(from_logs.is_critical());
    }
}
