//! Risk monitor service.
//!
//! Reads a snapshot from the record store, runs the analyzer, keeps a
//! bounded run history and hands the report to every registered sink.
//! Reports are memoized against the snapshot fingerprint and the exact
//! evaluation time, so a cached report is always the report a fresh
//! analysis would produce.

use chrono::Duration;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use care_records::{RecordStore, Timestamp};

use crate::analyzer::RiskAnalyzer;
use crate::config::RiskConfig;
use crate::history::{RunHistory, RunRecord};
use crate::sink::AlertSink;
use crate::types::{AnalysisReport, PredictiveAlert, Result, RiskError, Trend};

/// A sink that rejected a report or notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    /// Sink name
    pub sink: String,
    /// Error message
    pub message: String,
}

impl From<SinkFailure> for RiskError {
    fn from(failure: SinkFailure) -> Self {
        RiskError::Sink {
            sink: failure.sink,
            message: failure.message,
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// Unique run ID
    pub run_id: String,
    /// Analysis report
    pub report: AnalysisReport,
    /// Served from the memo cache without running detectors
    pub cached: bool,
    /// Sinks that failed during dispatch
    pub sink_failures: Vec<SinkFailure>,
}

struct CachedReport {
    key: String,
    report: AnalysisReport,
}

/// Periodic risk evaluation over a record store.
pub struct RiskMonitor<S: RecordStore> {
    /// Configuration
    config: RiskConfig,
    /// Source of records
    store: Arc<S>,
    /// Analysis pipeline
    analyzer: RiskAnalyzer,
    /// Registered sinks
    sinks: Arc<RwLock<Vec<Arc<dyn AlertSink>>>>,
    /// Last report and its cache key
    cache: Arc<RwLock<Option<CachedReport>>>,
    /// Run history
    history: RunHistory,
}

impl<S: RecordStore> RiskMonitor<S> {
    /// Create a monitor with default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, RiskConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(store: Arc<S>, config: RiskConfig) -> Self {
        let analyzer = RiskAnalyzer::with_config(&config);
        Self::from_parts(store, config, analyzer, Vec::new())
    }

    /// Create a builder.
    pub fn builder(store: Arc<S>) -> RiskMonitorBuilder<S> {
        RiskMonitorBuilder::new(store)
    }

    fn from_parts(
        store: Arc<S>,
        config: RiskConfig,
        analyzer: RiskAnalyzer,
        sinks: Vec<Arc<dyn AlertSink>>,
    ) -> Self {
        Self {
            history: RunHistory::new(config.monitor.history_size),
            config,
            store,
            analyzer,
            sinks: Arc::new(RwLock::new(sinks)),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Register a sink.
    pub async fn register_sink(&self, sink: Arc<dyn AlertSink>) {
        debug!(sink = %sink.name(), "Registering alert sink");
        self.sinks.write().await.push(sink);
    }

    /// Evaluate risk as of `now`.
    pub async fn evaluate(&self, now: Timestamp) -> Result<EvaluationOutcome> {
        let since = now - Duration::days(i64::from(self.analyzer.window_days()));

        let snapshot = self.store.snapshot(since).await.map_err(|e| {
            warn!(error = %e, "Record store unavailable, evaluation aborted");
            RiskError::from(e)
        })?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let key = format!("{}:{}", snapshot.fingerprint(), now.timestamp_millis());

        if let Some(cached) = self.cached_report(&key).await {
            debug!(run_id = %run_id, "Snapshot unchanged, serving cached report");
            return Ok(EvaluationOutcome {
                run_id,
                report: cached,
                cached: true,
                sink_failures: Vec::new(),
            });
        }

        let report = self.analyzer.analyze(&snapshot, now);

        info!(
            run_id = %run_id,
            records = snapshot.len(),
            factors = report.factors.len(),
            score = report.score,
            level = ?report.level,
            "Risk evaluation complete"
        );

        {
            let mut cache = self.cache.write().await;
            *cache = Some(CachedReport {
                key,
                report: report.clone(),
            });
        }
        self.history
            .record(RunRecord::from_report(run_id.clone(), &report))
            .await;

        let mut sink_failures = self.dispatch_report(&report).await;
        if let Some(alert) = report.alert.as_ref() {
            if report.is_critical() && self.config.monitor.notify_on_critical {
                sink_failures.extend(self.dispatch_critical(alert).await);
            }
        }

        Ok(EvaluationOutcome {
            run_id,
            report,
            cached: false,
            sink_failures,
        })
    }

    /// Most recent runs, newest first.
    pub async fn history(&self, limit: usize) -> Vec<RunRecord> {
        self.history.recent(limit).await
    }

    /// Direction of the score over the latest two runs.
    pub async fn score_trend(&self) -> Option<Trend> {
        self.history.score_trend().await
    }

    /// Drop the memoized report.
    pub async fn invalidate_cache(&self) {
        *self.cache.write().await = None;
    }

    async fn cached_report(&self, key: &str) -> Option<AnalysisReport> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.key == key)
            .map(|c| c.report.clone())
    }

    async fn dispatch_report(&self, report: &AnalysisReport) -> Vec<SinkFailure> {
        let sinks = self.sinks.read().await.clone();
        let results = join_all(sinks.iter().map(|sink| sink.record(report))).await;
        collect_failures(&sinks, results)
    }

    async fn dispatch_critical(&self, alert: &PredictiveAlert) -> Vec<SinkFailure> {
        let sinks = self.sinks.read().await.clone();
        info!(alert_id = %alert.id, sinks = sinks.len(), "Dispatching critical alert");
        let results = join_all(sinks.iter().map(|sink| sink.notify_critical(alert))).await;
        collect_failures(&sinks, results)
    }
}

fn collect_failures(sinks: &[Arc<dyn AlertSink>], results: Vec<Result<()>>) -> Vec<SinkFailure> {
    sinks
        .iter()
        .zip(results)
        .filter_map(|(sink, result)| {
            result.err().map(|e| {
                warn!(sink = %sink.name(), error = %e, "Alert sink failed");
                SinkFailure {
                    sink: sink.name().to_string(),
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

/// Builder for RiskMonitor.
pub struct RiskMonitorBuilder<S: RecordStore> {
    store: Arc<S>,
    config: RiskConfig,
    analyzer: Option<RiskAnalyzer>,
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl<S: RecordStore> RiskMonitorBuilder<S> {
    /// Create a builder over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: RiskConfig::default(),
            analyzer: None,
            sinks: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: RiskConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the analysis window.
    pub fn window_days(mut self, days: u32) -> Self {
        self.config.analyzer.window_days = days;
        self
    }

    /// Set the run history size.
    pub fn history_size(mut self, size: usize) -> Self {
        self.config.monitor.history_size = size;
        self
    }

    /// Enable/disable critical notifications.
    pub fn notify_on_critical(mut self, enabled: bool) -> Self {
        self.config.monitor.notify_on_critical = enabled;
        self
    }

    /// Use a custom analyzer instead of one built from the configuration.
    pub fn with_analyzer(mut self, analyzer: RiskAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Add a sink.
    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the monitor.
    pub fn build(self) -> RiskMonitor<S> {
        let analyzer = self
            .analyzer
            .unwrap_or_else(|| RiskAnalyzer::with_config(&self.config));
        RiskMonitor::from_parts(self.store, self.config, analyzer, self.sinks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::run_analysis;
    use crate::sink::{InMemoryAlertSink, LoggingSink};
    use crate::types::{AlertKind, Severity};
    use async_trait::async_trait;
    use care_records::{CheckInRecord, DiaryEntryRecord, FoodLogRecord, InMemoryRecordStore};
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    struct FailingSink;

    #[async_trait]
    impl AlertSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn record(&self, _report: &AnalysisReport) -> Result<()> {
            Err(RiskError::Sink {
                sink: "failing".to_string(),
                message: "disk full".to_string(),
            })
        }

        async fn notify_critical(&self, _alert: &PredictiveAlert) -> Result<()> {
            Ok(())
        }
    }

    async fn inactive_store() -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .set_activity_hint(Some(now() - Duration::days(10)))
            .await;
        store
    }

    async fn crisis_store() -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        for day in 0..6 {
            store
                .append_food_log(FoodLogRecord::new(
                    now() - Duration::hours(12 + day * 24),
                    vec![],
                ))
                .await;
        }
        for hours in [6, 30, 54] {
            store
                .append_checkin(CheckInRecord::new(now() - Duration::hours(hours), "sad"))
                .await;
        }
        store
    }

    #[tokio::test]
    async fn test_evaluate_dispatches_to_sinks() {
        let sink = Arc::new(InMemoryAlertSink::new());
        let monitor = RiskMonitor::builder(inactive_store().await)
            .with_sink(sink.clone())
            .with_sink(Arc::new(LoggingSink))
            .build();

        let outcome = monitor.evaluate(now()).await.unwrap();

        assert!(!outcome.cached);
        assert!(outcome.sink_failures.is_empty());
        assert_eq!(outcome.report.factors.len(), 1);
        assert_eq!(outcome.report.factors[0].severity, Severity::High);
        assert!((outcome.report.score - 71.25).abs() < 1e-9);
        assert_eq!(sink.reports().await.len(), 1);
        assert_eq!(sink.unacknowledged().await[0].kind, AlertKind::EarlyWarning);
        assert!(sink.critical_notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_is_cached() {
        let store = inactive_store().await;
        let sink = Arc::new(InMemoryAlertSink::new());
        let monitor = RiskMonitor::new(store.clone());
        monitor.register_sink(sink.clone()).await;

        let first = monitor.evaluate(now()).await.unwrap();
        let second = monitor.evaluate(now()).await.unwrap();

        assert!(second.cached);
        assert_eq!(first.report, second.report);
        assert_eq!(sink.reports().await.len(), 1);
        assert_eq!(monitor.history(10).await.len(), 1);

        store
            .append_checkin(CheckInRecord::new(now() - Duration::hours(1), "calm"))
            .await;
        let third = monitor.evaluate(now()).await.unwrap();

        assert!(!third.cached);
        assert!(third.report.factors.is_empty());
        assert_eq!(monitor.score_trend().await, Some(Trend::Improving));
    }

    #[tokio::test]
    async fn test_invalidate_cache() {
        let monitor = RiskMonitor::new(inactive_store().await);

        monitor.evaluate(now()).await.unwrap();
        monitor.invalidate_cache().await;
        let outcome = monitor.evaluate(now()).await.unwrap();

        assert!(!outcome.cached);
        assert_eq!(monitor.score_trend().await, Some(Trend::Stable));
    }

    #[tokio::test]
    async fn test_new_time_is_not_served_from_cache() {
        let monitor = RiskMonitor::new(inactive_store().await);

        monitor.evaluate(now()).await.unwrap();
        let later = monitor
            .evaluate(now() + Duration::seconds(30))
            .await
            .unwrap();

        assert!(!later.cached);
        assert_eq!(later.report.analyzed_at, now() + Duration::seconds(30));
    }

    #[tokio::test]
    async fn test_report_matches_direct_analysis_off_the_minute() {
        let at = now() + Duration::seconds(50);
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .append_checkin(CheckInRecord::new(
                at - Duration::days(2) - Duration::seconds(30),
                "calm",
            ))
            .await;
        let monitor = RiskMonitor::new(store.clone());

        let outcome = monitor.evaluate(at).await.unwrap();
        let snapshot = store.snapshot(at - Duration::days(7)).await.unwrap();
        let direct = run_analysis(&snapshot, at);

        assert_eq!(outcome.report, direct);
        assert_eq!(outcome.report.analyzed_at, at);
        assert!(outcome.report.factor("inactivity").is_some());
    }

    #[tokio::test]
    async fn test_same_tier_alerts_at_same_time_are_kept_apart() {
        let store = Arc::new(InMemoryRecordStore::new());
        for day in 0..6 {
            store
                .append_food_log(FoodLogRecord::new(
                    now() - Duration::hours(12 + day * 24),
                    vec![],
                ))
                .await;
        }
        store
            .append_checkin(CheckInRecord::new(now() - Duration::hours(2), "calm"))
            .await;
        let sink = Arc::new(InMemoryAlertSink::new());
        let monitor = RiskMonitor::builder(store.clone())
            .with_sink(sink.clone())
            .build();

        let first = monitor.evaluate(now()).await.unwrap();
        for hours in [3, 5, 7] {
            store
                .append_diary_entry(DiaryEntryRecord::new(
                    now() - Duration::hours(hours),
                    "triste",
                    "quiero desaparecer",
                ))
                .await;
        }
        let second = monitor.evaluate(now()).await.unwrap();

        let first_alert = first.report.alert.unwrap();
        let second_alert = second.report.alert.unwrap();
        assert_eq!(first_alert.kind, AlertKind::CrisisRisk);
        assert_eq!(second_alert.kind, AlertKind::CrisisRisk);
        assert_ne!(first_alert.id, second_alert.id);

        assert!(sink.acknowledge(&first_alert.id).await);
        let open = sink.unacknowledged().await;
        assert_eq!(open.len(), 1);
        assert_eq!(
            open[0].source_factor_ids,
            vec!["concerning-language", "restrictive-eating"]
        );
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let store = inactive_store().await;
        store.set_available(false).await;
        let monitor = RiskMonitor::new(store);

        let result = monitor.evaluate(now()).await;

        assert!(matches!(result, Err(RiskError::Store(_))));
        assert!(monitor.history(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_abort() {
        let sink = Arc::new(InMemoryAlertSink::new());
        let monitor = RiskMonitor::builder(inactive_store().await)
            .with_sink(Arc::new(FailingSink))
            .with_sink(sink.clone())
            .build();

        let outcome = monitor.evaluate(now()).await.unwrap();

        assert_eq!(outcome.sink_failures.len(), 1);
        assert_eq!(outcome.sink_failures[0].sink, "failing");
        assert!(outcome.sink_failures[0].message.contains("disk full"));
        assert_eq!(sink.reports().await.len(), 1);

        let error: RiskError = outcome.sink_failures[0].clone().into();
        assert!(matches!(error, RiskError::Sink { .. }));
    }

    #[tokio::test]
    async fn test_critical_alert_notifies_sinks() {
        let sink = Arc::new(InMemoryAlertSink::new());
        let monitor = RiskMonitor::builder(crisis_store().await)
            .with_sink(sink.clone())
            .build();

        let outcome = monitor.evaluate(now()).await.unwrap();

        assert!(outcome.report.is_critical());
        let notified = sink.critical_notifications().await;
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].kind, AlertKind::CrisisRisk);
        assert_eq!(
            monitor.history(1).await[0].alert_kind,
            Some(AlertKind::CrisisRisk)
        );
    }

    #[tokio::test]
    async fn test_critical_notification_can_be_disabled() {
        let sink = Arc::new(InMemoryAlertSink::new());
        let monitor = RiskMonitor::builder(crisis_store().await)
            .notify_on_critical(false)
            .with_sink(sink.clone())
            .build();

        monitor.evaluate(now()).await.unwrap();

        assert!(sink.critical_notifications().await.is_empty());
        assert_eq!(sink.reports().await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_bounded_by_config() {
        let store = inactive_store().await;
        let monitor = RiskMonitor::builder(store)
            .history_size(2)
            .build();

        for minute in 0..4 {
            monitor
                .evaluate(now() + Duration::minutes(minute))
                .await
                .unwrap();
        }

        let runs = monitor.history(10).await;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].evaluated_at, now() + Duration::minutes(3));
        assert_eq!(runs[0].factor_ids, vec!["inactivity"]);
    }
}
