//! Alert sinks.
//!
//! Sinks receive every report the monitor produces and are told
//! separately about critical alerts so the app can notify the user.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::types::{AnalysisReport, PredictiveAlert, Result};

/// Receiver of analysis output.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Persist or forward a report.
    async fn record(&self, report: &AnalysisReport) -> Result<()>;

    /// Notify the user of a critical alert.
    async fn notify_critical(&self, alert: &PredictiveAlert) -> Result<()>;
}

/// Sink that writes reports to the tracing log.
pub struct LoggingSink;

#[async_trait]
impl AlertSink for LoggingSink {
    fn name(&self) -> &str {
        "logging"
    }

    async fn record(&self, report: &AnalysisReport) -> Result<()> {
        info!(
            analyzed_at = %report.analyzed_at,
            score = report.score,
            level = ?report.level,
            factors = report.factors.len(),
            alert = report.alert.as_ref().map(|a| a.kind.as_str()).unwrap_or("none"),
            "Risk report recorded"
        );
        Ok(())
    }

    async fn notify_critical(&self, alert: &PredictiveAlert) -> Result<()> {
        warn!(
            alert_id = %alert.id,
            confidence = alert.confidence,
            sources = ?alert.source_factor_ids,
            "Critical risk alert, user notification requested"
        );
        Ok(())
    }
}

/// An alert kept by [`InMemoryAlertSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAlert {
    /// The alert
    pub alert: PredictiveAlert,
    /// Dismissed by the user
    pub acknowledged: bool,
}

/// Sink that keeps reports and alerts in memory.
pub struct InMemoryAlertSink {
    /// Recorded reports, oldest first
    reports: Arc<RwLock<VecDeque<AnalysisReport>>>,
    /// Alerts from recorded reports, oldest first
    alerts: Arc<RwLock<VecDeque<StoredAlert>>>,
    /// Critical notifications received, oldest first
    notifications: Arc<RwLock<VecDeque<PredictiveAlert>>>,
    /// Maximum reports, alerts and notifications to keep
    max_entries: usize,
}

impl InMemoryAlertSink {
    /// Create a sink keeping up to 1000 reports.
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Create with a custom limit.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            reports: Arc::new(RwLock::new(VecDeque::new())),
            alerts: Arc::new(RwLock::new(VecDeque::new())),
            notifications: Arc::new(RwLock::new(VecDeque::new())),
            max_entries,
        }
    }

    /// Recorded reports, oldest first.
    pub async fn reports(&self) -> Vec<AnalysisReport> {
        self.reports.read().await.iter().cloned().collect()
    }

    /// All stored alerts, oldest first.
    pub async fn alerts(&self) -> Vec<StoredAlert> {
        self.alerts.read().await.iter().cloned().collect()
    }

    /// Alerts the user has not dismissed.
    pub async fn unacknowledged(&self) -> Vec<PredictiveAlert> {
        self.alerts
            .read()
            .await
            .iter()
            .filter(|a| !a.acknowledged)
            .map(|a| a.alert.clone())
            .collect()
    }

    /// Mark an alert as dismissed. Returns false if the id is unknown.
    pub async fn acknowledge(&self, alert_id: &str) -> bool {
        let mut alerts = self.alerts.write().await;
        match alerts.iter_mut().find(|a| a.alert.id == alert_id) {
            Some(stored) => {
                stored.acknowledged = true;
                debug!(alert_id = %alert_id, "Alert acknowledged");
                true
            }
            None => false,
        }
    }

    /// Critical notifications received.
    pub async fn critical_notifications(&self) -> Vec<PredictiveAlert> {
        self.notifications.read().await.iter().cloned().collect()
    }
}

impl Default for InMemoryAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for InMemoryAlertSink {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn record(&self, report: &AnalysisReport) -> Result<()> {
        {
            let mut reports = self.reports.write().await;
            if reports.len() >= self.max_entries {
                reports.pop_front();
            }
            reports.push_back(report.clone());
        }

        if let Some(alert) = &report.alert {
            let mut alerts = self.alerts.write().await;
            // Re-running the same analysis yields the same alert id.
            if !alerts.iter().any(|a| a.alert.id == alert.id) {
                if alerts.len() >= self.max_entries {
                    alerts.pop_front();
                }
                alerts.push_back(StoredAlert {
                    alert: alert.clone(),
                    acknowledged: false,
                });
            }
        }

        Ok(())
    }

    async fn notify_critical(&self, alert: &PredictiveAlert) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        if notifications.len() >= self.max_entries {
            notifications.pop_front();
        }
        notifications.push_back(alert.clone());
        Ok(())
    }
}
