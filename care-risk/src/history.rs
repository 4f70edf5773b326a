//! Bounded history of evaluation runs.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use care_records::Timestamp;

use crate::types::{AlertKind, AnalysisReport, RiskLevel, Trend};

/// Score change (points) needed before the trend moves off stable.
const TREND_DELTA: f64 = 5.0;

/// Summary of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique run ID
    pub run_id: String,
    /// Analysis time of the run
    pub evaluated_at: Timestamp,
    /// Aggregate score
    pub score: f64,
    /// Score band
    pub level: RiskLevel,
    /// Alert tier, if an alert was raised
    pub alert_kind: Option<AlertKind>,
    /// Ids of the detected factors
    pub factor_ids: Vec<String>,
}

impl RunRecord {
    /// Summarize a report.
    pub fn from_report(run_id: impl Into<String>, report: &AnalysisReport) -> Self {
        Self {
            run_id: run_id.into(),
            evaluated_at: report.analyzed_at,
            score: report.score,
            level: report.level,
            alert_kind: report.alert.as_ref().map(|a| a.kind),
            factor_ids: report.factors.iter().map(|f| f.id.clone()).collect(),
        }
    }
}

/// Run history, oldest first, dropping the oldest run when full.
pub struct RunHistory {
    runs: Arc<RwLock<VecDeque<RunRecord>>>,
    max_runs: usize,
}

impl RunHistory {
    /// Create a history holding at most `max_runs` runs.
    pub fn new(max_runs: usize) -> Self {
        Self {
            runs: Arc::new(RwLock::new(VecDeque::with_capacity(max_runs.min(1024)))),
            max_runs,
        }
    }

    /// Record a run.
    pub async fn record(&self, run: RunRecord) {
        if self.max_runs == 0 {
            return;
        }

        let mut runs = self.runs.write().await;
        while runs.len() >= self.max_runs {
            runs.pop_front();
        }
        debug!(run_id = %run.run_id, score = run.score, "Recording run");
        runs.push_back(run);
    }

    /// Most recent runs, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<RunRecord> {
        let runs = self.runs.read().await;
        runs.iter().rev().take(limit).cloned().collect()
    }

    /// Number of recorded runs.
    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Whether no run has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }

    /// Direction of the score between the latest two runs.
    ///
    /// `None` until two runs exist.
    pub async fn score_trend(&self) -> Option<Trend> {
        let runs = self.runs.read().await;
        let mut newest = runs.iter().rev();
        let latest = newest.next()?;
        let previous = newest.next()?;

        let delta = latest.score - previous.score;
        Some(if delta > TREND_DELTA {
            Trend::Worsening
        } else if delta < -TREND_DELTA {
            Trend::Improving
        } else {
            Trend::Stable
        })
    }

    /// Clear all runs.
    pub async fn clear(&self) {
        self.runs.write().await.clear();
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
