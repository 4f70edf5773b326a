//! Risk pattern detectors.
//!
//! Each detector scans the trailing window and emits at most one factor:
//! - **Emotional distress**: share of negative check-in emotions
//! - **Restrictive eating**: days with fewer than two meals
//! - **Inactivity**: days since the last check-in or diary entry
//! - **Concerning language**: crisis phrases in diary text
//!
//! Detectors never read each other's output, so the factor set does not
//! depend on the order they run in.

mod emotional;
mod inactivity;
mod language;
mod restrictive;

pub use emotional::EmotionalDistressDetector;
pub use inactivity::InactivityDetector;
pub use language::ConcerningLanguageDetector;
pub use restrictive::RestrictiveEatingDetector;

use chrono::Duration;
use std::sync::Arc;

use care_records::{CheckInRecord, DiaryEntryRecord, FoodLogRecord, RecordSnapshot, Timestamp};

use crate::config::RiskConfig;
use crate::types::RiskFactor;

/// Common trait for risk detectors.
pub trait RiskDetector: Send + Sync {
    /// Id of the factor this detector emits.
    fn id(&self) -> &'static str;

    /// Inspect the window and return a factor if the pattern is present.
    fn detect(&self, window: &DetectionWindow<'_>) -> Option<RiskFactor>;
}

/// Records inside the trailing window, borrowed from a snapshot.
#[derive(Debug, Clone)]
pub struct DetectionWindow<'a> {
    /// Analysis time
    pub now: Timestamp,
    /// Exclusive lower bound (`now - window`)
    pub since: Timestamp,
    /// Check-ins with `timestamp > since`
    pub checkins: Vec<&'a CheckInRecord>,
    /// Diary entries with `timestamp > since`
    pub diary_entries: Vec<&'a DiaryEntryRecord>,
    /// Food logs with `timestamp > since`
    pub food_logs: Vec<&'a FoodLogRecord>,
    /// Latest activity across the whole snapshot, not only the window
    pub last_activity: Option<Timestamp>,
}

impl<'a> DetectionWindow<'a> {
    /// Slice a snapshot to the trailing `window_days` before `now`.
    pub fn new(snapshot: &'a RecordSnapshot, now: Timestamp, window_days: u32) -> Self {
        let since = now - Duration::days(i64::from(window_days));
        Self {
            now,
            since,
            checkins: snapshot
                .checkins
                .iter()
                .filter(|r| r.timestamp > since)
                .collect(),
            diary_entries: snapshot
                .diary_entries
                .iter()
                .filter(|r| r.timestamp > since)
                .collect(),
            food_logs: snapshot
                .food_logs
                .iter()
                .filter(|r| r.timestamp > since)
                .collect(),
            last_activity: snapshot.latest_activity(),
        }
    }
}

/// Build the detectors enabled in `config`.
pub fn default_detectors(config: &RiskConfig) -> Vec<Arc<dyn RiskDetector>> {
    let mut detectors: Vec<Arc<dyn RiskDetector>> = Vec::new();

    if config.analyzer.emotional_distress {
        detectors.push(Arc::new(EmotionalDistressDetector::new()));
    }
    if config.analyzer.restrictive_eating {
        detectors.push(Arc::new(RestrictiveEatingDetector::new()));
    }
    if config.analyzer.inactivity {
        detectors.push(Arc::new(InactivityDetector::new()));
    }
    if config.analyzer.concerning_language {
        detectors.push(Arc::new(ConcerningLanguageDetector::with_phrases(
            config.language.concerning_phrases.clone(),
        )));
    }

    detectors
}
