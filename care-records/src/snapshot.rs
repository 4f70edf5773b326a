//! Immutable snapshot of the record logs handed to the analysis.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{CheckInRecord, DiaryEntryRecord, FoodLogRecord, Timestamp};

/// Materialized view of a user's logs at analysis time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Check-ins (usually already limited to the analysis window)
    pub checkins: Vec<CheckInRecord>,
    /// Diary entries
    pub diary_entries: Vec<DiaryEntryRecord>,
    /// Food logs
    pub food_logs: Vec<FoodLogRecord>,
    /// Most recent activity known to the store, including records older
    /// than the window. `None` when the user has never written anything.
    pub last_activity: Option<Timestamp>,
}

impl RecordSnapshot {
    /// Create a snapshot from the three logs.
    pub fn new(
        checkins: Vec<CheckInRecord>,
        diary_entries: Vec<DiaryEntryRecord>,
        food_logs: Vec<FoodLogRecord>,
    ) -> Self {
        Self {
            checkins,
            diary_entries,
            food_logs,
            last_activity: None,
        }
    }

    /// Set the last known activity from the store.
    pub fn with_last_activity(mut self, last_activity: Option<Timestamp>) -> Self {
        self.last_activity = last_activity;
        self
    }

    /// Latest activity across check-ins, diary entries and the store hint.
    ///
    /// Food logs do not count as activity.
    pub fn latest_activity(&self) -> Option<Timestamp> {
        self.checkins
            .iter()
            .map(|c| c.timestamp)
            .chain(self.diary_entries.iter().map(|d| d.timestamp))
            .chain(self.last_activity)
            .max()
    }

    /// Whether the snapshot holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.checkins.is_empty() && self.diary_entries.is_empty() && self.food_logs.is_empty()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.checkins.len() + self.diary_entries.len() + self.food_logs.len()
    }

    /// SHA-256 fingerprint of the snapshot contents.
    ///
    /// Identical snapshots always produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        compute_hash(&json)
    }
}

/// Compute SHA-256 hash of content as lowercase hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
