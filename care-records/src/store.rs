//! Record store abstraction.
//!
//! The analysis never reads ambient state; it is handed whatever a
//! [`RecordStore`] returns. [`InMemoryRecordStore`] backs tests and the
//! loader for app exports.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::ingest::{self, parse_timestamp_value};
use crate::snapshot::RecordSnapshot;
use crate::types::{CheckInRecord, DiaryEntryRecord, FoodLogRecord, Timestamp};

/// Error types for record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored data cannot be decoded as a whole
    #[error("Corrupt store data: {0}")]
    Corrupt(String),
}

/// Read access to a user's append-only logs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check-ins written strictly after `since`.
    async fn get_recent_checkins(&self, since: Timestamp) -> Result<Vec<CheckInRecord>, StoreError>;

    /// Diary entries written strictly after `since`.
    async fn get_recent_diary_entries(
        &self,
        since: Timestamp,
    ) -> Result<Vec<DiaryEntryRecord>, StoreError>;

    /// Food logs written strictly after `since`.
    async fn get_recent_food_logs(&self, since: Timestamp) -> Result<Vec<FoodLogRecord>, StoreError>;

    /// Most recent check-in or diary timestamp ever written, if any.
    async fn last_activity(&self) -> Result<Option<Timestamp>, StoreError>;

    /// Read all three logs since `since` into one snapshot.
    async fn snapshot(&self, since: Timestamp) -> Result<RecordSnapshot, StoreError> {
        let checkins = self.get_recent_checkins(since).await?;
        let diary_entries = self.get_recent_diary_entries(since).await?;
        let food_logs = self.get_recent_food_logs(since).await?;
        let last_activity = self.last_activity().await?;

        Ok(RecordSnapshot::new(checkins, diary_entries, food_logs).with_last_activity(last_activity))
    }
}

#[derive(Debug, Default)]
struct Logs {
    checkins: Vec<CheckInRecord>,
    diary_entries: Vec<DiaryEntryRecord>,
    food_logs: Vec<FoodLogRecord>,
    /// Activity recorded before the logs were trimmed or exported
    activity_hint: Option<Timestamp>,
}

/// Counts from loading an export document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Check-ins loaded
    pub checkins: usize,
    /// Diary entries loaded
    pub diary_entries: usize,
    /// Food logs loaded
    pub food_logs: usize,
    /// Entries skipped across all logs
    pub skipped: usize,
}

/// In-memory record store.
pub struct InMemoryRecordStore {
    logs: Arc<RwLock<Logs>>,
    /// Simulated availability
    available: Arc<RwLock<bool>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_logs(Logs::default())
    }

    fn from_logs(logs: Logs) -> Self {
        Self {
            logs: Arc::new(RwLock::new(logs)),
            available: Arc::new(RwLock::new(true)),
        }
    }

    /// Load an app export document.
    ///
    /// Accepts `{"checkins": [...], "diary": [...], "foodLogs": [...],
    /// "lastActivity": ...}` (snake_case and alternate key spellings are
    /// accepted too). Missing logs load as empty; malformed entries are
    /// skipped and counted.
    pub fn from_export_json(json: &str) -> Result<(Self, ImportSummary), StoreError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if !document.is_object() {
            return Err(StoreError::Corrupt(
                "export document must be a JSON object".to_string(),
            ));
        }

        let section = |keys: &[&str]| -> Value {
            keys.iter()
                .find_map(|k| document.get(*k))
                .cloned()
                .unwrap_or_else(|| Value::Array(vec![]))
        };

        let checkins = ingest::parse_checkins(&section(&["checkins", "checkIns", "check_ins"]));
        let diary = ingest::parse_diary_entries(&section(&["diary", "diaryEntries", "diary_entries"]));
        let food = ingest::parse_food_logs(&section(&["foodLogs", "food_logs", "foodLog"]));

        let activity_hint = ["lastActivity", "last_activity"]
            .iter()
            .find_map(|k| document.get(*k))
            .and_then(|v| parse_timestamp_value(v).ok());

        let summary = ImportSummary {
            checkins: checkins.records.len(),
            diary_entries: diary.records.len(),
            food_logs: food.records.len(),
            skipped: checkins.skipped.len() + diary.skipped.len() + food.skipped.len(),
        };

        info!(
            checkins = summary.checkins,
            diary_entries = summary.diary_entries,
            food_logs = summary.food_logs,
            skipped = summary.skipped,
            "Loaded record export"
        );

        let store = Self::from_logs(Logs {
            checkins: checkins.records,
            diary_entries: diary.records,
            food_logs: food.records,
            activity_hint,
        });

        Ok((store, summary))
    }

    /// Append a check-in.
    pub async fn append_checkin(&self, record: CheckInRecord) {
        let mut logs = self.logs.write().await;
        logs.checkins.push(record);
    }

    /// Append a diary entry.
    pub async fn append_diary_entry(&self, record: DiaryEntryRecord) {
        let mut logs = self.logs.write().await;
        logs.diary_entries.push(record);
    }

    /// Append a food log.
    pub async fn append_food_log(&self, record: FoodLogRecord) {
        let mut logs = self.logs.write().await;
        logs.food_logs.push(record);
    }

    /// Record activity that happened outside the stored logs.
    pub async fn set_activity_hint(&self, timestamp: Option<Timestamp>) {
        let mut logs = self.logs.write().await;
        logs.activity_hint = timestamp;
    }

    /// Mark the store as reachable or not.
    pub async fn set_available(&self, available: bool) {
        let mut flag = self.available.write().await;
        *flag = available;
    }

    async fn ensure_available(&self) -> Result<(), StoreError> {
        if *self.available.read().await {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_recent_checkins(&self, since: Timestamp) -> Result<Vec<CheckInRecord>, StoreError> {
        self.ensure_available().await?;
        let logs = self.logs.read().await;
        let recent: Vec<_> = logs
            .checkins
            .iter()
            .filter(|r| r.timestamp > since)
            .cloned()
            .collect();
        debug!(count = recent.len(), since = %since, "Read recent check-ins");
        Ok(recent)
    }

    async fn get_recent_diary_entries(
        &self,
        since: Timestamp,
    ) -> Result<Vec<DiaryEntryRecord>, StoreError> {
        self.ensure_available().await?;
        let logs = self.logs.read().await;
        Ok(logs
            .diary_entries
            .iter()
            .filter(|r| r.timestamp > since)
            .cloned()
            .collect())
    }

    async fn get_recent_food_logs(&self, since: Timestamp) -> Result<Vec<FoodLogRecord>, StoreError> {
        self.ensure_available().await?;
        let logs = self.logs.read().await;
        Ok(logs
            .food_logs
            .iter()
            .filter(|r| r.timestamp > since)
            .cloned()
            .collect())
    }

    async fn last_activity(&self) -> Result<Option<Timestamp>, StoreError> {
        self.ensure_available().await?;
        let logs = self.logs.read().await;
        Ok(logs
            .checkins
            .iter()
            .map(|c| c.timestamp)
            .chain(logs.diary_entries.iter().map(|d| d.timestamp))
            .chain(logs.activity_hint)
            .max())
    }
}
