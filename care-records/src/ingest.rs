//! Ingestion of raw JSON logs.
//!
//! The app persists each log as a JSON array. Individual entries may be
//! incomplete or hand-edited, so every entry is validated on its own: a
//! malformed entry is logged and skipped, the rest of the log still loads.
//! Only the timestamp and emotion decide whether a check-in is kept; bad
//! scale values fall back to defaults so the emotion still counts.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::types::{
    CheckInRecord, DiaryEntryRecord, Emotion, FoodLogRecord, HungerType, MealKind, MealRef,
    Timestamp,
};

const SCALE_MIN: i64 = 1;
const SCALE_MAX: i64 = 5;
/// Intensity used when a check-in carries none
const DEFAULT_INTENSITY: u8 = 3;
/// Binge risk used when a check-in carries none
const DEFAULT_BINGE_RISK: u8 = 1;

/// Reasons a raw record is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// Required field absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Timestamp present but not parseable
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Emotion present but not a string
    #[error("Invalid emotion: {0}")]
    InvalidEmotion(String),

    /// Entry does not have the expected shape
    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// A rejected entry and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Position of the entry in the source array
    pub index: usize,
    /// Rejection reason
    pub reason: RecordError,
}

/// Outcome of ingesting one log.
#[derive(Debug, Clone)]
pub struct IngestReport<T> {
    /// Records that passed validation, in source order
    pub records: Vec<T>,
    /// Entries that were skipped
    pub skipped: Vec<SkippedRecord>,
}

impl<T> IngestReport<T> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCheckIn {
    #[serde(alias = "date", alias = "createdAt")]
    timestamp: Option<Value>,
    emotion: Option<Value>,
    #[serde(alias = "emotion_intensity", alias = "intensity")]
    emotion_intensity: Option<Value>,
    #[serde(alias = "hunger_type")]
    hunger_type: Option<Value>,
    #[serde(alias = "binge_risk")]
    binge_risk: Option<Value>,
    notes: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDiaryEntry {
    #[serde(alias = "date", alias = "createdAt")]
    timestamp: Option<Value>,
    emotion: Option<Value>,
    #[serde(alias = "content")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFoodLog {
    #[serde(alias = "date", alias = "createdAt")]
    timestamp: Option<Value>,
    meals: Option<Vec<RawMeal>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMeal {
    Name(String),
    Entry {
        #[serde(alias = "food", alias = "description")]
        name: Option<String>,
        #[serde(alias = "type", alias = "mealType")]
        kind: Option<String>,
    },
}

impl TryFrom<RawCheckIn> for CheckInRecord {
    type Error = RecordError;

    fn try_from(raw: RawCheckIn) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(raw.timestamp)?;
        let emotion = parse_emotion(raw.emotion)?;
        Ok(Self {
            timestamp,
            emotion,
            emotion_intensity: parse_scale(
                "emotion_intensity",
                raw.emotion_intensity,
                DEFAULT_INTENSITY,
            ),
            hunger_type: raw
                .hunger_type
                .as_ref()
                .and_then(Value::as_str)
                .map(HungerType::parse)
                .unwrap_or_default(),
            binge_risk: parse_scale("binge_risk", raw.binge_risk, DEFAULT_BINGE_RISK),
            notes: raw
                .notes
                .as_ref()
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string),
        })
    }
}

impl TryFrom<RawDiaryEntry> for DiaryEntryRecord {
    type Error = RecordError;

    fn try_from(raw: RawDiaryEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: parse_timestamp(raw.timestamp)?,
            emotion: parse_emotion(raw.emotion)?,
            text: raw.text.ok_or(RecordError::MissingField("text"))?,
        })
    }
}

impl TryFrom<RawFoodLog> for FoodLogRecord {
    type Error = RecordError;

    fn try_from(raw: RawFoodLog) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(raw.timestamp)?;
        let meals = raw
            .meals
            .ok_or(RecordError::MissingField("meals"))?
            .into_iter()
            .map(|meal| match meal {
                RawMeal::Name(name) => MealRef::new(name, MealKind::Other),
                RawMeal::Entry { name, kind } => MealRef::new(
                    name.unwrap_or_default(),
                    kind.as_deref().map(MealKind::parse).unwrap_or_default(),
                ),
            })
            .collect();
        Ok(Self { timestamp, meals })
    }
}

/// Parse a check-in log.
pub fn parse_checkins(value: &Value) -> IngestReport<CheckInRecord> {
    parse_log::<RawCheckIn, CheckInRecord>("checkins", value)
}

/// Parse a diary log.
pub fn parse_diary_entries(value: &Value) -> IngestReport<DiaryEntryRecord> {
    parse_log::<RawDiaryEntry, DiaryEntryRecord>("diary", value)
}

/// Parse a food log.
pub fn parse_food_logs(value: &Value) -> IngestReport<FoodLogRecord> {
    parse_log::<RawFoodLog, FoodLogRecord>("food_logs", value)
}

fn parse_log<R, T>(log: &str, value: &Value) -> IngestReport<T>
where
    R: for<'de> Deserialize<'de>,
    T: TryFrom<R, Error = RecordError>,
{
    let mut report = IngestReport::empty();

    let Some(entries) = value.as_array() else {
        let reason = RecordError::Malformed("expected an array of records".to_string());
        warn!(log = %log, error = %reason, "Log is not an array, nothing ingested");
        report.skipped.push(SkippedRecord { index: 0, reason });
        return report;
    };

    for (index, entry) in entries.iter().enumerate() {
        let parsed = R::deserialize(entry)
            .map_err(|e| RecordError::Malformed(e.to_string()))
            .and_then(T::try_from);

        match parsed {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                warn!(log = %log, index = index, error = %reason, "Skipping malformed record");
                report.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    report
}

/// Parse a timestamp given as epoch milliseconds or an RFC 3339 string.
pub fn parse_timestamp_value(value: &Value) -> Result<Timestamp, RecordError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| RecordError::InvalidTimestamp(n.to_string())),
        Value::String(s) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                return Ok(parsed.with_timezone(&Utc));
            }
            s.trim()
                .parse::<i64>()
                .ok()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| RecordError::InvalidTimestamp(s.clone()))
        }
        other => Err(RecordError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_timestamp(value: Option<Value>) -> Result<Timestamp, RecordError> {
    match value {
        None | Some(Value::Null) => Err(RecordError::MissingField("timestamp")),
        Some(v) => parse_timestamp_value(&v),
    }
}

fn parse_emotion(value: Option<Value>) -> Result<Emotion, RecordError> {
    match value {
        None | Some(Value::Null) => Err(RecordError::MissingField("emotion")),
        Some(Value::String(s)) if s.trim().is_empty() => Err(RecordError::MissingField("emotion")),
        Some(Value::String(s)) => Ok(Emotion::parse(&s)),
        Some(other) => Err(RecordError::InvalidEmotion(other.to_string())),
    }
}

/// Read a 1 - 5 scale. Missing or unreadable values take `default`,
/// out-of-range numbers are clamped.
fn parse_scale(field: &'static str, value: Option<Value>, default: u8) -> u8 {
    let number = match &value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match number {
        Some(n) if (SCALE_MIN..=SCALE_MAX).contains(&n) => n as u8,
        Some(n) => {
            let clamped = n.clamp(SCALE_MIN, SCALE_MAX) as u8;
            warn!(field = field, value = n, clamped = clamped, "Scale out of range, clamping");
            clamped
        }
        None => {
            warn!(field = field, value = ?value, default = default, "Scale missing or unreadable, using default");
            default
        }
    }
}
