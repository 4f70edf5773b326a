//! Behavioral records for the companion risk engine.
//!
//! The companion app keeps three append-only logs per user:
//!
//! - **Check-ins**: emotion, intensity, hunger type and binge risk
//! - **Diary entries**: free text tagged with an emotion
//! - **Food logs**: the meals eaten on a given day
//!
//! This crate owns the typed records, the [`RecordStore`] abstraction the
//! analysis reads from, and the ingestion of raw JSON exports where
//! malformed records are skipped instead of failing the whole load.
//!
//! # Example
//!
//! ```ignore
//! use care_records::{InMemoryRecordStore, RecordStore};
//!
//! let (store, summary) = InMemoryRecordStore::from_export_json(export)?;
//! let snapshot = store.snapshot(since).await?;
//! println!("{} records skipped", summary.skipped);
//! ```

pub mod ingest;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-export main types
pub use ingest::{IngestReport, RecordError, SkippedRecord};
pub use snapshot::RecordSnapshot;
pub use store::{ImportSummary, InMemoryRecordStore, RecordStore, StoreError};
pub use types::*;
