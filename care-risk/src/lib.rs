//! Companion Risk Analysis
//!
//! Rule-based early warning for eating disorder relapse and emotional
//! crisis, computed from a user's recent check-ins, diary entries and
//! food logs:
//!
//! - **Detectors**: emotional distress, restrictive eating, inactivity,
//!   concerning language
//! - **Aggregation**: confidence-weighted severity score (0 - 100)
//! - **Alerts**: at most one tiered alert per run
//! - **Monitoring**: memoized evaluation, run history and alert sinks
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        RiskMonitor                         │
//! │                                                            │
//! │  ┌─────────────┐  ┌───────────┐  ┌────────────┐  ┌──────┐ │
//! │  │ RecordStore │──│ Detectors │──│ Aggregator │──│ Sink │ │
//! │  └─────────────┘  └───────────┘  │ Synthesizer│  └──────┘ │
//! │                                  └────────────┘            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use care_risk::{run_analysis, AlertKind};
//!
//! let report = run_analysis(&snapshot, now);
//! if report.is_critical() {
//!     notify_user(report.alert.as_ref());
//! }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod detectors;
pub mod history;
pub mod monitor;
pub mod sink;
pub mod synthesizer;
pub mod types;

// Re-export main types
pub use aggregator::risk_score;
pub use analyzer::{run_analysis, run_analysis_on_logs, RiskAnalyzer, RiskAnalyzerBuilder};
pub use config::RiskConfig;
pub use detectors::{DetectionWindow, RiskDetector};
pub use history::{RunHistory, RunRecord};
pub use monitor::{EvaluationOutcome, RiskMonitor, RiskMonitorBuilder, SinkFailure};
pub use sink::{AlertSink, InMemoryAlertSink, LoggingSink, StoredAlert};
pub use synthesizer::synthesize_alert;
pub use types::*;
