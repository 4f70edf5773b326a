//! Concerning language detection.
//!
//! Scans diary text for crisis-language markers. The phrase list is
//! configurable so it can follow the user's language.

use tracing::debug;

use crate::config::DEFAULT_CONCERNING_PHRASES;
use crate::detectors::{DetectionWindow, RiskDetector};
use crate::types::{RiskCategory, RiskFactor, Severity, Trend};

const FACTOR_ID: &str = "concerning-language";
/// Matching entries above which the factor is critical
const CRITICAL_MATCHES: usize = 2;
const CONFIDENCE: f64 = 0.82;

const RECOMMENDATIONS: &[&str] = &[
    "Talk to someone you trust about how you are feeling",
    "Contact your therapist or a crisis line if these thoughts persist",
    "Try a self-compassion exercise",
];

/// Detector for crisis phrases in diary entries.
pub struct ConcerningLanguageDetector {
    /// Lowercased phrases
    phrases: Vec<String>,
}

impl ConcerningLanguageDetector {
    /// Create a detector with the default phrase list.
    pub fn new() -> Self {
        Self::with_phrases(DEFAULT_CONCERNING_PHRASES.iter().map(|p| p.to_string()))
    }

    /// Create with a custom phrase list. Blank phrases are ignored.
    pub fn with_phrases(phrases: impl IntoIterator<Item = String>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Add a phrase.
    pub fn add_phrase(&mut self, phrase: &str) {
        let phrase = phrase.trim().to_lowercase();
        if !phrase.is_empty() {
            self.phrases.push(phrase);
        }
    }

    /// Phrases found in `text`.
    fn matched_phrases<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let lower = text.to_lowercase();
        self.phrases
            .iter()
            .filter(|p| lower.contains(p.as_str()))
            .map(|p| p.as_str())
            .collect()
    }
}

impl Default for ConcerningLanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskDetector for ConcerningLanguageDetector {
    fn id(&self) -> &'static str {
        FACTOR_ID
    }

    fn detect(&self, window: &DetectionWindow<'_>) -> Option<RiskFactor> {
        // One match per entry, however many phrases it contains.
        let mut match_count = 0usize;
        for entry in &window.diary_entries {
            let matched = self.matched_phrases(&entry.text);
            if !matched.is_empty() {
                debug!(
                    phrases = ?matched,
                    written_at = %entry.timestamp,
                    "Concerning phrase found in diary entry"
                );
                match_count += 1;
            }
        }

        if match_count == 0 {
            return None;
        }

        let severity = if match_count > CRITICAL_MATCHES {
            Severity::Critical
        } else {
            Severity::High
        };

        Some(
            RiskFactor::new(FACTOR_ID, RiskCategory::Emotional, severity, CONFIDENCE, window.now)
                .with_description(format!(
                    "{} recent diary {} contain concerning language",
                    match_count,
                    if match_count == 1 { "entry" } else { "entries" }
                ))
                .with_trend(Trend::Stable)
                .with_recommendations(RECOMMENDATIONS),
        )
    }
}
