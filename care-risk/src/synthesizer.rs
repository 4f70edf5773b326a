//! Alert synthesis.
//!
//! Maps the factor set of one run to at most one alert. Tiers are checked
//! in priority order:
//!
//! 1. any critical factor → crisis risk
//! 2. two or more high factors → intervention needed
//! 3. any factor → early warning
//! 4. otherwise no alert
//!
//! Alert ids combine the tier, the analysis time and a digest of the
//! source factor ids, so two runs at the same time with different
//! factor sets never share an id.

use care_records::snapshot::compute_hash;
use care_records::Timestamp;

use crate::types::{AlertKind, PredictiveAlert, RiskFactor, Severity, Urgency};

const CRISIS_CONFIDENCE: f64 = 0.92;
const INTERVENTION_CONFIDENCE: f64 = 0.78;
const EARLY_WARNING_CONFIDENCE: f64 = 0.65;
/// High factors needed for the intervention tier
const INTERVENTION_HIGH_COUNT: usize = 2;
/// Hex characters of the source digest kept in the id
const SOURCE_DIGEST_LEN: usize = 12;

/// Synthesize the alert for a factor set.
pub fn synthesize_alert(factors: &[RiskFactor], now: Timestamp) -> Option<PredictiveAlert> {
    let ids_with = |severity: Severity| -> Vec<String> {
        factors
            .iter()
            .filter(|f| f.severity == severity)
            .map(|f| f.id.clone())
            .collect()
    };

    let critical = ids_with(Severity::Critical);
    if !critical.is_empty() {
        return Some(alert(AlertKind::CrisisRisk, Urgency::Critical, CRISIS_CONFIDENCE, now, critical));
    }

    let high = ids_with(Severity::High);
    if high.len() >= INTERVENTION_HIGH_COUNT {
        return Some(alert(
            AlertKind::InterventionNeeded,
            Urgency::High,
            INTERVENTION_CONFIDENCE,
            now,
            high,
        ));
    }

    if !factors.is_empty() {
        let all = factors.iter().map(|f| f.id.clone()).collect();
        return Some(alert(
            AlertKind::EarlyWarning,
            Urgency::Medium,
            EARLY_WARNING_CONFIDENCE,
            now,
            all,
        ));
    }

    None
}

fn alert(
    kind: AlertKind,
    urgency: Urgency,
    confidence: f64,
    now: Timestamp,
    source_factor_ids: Vec<String>,
) -> PredictiveAlert {
    PredictiveAlert {
        id: alert_id(kind, now, &source_factor_ids),
        kind,
        confidence,
        urgency,
        timestamp: now,
        source_factor_ids,
    }
}

/// Deterministic alert id: `alert-<kind>-<now millis>-<source digest>`.
pub fn alert_id(kind: AlertKind, now: Timestamp, source_factor_ids: &[String]) -> String {
    let mut sources: Vec<&str> = source_factor_ids.iter().map(String::as_str).collect();
    sources.sort_unstable();
    let digest = compute_hash(sources.join("\n").as_bytes());
    format!(
        "alert-{}-{}-{}",
        kind.as_str(),
        now.timestamp_millis(),
        &digest[..SOURCE_DIGEST_LEN]
    )
}
