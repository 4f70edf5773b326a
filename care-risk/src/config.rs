//! Configuration for risk analysis.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::RiskError;

/// Default crisis-language markers (Spanish, the app's language).
pub const DEFAULT_CONCERNING_PHRASES: &[&str] = &[
    "no puedo más",
    "quiero desaparecer",
    "no vale la pena",
    "odio mi cuerpo",
    "no como",
    "me siento gorda",
    "me siento gordo",
    "no quiero vivir",
    "me doy asco",
];

/// Configuration for risk analysis and monitoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Analyzer configuration
    pub analyzer: AnalyzerConfig,
    /// Language configuration
    pub language: LanguageConfig,
    /// Monitor configuration
    pub monitor: MonitorConfig,
}

impl RiskConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Load config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading risk config from {}", path.display()))?;
        let config = Self::from_yaml(&yaml)
            .with_context(|| format!("parsing risk config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the analysis cannot run with.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.analyzer.window_days == 0 {
            return Err(RiskError::Config(
                "analyzer.window_days must be at least 1".to_string(),
            ));
        }
        if self.analyzer.concerning_language
            && self
                .language
                .concerning_phrases
                .iter()
                .all(|p| p.trim().is_empty())
        {
            return Err(RiskError::Config(
                "concerning language detection enabled with no phrases".to_string(),
            ));
        }
        Ok(())
    }
}

/// Analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Trailing analysis window (days)
    pub window_days: u32,
    /// Enable the emotional distress detector
    pub emotional_distress: bool,
    /// Enable the restrictive eating detector
    pub restrictive_eating: bool,
    /// Enable the inactivity detector
    pub inactivity: bool,
    /// Enable the concerning language detector
    pub concerning_language: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            emotional_distress: true,
            restrictive_eating: true,
            inactivity: true,
            concerning_language: true,
        }
    }
}

/// Language configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Phrases matched case-insensitively against diary text
    pub concerning_phrases: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            concerning_phrases: DEFAULT_CONCERNING_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum runs kept in history
    pub history_size: usize,
    /// Call `notify_critical` on sinks for critical alerts
    pub notify_on_critical: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_size: 100,
            notify_on_critical: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RiskConfig::default();
        assert_eq!(config.analyzer.window_days, 7);
        assert!(config.analyzer.inactivity);
        assert_eq!(config.monitor.history_size, 100);
        assert!(config.monitor.notify_on_critical);
        assert!(config
            .language
            .concerning_phrases
            .iter()
            .any(|p| p == "odio mi cuerpo"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = RiskConfig::default();
        config.monitor.history_size = 10;
        let yaml = config.to_yaml().unwrap();
        let parsed = RiskConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.monitor.history_size, 10);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
language:
  concerning_phrases:
    - "i can't go on"
analyzer:
  inactivity: false
# unknown sections are ignored
general:
  log_level: debug
"#;
        let config = RiskConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.language.concerning_phrases, vec!["i can't go on"]);
        assert!(!config.analyzer.inactivity);
        assert_eq!(config.analyzer.window_days, 7);
        assert_eq!(config.monitor.history_size, 100);
    }

    #[test]
    fn test_validate() {
        assert!(RiskConfig::default().validate().is_ok());

        let mut config = RiskConfig::default();
        config.analyzer.window_days = 0;
        assert!(matches!(config.validate(), Err(RiskError::Config(_))));

        let mut config = RiskConfig::default();
        config.language.concerning_phrases = vec![" ".to_string()];
        assert!(config.validate().is_err());
        config.analyzer.concerning_language = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RiskConfig::load("/nonexistent/risk.yaml").unwrap_err();
        assert!(err.to_string().contains("reading risk config"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("risk-config-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "monitor:\n  notify_on_critical: false\n").unwrap();

        let config = RiskConfig::load(&path).unwrap();
        assert!(!config.monitor.notify_on_critical);

        std::fs::remove_file(&path).unwrap();
    }
}
