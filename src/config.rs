//! Rule configuration loading and validation.
//!
//! Configuration is a pure transform: `parse` either yields a fully
//! validated [`ValidationConfig`] or a [`ConfigurationError`]. Unknown rule
//! names and out-of-bounds thresholds are rejected at load time, never
//! silently ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::issue::Severity;
use crate::rules::RuleKind;

#[derive(Debug)]
pub enum ConfigurationError {
    UnknownRule(String),
    ThresholdOutOfRange { rule: String, value: f32 },
    InvalidPrefilter(usize),
    Parse(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownRule(name) => {
                write!(f, "unknown rule '{}' in configuration", name)
            }
            ConfigurationError::ThresholdOutOfRange { rule, value } => {
                write!(
                    f,
                    "similarity threshold for rule '{}' must be within [0, 1], got {}",
                    rule, value
                )
            }
            ConfigurationError::InvalidPrefilter(k) => {
                write!(f, "prefilter_k must be at least 1, got {}", k)
            }
            ConfigurationError::Parse(msg) => write!(f, "failed to parse configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Per-rule settings: enabled flag, severity override, and rule-specific
/// thresholds. Thresholds only apply to the similarity-based rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

fn default_enabled() -> bool {
    true
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            similarity_threshold: None,
        }
    }
}

/// Engine-wide configuration. The default enables all six rules with their
/// rule-specific default thresholds and gates the run on `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// The run fails when any issue at or above this severity is reported.
    #[serde(default)]
    pub fail_on: Severity,
    /// Nearest-neighbor fan-out used to build the candidate-pair prefilter.
    #[serde(default = "default_prefilter_k")]
    pub prefilter_k: usize,
    /// Per-rule overrides keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

fn default_prefilter_k() -> usize {
    8
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fail_on: Severity::Error,
            prefilter_k: default_prefilter_k(),
            rules: BTreeMap::new(),
        }
    }
}

/// Effective settings for one rule after defaults are applied.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRule {
    pub enabled: bool,
    pub severity: Option<Severity>,
    pub threshold: f32,
}

impl ValidationConfig {
    /// Parse a YAML configuration document and validate it.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let config: ValidationConfig =
            serde_yaml::from_str(raw).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Ok(Self::parse(&content)?)
    }

    /// Check rule names, threshold bounds, and prefilter fan-out.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.prefilter_k == 0 {
            return Err(ConfigurationError::InvalidPrefilter(self.prefilter_k));
        }

        for (name, rule) in &self.rules {
            if RuleKind::parse(name).is_none() {
                return Err(ConfigurationError::UnknownRule(name.clone()));
            }
            if let Some(threshold) = rule.similarity_threshold {
                if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                    return Err(ConfigurationError::ThresholdOutOfRange {
                        rule: name.clone(),
                        value: threshold,
                    });
                }
            }
        }

        Ok(())
    }

    /// Effective settings for a rule: configured values where present,
    /// rule-specific defaults otherwise.
    pub fn rule(&self, kind: RuleKind) -> ResolvedRule {
        let configured = self.rules.get(kind.id());
        ResolvedRule {
            enabled: configured.map_or(true, |r| r.enabled),
            severity: configured.and_then(|r| r.severity),
            threshold: configured
                .and_then(|r| r.similarity_threshold)
                .unwrap_or_else(|| kind.default_threshold()),
        }
    }

    /// Rules selected to run, in declaration order.
    pub fn enabled_rules(&self) -> Vec<RuleKind> {
        RuleKind::ALL
            .into_iter()
            .filter(|kind| self.rule(*kind).enabled)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_enables_all_rules() {
        let config = ValidationConfig::default();
        assert_eq!(config.enabled_rules().len(), 6);
        assert_eq!(config.fail_on, Severity::Error);
    }

    #[test]
    fn test_parse_applies_overrides() {
        let config = ValidationConfig::parse(
            r#"
fail_on: warning
rules:
  duplicate:
    similarity_threshold: 0.95
  acceptance_criteria:
    severity: info
  timeline:
    enabled: false
"#,
        )
        .unwrap();

        assert_eq!(config.fail_on, Severity::Warning);
        assert_eq!(config.rule(RuleKind::Duplicate).threshold, 0.95);
        assert_eq!(
            config.rule(RuleKind::AcceptanceCriteria).severity,
            Some(Severity::Info)
        );
        assert!(!config.rule(RuleKind::Timeline).enabled);
        assert_eq!(config.enabled_rules().len(), 5);
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let err = ValidationConfig::parse("rules:\n  telemetry:\n    enabled: true\n").unwrap_err();
        match err {
            ConfigurationError::UnknownRule(name) => assert_eq!(name, "telemetry"),
            other => panic!("Expected UnknownRule, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let err = ValidationConfig::parse(
            "rules:\n  contradiction:\n    similarity_threshold: 1.5\n",
        )
        .unwrap_err();
        match err {
            ConfigurationError::ThresholdOutOfRange { rule, .. } => {
                assert_eq!(rule, "contradiction")
            }
            other => panic!("Expected ThresholdOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_prefilter_rejected() {
        let err = ValidationConfig::parse("prefilter_k: 0\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPrefilter(0)));
    }

    #[test]
    fn test_contradiction_default_lower_than_duplicate() {
        let config = ValidationConfig::default();
        assert!(
            config.rule(RuleKind::Contradiction).threshold
                < config.rule(RuleKind::Duplicate).threshold
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "fail_on: error\nrules:\n  duplicate:\n    enabled: false").unwrap();

        let config = ValidationConfig::load(file.path()).unwrap();
        assert!(!config.rule(RuleKind::Duplicate).enabled);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ValidationConfig::load(Path::new("/nonexistent/specward.yaml")).is_err());
    }
}
