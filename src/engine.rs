//! Validation engine: orchestrates rule execution and aggregates issues.
//!
//! Rules are stateless and read the same immutable block snapshot, so they
//! run in parallel with no shared mutable state; results are merged in a
//! single aggregation step afterwards. The nearest-neighbor prefilter is
//! built once per run and shared by every rule that consumes it.

use rayon::prelude::*;
use std::fmt;

use crate::block::SpecBlock;
use crate::config::{ConfigurationError, ValidationConfig};
use crate::issue::{ValidationIssue, ValidationResult};
use crate::rules::{RuleContext, RuleEvaluationError, RuleKind};
use crate::similarity::{CandidateIndex, SimilarityProvider};

/// A validation run failed before producing a result. No partial result is
/// ever returned: a misconfigured rule invalidates the aggregate counts.
#[derive(Debug)]
pub enum EngineError {
    Configuration(ConfigurationError),
    Rule(RuleEvaluationError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Configuration(e) => write!(f, "{}", e),
            EngineError::Rule(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Configuration(e) => Some(e),
            EngineError::Rule(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for EngineError {
    fn from(e: ConfigurationError) -> Self {
        EngineError::Configuration(e)
    }
}

impl From<RuleEvaluationError> for EngineError {
    fn from(e: RuleEvaluationError) -> Self {
        EngineError::Rule(e)
    }
}

/// Runs the enabled rules over a block snapshot and merges their issues
/// into one deterministic [`ValidationResult`].
pub struct ValidationEngine {
    config: ValidationConfig,
    provider: Box<dyn SimilarityProvider>,
}

impl ValidationEngine {
    /// Construct an engine. The configuration is re-validated here so
    /// programmatically built configs get the same checks as loaded ones.
    pub fn new(
        config: ValidationConfig,
        provider: Box<dyn SimilarityProvider>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config, provider })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a corpus snapshot. The input is never mutated; repeated
    /// runs over the same input (with a deterministic provider) produce
    /// identical results.
    pub fn validate(&self, blocks: &[SpecBlock]) -> Result<ValidationResult, EngineError> {
        let enabled = self.config.enabled_rules();

        // Built once and shared: running the prefilter per rule would waste
        // work and can disagree with itself if the index is being rebuilt.
        let candidates: Option<CandidateIndex> =
            if enabled.iter().any(|rule| rule.needs_candidates()) {
                Some(CandidateIndex::build(
                    blocks,
                    self.provider.as_ref(),
                    self.config.prefilter_k,
                ))
            } else {
                None
            };

        let ctx = RuleContext {
            blocks,
            config: &self.config,
            candidates: candidates.as_ref(),
        };

        let per_rule: Result<Vec<Vec<ValidationIssue>>, RuleEvaluationError> = enabled
            .par_iter()
            .map(|rule: &RuleKind| rule.evaluate(&ctx))
            .collect();

        let issues: Vec<ValidationIssue> = per_rule?.into_iter().flatten().collect();
        Ok(ValidationResult::build(issues, self.config.fail_on))
    }
}
