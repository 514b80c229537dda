//! Validation rules: a closed set of analyzers over a spec block corpus.
//!
//! Each rule is a pure function from the immutable block snapshot to a list
//! of issues. Malformed block content is always reported as an issue;
//! [`RuleEvaluationError`] is reserved for violated rule preconditions
//! (e.g. a malformed threshold reaching the rule despite config validation)
//! and aborts the whole run.

pub mod acceptance_criteria;
pub mod constraints;
pub mod contradiction;
pub mod duplicates;
pub mod structure;
pub mod timeline;

use std::collections::HashMap;
use std::fmt;

use crate::block::SpecBlock;
use crate::config::ValidationConfig;
use crate::issue::{Severity, ValidationIssue};
use crate::similarity::CandidateIndex;

/// The closed set of validation rules. New rules extend this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Structure,
    AcceptanceCriteria,
    Constraint,
    Duplicate,
    Contradiction,
    Timeline,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::Structure,
        RuleKind::AcceptanceCriteria,
        RuleKind::Constraint,
        RuleKind::Duplicate,
        RuleKind::Contradiction,
        RuleKind::Timeline,
    ];

    /// Stable identifier used in configuration and reported issues.
    pub fn id(&self) -> &'static str {
        match self {
            RuleKind::Structure => "structure",
            RuleKind::AcceptanceCriteria => "acceptance_criteria",
            RuleKind::Constraint => "constraint",
            RuleKind::Duplicate => "duplicate",
            RuleKind::Contradiction => "contradiction",
            RuleKind::Timeline => "timeline",
        }
    }

    pub fn parse(name: &str) -> Option<RuleKind> {
        RuleKind::ALL.into_iter().find(|kind| kind.id() == name)
    }

    /// Default similarity threshold. The contradiction default is
    /// deliberately lower than the duplicate default: contradicting
    /// statements need not be near-duplicates.
    pub fn default_threshold(&self) -> f32 {
        match self {
            RuleKind::Duplicate => 0.90,
            RuleKind::Contradiction => 0.60,
            _ => 0.0,
        }
    }

    /// Whether this rule consumes the shared nearest-neighbor prefilter.
    pub fn needs_candidates(&self) -> bool {
        matches!(self, RuleKind::Duplicate | RuleKind::Contradiction)
    }

    pub fn evaluate(
        &self,
        ctx: &RuleContext<'_>,
    ) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
        match self {
            RuleKind::Structure => structure::evaluate(ctx),
            RuleKind::AcceptanceCriteria => acceptance_criteria::evaluate(ctx),
            RuleKind::Constraint => constraints::evaluate(ctx),
            RuleKind::Duplicate => duplicates::evaluate(ctx),
            RuleKind::Contradiction => contradiction::evaluate(ctx),
            RuleKind::Timeline => timeline::evaluate(ctx),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A rule's own precondition was violated. Fatal to the run; never used for
/// malformed block content.
#[derive(Debug)]
pub struct RuleEvaluationError {
    pub rule: &'static str,
    pub message: String,
}

impl RuleEvaluationError {
    fn new(rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            rule: rule.id(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RuleEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}' failed to evaluate: {}", self.rule, self.message)
    }
}

impl std::error::Error for RuleEvaluationError {}

/// Shared, immutable inputs for one validation run.
pub struct RuleContext<'a> {
    pub blocks: &'a [SpecBlock],
    pub config: &'a ValidationConfig,
    /// Candidate pairs from the nearest-neighbor prefilter; built once per
    /// run and only when a similarity-based rule is enabled.
    pub candidates: Option<&'a CandidateIndex>,
}

impl<'a> RuleContext<'a> {
    pub fn block_by_id(&self) -> HashMap<&'a str, &'a SpecBlock> {
        self.blocks.iter().map(|b| (b.id.as_str(), b)).collect()
    }

    /// Effective severity for a rule: config override or the given default.
    pub fn severity_for(&self, kind: RuleKind, default: Severity) -> Severity {
        self.config.rule(kind).severity.unwrap_or(default)
    }

    /// The shared prefilter; its absence is a precondition violation for the
    /// similarity-based rules.
    fn candidates_for(&self, kind: RuleKind) -> Result<&'a CandidateIndex, RuleEvaluationError> {
        self.candidates.ok_or_else(|| {
            RuleEvaluationError::new(kind, "candidate prefilter was not built for this run")
        })
    }

    /// Validated similarity threshold for a rule.
    fn threshold_for(&self, kind: RuleKind) -> Result<f32, RuleEvaluationError> {
        let threshold = self.config.rule(kind).threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(RuleEvaluationError::new(
                kind,
                format!("similarity threshold {} is outside [0, 1]", threshold),
            ));
        }
        Ok(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ids_round_trip() {
        for kind in RuleKind::ALL {
            assert_eq!(RuleKind::parse(kind.id()), Some(kind));
        }
        assert_eq!(RuleKind::parse("nonsense"), None);
    }

    #[test]
    fn test_only_similarity_rules_need_candidates() {
        let needing: Vec<RuleKind> = RuleKind::ALL
            .into_iter()
            .filter(|k| k.needs_candidates())
            .collect();
        assert_eq!(needing, vec![RuleKind::Duplicate, RuleKind::Contradiction]);
    }

    #[test]
    fn test_missing_candidates_is_a_precondition_error() {
        let config = ValidationConfig::default();
        let ctx = RuleContext {
            blocks: &[],
            config: &config,
            candidates: None,
        };
        let err = ctx.candidates_for(RuleKind::Duplicate).unwrap_err();
        assert_eq!(err.rule, "duplicate");
    }
}
