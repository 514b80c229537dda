//! Acceptance-criteria checks for requirement blocks.
//!
//! A usable criterion pairs a condition with an outcome ("when X then Y").
//! Criteria that never do are flagged with a remediation hint.

use regex::Regex;

use crate::block::SpecType;
use crate::issue::{Severity, ValidationIssue};

use super::{RuleContext, RuleEvaluationError, RuleKind};

const RULE: RuleKind = RuleKind::AcceptanceCriteria;

/// Condition keyword followed by an outcome keyword somewhere after it.
const SHAPE_PATTERN: &str = r"(?i)\b(when|if|given)\b.+\b(then|should|must|shall)\b";

pub(crate) fn evaluate(
    ctx: &RuleContext<'_>,
) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
    let shape = Regex::new(SHAPE_PATTERN).unwrap();
    let severity = ctx.severity_for(RULE, Severity::Warning);
    let mut issues = Vec::new();

    for block in ctx.blocks {
        if block.block_type != SpecType::Requirement {
            continue;
        }

        if !block.has_acceptance_criteria() {
            issues.push(
                ValidationIssue::new(
                    RULE.id(),
                    severity,
                    format!("requirement '{}' has no acceptance criteria", block.id),
                    vec![block.id.clone()],
                )
                .with_suggestion(
                    "Add at least one criterion in condition/outcome form, e.g. \
                     'when a user logs in then a session is created'",
                ),
            );
            continue;
        }

        let criteria = block.acceptance_criteria.as_deref().unwrap_or(&[]);
        if !criteria.iter().any(|c| shape.is_match(c)) {
            issues.push(
                ValidationIssue::new(
                    RULE.id(),
                    severity,
                    format!(
                        "requirement '{}' has acceptance criteria without a \
                         condition/outcome pair",
                        block.id
                    ),
                    vec![block.id.clone()],
                )
                .with_suggestion("Rephrase at least one criterion as 'when X then Y'"),
            );
        }
    }

    Ok(issues)
}
