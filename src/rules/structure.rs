//! Structural checks: type-specific required fields per block.

use std::collections::HashSet;

use crate::block::SpecType;
use crate::issue::{Severity, ValidationIssue};

use super::{RuleContext, RuleEvaluationError, RuleKind};

const RULE: RuleKind = RuleKind::Structure;

pub(crate) fn evaluate(
    ctx: &RuleContext<'_>,
) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
    let known_ids: HashSet<&str> = ctx.blocks.iter().map(|b| b.id.as_str()).collect();
    let mut issues = Vec::new();

    for block in ctx.blocks {
        if block.block_type == SpecType::Unknown {
            issues.push(ValidationIssue::new(
                RULE.id(),
                ctx.severity_for(RULE, Severity::Error),
                format!("block '{}' has an unknown type", block.id),
                vec![block.id.clone()],
            ));
            continue;
        }

        if block.content.trim().is_empty() {
            issues.push(ValidationIssue::new(
                RULE.id(),
                ctx.severity_for(RULE, Severity::Warning),
                format!("{} '{}' has empty content", block.block_type, block.id),
                vec![block.id.clone()],
            ));
        }

        match block.block_type {
            SpecType::Requirement if !block.has_acceptance_criteria() => {
                issues.push(
                    ValidationIssue::new(
                        RULE.id(),
                        ctx.severity_for(RULE, Severity::Warning),
                        format!("requirement '{}' has no acceptance criteria", block.id),
                        vec![block.id.clone()],
                    )
                    .with_suggestion("Add acceptance criteria describing verifiable outcomes"),
                );
            }
            SpecType::Constraint
                if block
                    .constraints
                    .as_ref()
                    .map_or(true, |c| c.iter().all(|e| e.trim().is_empty())) =>
            {
                issues.push(ValidationIssue::new(
                    RULE.id(),
                    ctx.severity_for(RULE, Severity::Warning),
                    format!("constraint '{}' declares no constraint expressions", block.id),
                    vec![block.id.clone()],
                ));
            }
            SpecType::Task => {
                let missing: Vec<&String> = block
                    .dependency_ids()
                    .iter()
                    .filter(|dep| !known_ids.contains(dep.as_str()))
                    .collect();
                if !missing.is_empty() {
                    issues.push(ValidationIssue::new(
                        RULE.id(),
                        ctx.severity_for(RULE, Severity::Warning),
                        format!(
                            "task '{}' depends on unknown blocks: {}",
                            block.id,
                            missing
                                .iter()
                                .map(|s| s.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                        vec![block.id.clone()],
                    ));
                }
            }
            _ => {}
        }
    }

    Ok(issues)
}
