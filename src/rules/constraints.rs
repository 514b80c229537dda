//! Constraint checks: unparseable expressions and mutually unsatisfiable
//! bound pairs.
//!
//! Pairwise comparison is restricted to bounds sharing a subject/unit key,
//! so unrelated constraints are never compared.

use std::collections::{BTreeMap, BTreeSet};

use crate::block::SpecType;
use crate::issue::{Severity, ValidationIssue};
use crate::subject::{parse_expression, Bound};

use super::{RuleContext, RuleEvaluationError, RuleKind};

const RULE: RuleKind = RuleKind::Constraint;

pub(crate) fn evaluate(
    ctx: &RuleContext<'_>,
) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
    let severity = ctx.severity_for(RULE, Severity::Error);
    let mut issues = Vec::new();

    // (subject, unit) -> [(block id, raw expression, bound)]
    let mut by_subject: BTreeMap<(String, String), Vec<(String, String, Bound)>> = BTreeMap::new();

    for block in ctx.blocks {
        if block.block_type != SpecType::Constraint {
            continue;
        }
        for expr in block.constraints.as_deref().unwrap_or(&[]) {
            if expr.trim().is_empty() {
                continue;
            }
            match parse_expression(expr) {
                Some(bound) => {
                    by_subject
                        .entry((bound.subject.clone(), bound.unit.clone()))
                        .or_default()
                        .push((block.id.clone(), expr.trim().to_string(), bound));
                }
                None => {
                    issues.push(ValidationIssue::new(
                        RULE.id(),
                        severity,
                        format!(
                            "constraint '{}' has an unparseable expression: '{}'",
                            block.id,
                            expr.trim()
                        ),
                        vec![block.id.clone()],
                    ));
                }
            }
        }
    }

    // One issue per conflicting block pair and subject, not per bound pair.
    let mut reported: BTreeSet<(String, String, String)> = BTreeSet::new();

    for ((subject, _unit), entries) in &by_subject {
        for (i, (id_a, expr_a, bound_a)) in entries.iter().enumerate() {
            for (id_b, expr_b, bound_b) in &entries[i + 1..] {
                if id_a == id_b || !bound_a.conflicts_with(bound_b) {
                    continue;
                }
                let (lo, hi) = if id_a < id_b {
                    (id_a.clone(), id_b.clone())
                } else {
                    (id_b.clone(), id_a.clone())
                };
                if !reported.insert((lo.clone(), hi.clone(), subject.clone())) {
                    continue;
                }
                issues.push(ValidationIssue::new(
                    RULE.id(),
                    severity,
                    format!(
                        "constraints '{}' and '{}' are mutually unsatisfiable on '{}': \
                         '{}' vs '{}'",
                        lo, hi, subject, expr_a, expr_b
                    ),
                    vec![lo, hi],
                ));
            }
        }
    }

    Ok(issues)
}
