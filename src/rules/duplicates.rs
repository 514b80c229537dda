//! Near-duplicate detection over same-type blocks.
//!
//! Candidates come from the shared nearest-neighbor prefilter, so the rule
//! stays sub-quadratic. Pinned blocks are never reported as the duplicate
//! side; they may still be cited as the canonical target.

use crate::issue::{Severity, ValidationIssue};

use super::{RuleContext, RuleEvaluationError, RuleKind};

const RULE: RuleKind = RuleKind::Duplicate;

pub(crate) fn evaluate(
    ctx: &RuleContext<'_>,
) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
    let threshold = ctx.threshold_for(RULE)?;
    let candidates = ctx.candidates_for(RULE)?;
    let severity = ctx.severity_for(RULE, Severity::Warning);
    let blocks = ctx.block_by_id();
    let mut issues = Vec::new();

    for pair in candidates.pairs() {
        if pair.score < threshold {
            continue;
        }
        let (a, b) = match (blocks.get(pair.a.as_str()), blocks.get(pair.b.as_str())) {
            (Some(a), Some(b)) => (*a, *b),
            _ => continue,
        };
        if a.block_type != b.block_type {
            continue;
        }

        // The duplicate side must be unpinned; two pinned blocks are exempt.
        let (duplicate, canonical) = match (a.pinned, b.pinned) {
            (true, true) => continue,
            (true, false) => (b, a),
            (false, true) => (a, b),
            (false, false) => (b, a),
        };

        issues.push(
            ValidationIssue::new(
                RULE.id(),
                severity,
                format!(
                    "{} '{}' appears to duplicate '{}' (similarity {:.2})",
                    duplicate.block_type, duplicate.id, canonical.id, pair.score
                ),
                vec![pair.a.clone(), pair.b.clone()],
            )
            .with_suggestion(format!(
                "Merge '{}' into '{}' or mark one block legacy",
                duplicate.id, canonical.id
            )),
        );
    }

    Ok(issues)
}
