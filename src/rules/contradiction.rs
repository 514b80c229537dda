//! Contradiction detection across requirement and design blocks.
//!
//! Uses the same prefilter as the duplicate rule but a lower similarity
//! threshold: contradicting statements are about the same thing without
//! being near-duplicates. A candidate pair is reported when it shows a
//! modal-polarity conflict ("must" vs "must not") or incompatible
//! quantitative bounds on a shared subject.

use regex::Regex;

use crate::block::{SpecBlock, SpecType};
use crate::issue::{Severity, ValidationIssue};
use crate::subject::extract_bounds;

use super::{RuleContext, RuleEvaluationError, RuleKind};

const RULE: RuleKind = RuleKind::Contradiction;

/// (positive form, negated form) keyword pairs checked for polarity conflict.
const MODAL_PAIRS: [(&str, &str); 5] = [
    ("must", "must not"),
    ("shall", "shall not"),
    ("should", "should not"),
    ("will", "will not"),
    ("always", "never"),
];

pub(crate) fn evaluate(
    ctx: &RuleContext<'_>,
) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
    let threshold = ctx.threshold_for(RULE)?;
    let candidates = ctx.candidates_for(RULE)?;
    let severity = ctx.severity_for(RULE, Severity::Error);
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
        if !in_scope(a) || !in_scope(b) {
            continue;
        }

        let reason = match modal_conflict(&a.content, &b.content) {
            Some(reason) => Some(reason),
            None => bound_conflict(a, b),
        };

        if let Some(reason) = reason {
            issues.push(
                ValidationIssue::new(
                    RULE.id(),
                    severity,
                    format!(
                        "'{}' and '{}' appear to contradict each other: {}",
                        pair.a, pair.b, reason
                    ),
                    vec![pair.a.clone(), pair.b.clone()],
                )
                .with_suggestion("Reconcile the two statements or mark one block legacy"),
            );
        }
    }

    Ok(issues)
}

fn in_scope(block: &SpecBlock) -> bool {
    matches!(block.block_type, SpecType::Requirement | SpecType::Design)
}

/// Detect opposite modal polarity between two texts, e.g. one says "must"
/// and the other "must not".
fn modal_conflict(a: &str, b: &str) -> Option<String> {
    for (positive, negated) in MODAL_PAIRS {
        let negated_re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(negated))).unwrap();
        // The positive form must not itself be part of the negated phrase.
        let positive_re = Regex::new(&format!(
            r"(?i)\b{}\b(?:\s+(\w+))?",
            regex::escape(positive)
        ))
        .unwrap();

        let positive_in = |text: &str| {
            positive_re.captures_iter(text).any(|caps| {
                caps.get(1)
                    .map_or(true, |next| !next.as_str().eq_ignore_ascii_case("not"))
            })
        };

        let forward = positive_in(a) && negated_re.is_match(b);
        let backward = positive_in(b) && negated_re.is_match(a);
        if forward || backward {
            return Some(format!("'{}' conflicts with '{}'", positive, negated));
        }
    }
    None
}

/// Detect incompatible quantitative bounds on a shared subject.
fn bound_conflict(a: &SpecBlock, b: &SpecBlock) -> Option<String> {
    let bounds_a = extract_bounds(&a.content);
    let bounds_b = extract_bounds(&b.content);
    for bound_a in &bounds_a {
        for bound_b in &bounds_b {
            if bound_a.conflicts_with(bound_b) {
                return Some(format!(
                    "incompatible bounds on '{}'",
                    bound_a.subject
                ));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::similarity::{CandidateIndex, JaccardProvider};

    fn requirement(id: &str, content: &str) -> SpecBlock {
        SpecBlock::new(id, SpecType::Requirement, content)
    }

    fn run(blocks: &[SpecBlock]) -> Vec<ValidationIssue> {
        let config = ValidationConfig::default();
        let provider = JaccardProvider::new(blocks);
        let index = CandidateIndex::build(blocks, &provider, config.prefilter_k);
        let ctx = RuleContext {
            blocks,
            config: &config,
            candidates: Some(&index),
        };
        evaluate(&ctx).unwrap()
    }

    #[test]
    fn test_modal_conflict_detected() {
        let blocks = vec![
            requirement("r-1", "the service must log every request payload"),
            requirement("r-2", "the service must not log request payload"),
        ];
        let issues = run(&blocks);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].blocks, vec!["r-1", "r-2"]);
        assert!(issues[0].message.contains("must"));
    }

    #[test]
    fn test_always_never_conflict_detected() {
        let blocks = vec![
            requirement("r-1", "uploads are always scanned for malware before storage"),
            requirement("r-2", "uploads are never scanned for malware before storage"),
        ];
        let issues = run(&blocks);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_bound_conflict_detected() {
        let blocks = vec![
            requirement("r-1", "response latency < 200ms for the search endpoint queries"),
            requirement("r-2", "response latency > 500ms acceptable for the search endpoint queries"),
        ];
        let issues = run(&blocks);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("latency"));
    }

    #[test]
    fn test_agreeing_statements_not_reported() {
        let blocks = vec![
            requirement("r-1", "the exporter must compress archives before upload"),
            requirement("r-2", "the exporter must compress archives before any upload"),
        ];
        assert!(run(&blocks).is_empty());
    }

    #[test]
    fn test_constraint_blocks_out_of_scope() {
        let mut a = SpecBlock::new("c-1", SpecType::Constraint, "the job must run nightly always");
        a.constraints = Some(vec!["runtime < 60s".to_string()]);
        let mut b = SpecBlock::new("c-2", SpecType::Constraint, "the job must not run nightly");
        b.constraints = Some(vec!["runtime > 300s".to_string()]);
        assert!(run(&[a, b]).is_empty());
    }

    #[test]
    fn test_dissimilar_texts_below_threshold_not_compared() {
        let blocks = vec![
            requirement("r-1", "invoices must include tax identifiers"),
            requirement("r-2", "the dashboard must not autoplay media widgets"),
        ];
        assert!(run(&blocks).is_empty());
    }
}
