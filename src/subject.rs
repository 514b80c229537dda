//! Subject and bound extraction shared by the constraint and contradiction
//! rules.
//!
//! A bound is a quantitative claim about a measured subject, e.g.
//! `latency < 200ms`. Two bounds conflict when they name the same subject
//! and unit and no value can satisfy both.

use regex::Regex;

/// Comparison operator in a parsed bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

/// One parsed quantitative bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// Normalized subject key (lowercase, whitespace collapsed, leading
    /// articles stripped).
    pub subject: String,
    pub op: BoundOp,
    pub value: f64,
    /// Normalized unit, possibly empty.
    pub unit: String,
}

// Declared expressions are the whole string, so the subject may span words
// ("error rate <= 0.1%"). In free text the subject is the single token
// before the operator, which keeps prose ("keeps latency < 200ms") from
// leaking verbs into the subject key.
const EXPRESSION_PATTERN: &str =
    r"(?i)^([a-z][a-z0-9_.\- ]*?)\s*(<=|>=|==|=|<|>)\s*(-?\d+(?:\.\d+)?)\s*([a-z%/]*)$";
const FREE_TEXT_PATTERN: &str =
    r"(?i)\b([a-z][a-z0-9_.-]*)\s*(<=|>=|==|=|<|>)\s*(-?\d+(?:\.\d+)?)\s*([a-z%/]*)";

/// Parse a declared constraint expression. The whole expression must be a
/// single bound; anything else is unparseable and reported by the caller.
pub fn parse_expression(expr: &str) -> Option<Bound> {
    let re = Regex::new(EXPRESSION_PATTERN).unwrap();
    let captures = re.captures(expr.trim())?;
    bound_from_captures(&captures)
}

/// Scan free text for bound-shaped phrases. Used by the contradiction rule
/// on requirement and design content.
pub fn extract_bounds(text: &str) -> Vec<Bound> {
    Regex::new(FREE_TEXT_PATTERN)
        .unwrap()
        .captures_iter(text)
        .filter_map(|captures| bound_from_captures(&captures))
        .collect()
}

fn bound_from_captures(captures: &regex::Captures<'_>) -> Option<Bound> {
    let subject = normalize_subject(&captures[1]);
    if subject.is_empty() {
        return None;
    }
    let op = match &captures[2] {
        "<" => BoundOp::Lt,
        "<=" => BoundOp::Le,
        ">" => BoundOp::Gt,
        ">=" => BoundOp::Ge,
        "=" | "==" => BoundOp::Eq,
        _ => return None,
    };
    let value: f64 = captures[3].parse().ok()?;
    Some(Bound {
        subject,
        op,
        value,
        unit: captures[4].to_lowercase(),
    })
}

fn normalize_subject(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let mut start = 0;
    while start < words.len() {
        match words[start].to_lowercase().as_str() {
            "the" | "a" | "an" | "any" | "all" | "be" | "is" | "are" | "of" => start += 1,
            _ => break,
        }
    }
    words[start..].join(" ").to_lowercase()
}

impl Bound {
    /// Whether no value can satisfy both bounds. Bounds on different
    /// subjects or different units never conflict.
    pub fn conflicts_with(&self, other: &Bound) -> bool {
        if self.subject != other.subject || self.unit != other.unit {
            return false;
        }
        let (lo_a, hi_a) = self.interval();
        let (lo_b, hi_b) = other.interval();

        let lo = max_endpoint(lo_a, lo_b);
        let hi = min_endpoint(hi_a, hi_b);

        match lo.0.partial_cmp(&hi.0) {
            Some(std::cmp::Ordering::Greater) => true,
            Some(std::cmp::Ordering::Equal) => !(lo.1 && hi.1),
            _ => false,
        }
    }

    /// Satisfying interval as ((lo, lo_inclusive), (hi, hi_inclusive)).
    fn interval(&self) -> ((f64, bool), (f64, bool)) {
        match self.op {
            BoundOp::Lt => ((f64::NEG_INFINITY, false), (self.value, false)),
            BoundOp::Le => ((f64::NEG_INFINITY, false), (self.value, true)),
            BoundOp::Gt => ((self.value, false), (f64::INFINITY, false)),
            BoundOp::Ge => ((self.value, true), (f64::INFINITY, false)),
            BoundOp::Eq => ((self.value, true), (self.value, true)),
        }
    }
}

fn max_endpoint(a: (f64, bool), b: (f64, bool)) -> (f64, bool) {
    if a.0 > b.0 {
        a
    } else if b.0 > a.0 {
        b
    } else {
        // Same value: the stricter (exclusive) endpoint wins for a lower bound.
        (a.0, a.1 && b.1)
    }
}

fn min_endpoint(a: (f64, bool), b: (f64, bool)) -> (f64, bool) {
    if a.0 < b.0 {
        a
    } else if b.0 < a.0 {
        b
    } else {
        (a.0, a.1 && b.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(expr: &str) -> Bound {
        parse_expression(expr).unwrap()
    }

    #[test]
    fn test_parse_simple_expression() {
        let b = bound("latency < 200ms");
        assert_eq!(b.subject, "latency");
        assert_eq!(b.op, BoundOp::Lt);
        assert_eq!(b.value, 200.0);
        assert_eq!(b.unit, "ms");
    }

    #[test]
    fn test_parse_multiword_subject_and_articles() {
        let b = bound("The error rate <= 0.1%");
        assert_eq!(b.subject, "error rate");
        assert_eq!(b.op, BoundOp::Le);
        assert_eq!(b.unit, "%");
    }

    #[test]
    fn test_parse_rejects_non_bounds() {
        assert!(parse_expression("latency should be low").is_none());
        assert!(parse_expression("").is_none());
        assert!(parse_expression("latency < fast").is_none());
    }

    #[test]
    fn test_extract_bounds_from_free_text() {
        let bounds = extract_bounds(
            "The system keeps latency < 200ms under nominal load and memory <= 512mb at rest.",
        );
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].subject, "latency");
        assert_eq!(bounds[1].subject, "memory");
    }

    #[test]
    fn test_disjoint_intervals_conflict() {
        assert!(bound("latency < 200ms").conflicts_with(&bound("latency > 500ms")));
        assert!(bound("latency > 500ms").conflicts_with(&bound("latency < 200ms")));
    }

    #[test]
    fn test_touching_exclusive_endpoints_conflict() {
        // < 200 and > 200 share no value; <= 200 and >= 200 share exactly 200.
        assert!(bound("latency < 200ms").conflicts_with(&bound("latency > 200ms")));
        assert!(!bound("latency <= 200ms").conflicts_with(&bound("latency >= 200ms")));
    }

    #[test]
    fn test_equality_bounds() {
        assert!(bound("replicas = 3").conflicts_with(&bound("replicas = 5")));
        assert!(!bound("replicas = 3").conflicts_with(&bound("replicas <= 3")));
        assert!(bound("replicas = 3").conflicts_with(&bound("replicas > 3")));
    }

    #[test]
    fn test_different_subject_or_unit_never_conflicts() {
        assert!(!bound("latency < 200ms").conflicts_with(&bound("throughput > 500ms")));
        assert!(!bound("latency < 200ms").conflicts_with(&bound("latency > 500s")));
    }

    #[test]
    fn test_overlapping_bounds_do_not_conflict() {
        assert!(!bound("latency < 500ms").conflicts_with(&bound("latency > 200ms")));
    }
}
