//! Issue and result types produced by validation runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Severity of a reported issue. Ordering is `Info < Warning < Error`,
/// which drives both result ranking and the pass/fail gate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One defect reported by a validation rule. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Identifier of the rule that produced this issue (e.g. `duplicate`).
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// Affected block identifiers, at least one, in canonical order.
    pub blocks: Vec<String>,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        rule: &str,
        severity: Severity,
        message: impl Into<String>,
        blocks: Vec<String>,
    ) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message: message.into(),
            blocks,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Identity used for deduplication: block ids are order-insensitive and
    /// suggestion text is advisory, so both are normalized out.
    fn dedupe_key(&self) -> (String, Severity, Vec<String>, String) {
        let mut blocks = self.blocks.clone();
        blocks.sort();
        (self.rule.clone(), self.severity, blocks, self.message.clone())
    }
}

/// Snapshot of one engine invocation: deterministically ordered issues plus
/// derived per-severity counts. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    /// True iff no issue at or above the configured gate severity exists.
    pub passed: bool,
}

impl ValidationResult {
    /// Merge raw rule output into a result: deduplicate issues identical in
    /// (rule, severity, blocks, message), sort by severity descending, then
    /// rule id, then first affected block id, and derive counts.
    pub(crate) fn build(issues: Vec<ValidationIssue>, gate: Severity) -> Self {
        let mut seen = BTreeSet::new();
        let mut issues: Vec<ValidationIssue> = issues
            .into_iter()
            .filter(|issue| seen.insert(issue.dedupe_key()))
            .collect();

        issues.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.rule.cmp(&b.rule))
                .then_with(|| a.blocks.cmp(&b.blocks))
                .then_with(|| a.message.cmp(&b.message))
        });

        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let warnings = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();
        let infos = issues.iter().filter(|i| i.severity == Severity::Info).count();
        let passed = !issues.iter().any(|i| i.severity >= gate);

        Self {
            issues,
            errors,
            warnings,
            infos,
            passed,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.errors,
            Severity::Warning => self.warnings,
            Severity::Info => self.infos,
        }
    }

    /// Export the snapshot for reporting collaborators.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
