//! Spec block model and corpus summary helpers.
//!
//! Blocks are produced by an upstream document parser and consumed here as an
//! immutable snapshot; the only mutation this crate ever performs is a status
//! change authorized by the governance state machine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Block type, as classified by the upstream parser. Parsers hand over
/// anything they could not classify as `Unknown`; the structure rule reports
/// those blocks instead of failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecType {
    Requirement,
    Design,
    Task,
    Constraint,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecType::Requirement => write!(f, "requirement"),
            SpecType::Design => write!(f, "design"),
            SpecType::Task => write!(f, "task"),
            SpecType::Constraint => write!(f, "constraint"),
            SpecType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle status of a block. The governance transition table must be
/// total over every variant declared here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SpecStatus {
    #[default]
    Active,
    Legacy,
}

impl SpecStatus {
    /// All declared statuses, used to check transition-table totality.
    pub const ALL: [SpecStatus; 2] = [SpecStatus::Active, SpecStatus::Legacy];
}

impl fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecStatus::Active => write!(f, "active"),
            SpecStatus::Legacy => write!(f, "legacy"),
        }
    }
}

/// One parsed unit of specification text.
///
/// Structured fields are optional: when the parser could not extract a
/// well-formed value it leaves the field empty rather than erroring, and the
/// rules report on the absence instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecBlock {
    /// Stable identifier, unique within the corpus.
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: SpecType,
    #[serde(default)]
    pub status: SpecStatus,
    /// Free-text content of the block.
    #[serde(default)]
    pub content: String,
    /// Source document reference.
    #[serde(default)]
    pub source: String,
    /// Pinned blocks are exempt from duplicate suppression.
    #[serde(default)]
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    /// Declared constraint expressions, e.g. `latency < 200ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Identifiers of blocks this block depends on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
}

impl SpecBlock {
    /// Create a minimal block of the given type; structured fields start empty.
    pub fn new(id: &str, block_type: SpecType, content: &str) -> Self {
        Self {
            id: id.to_string(),
            block_type,
            status: SpecStatus::Active,
            content: content.to_string(),
            source: String::new(),
            pinned: false,
            acceptance_criteria: None,
            constraints: None,
            due_date: None,
            depends_on: None,
        }
    }

    pub fn has_acceptance_criteria(&self) -> bool {
        self.acceptance_criteria
            .as_ref()
            .map_or(false, |criteria| criteria.iter().any(|c| !c.trim().is_empty()))
    }

    pub fn dependency_ids(&self) -> &[String] {
        self.depends_on.as_deref().unwrap_or(&[])
    }
}

/// Corpus-level counts surfaced to reporting collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusCounts {
    pub total: usize,
    pub active: usize,
    pub legacy: usize,
    pub pinned: usize,
}

/// Filter blocks by status and/or type with AND logic.
pub fn filter_blocks<'a>(
    blocks: &'a [SpecBlock],
    status: Option<SpecStatus>,
    block_type: Option<SpecType>,
) -> Vec<&'a SpecBlock> {
    blocks
        .iter()
        .filter(|b| status.map_or(true, |s| b.status == s))
        .filter(|b| block_type.map_or(true, |t| b.block_type == t))
        .collect()
}

pub fn corpus_counts(blocks: &[SpecBlock]) -> CorpusCounts {
    CorpusCounts {
        total: blocks.len(),
        active: blocks.iter().filter(|b| b.status == SpecStatus::Active).count(),
        legacy: blocks.iter().filter(|b| b.status == SpecStatus::Legacy).count(),
        pinned: blocks.iter().filter(|b| b.pinned).count(),
    }
}

pub fn count_by_type(blocks: &[SpecBlock]) -> BTreeMap<SpecType, usize> {
    let mut counts = BTreeMap::new();
    for block in blocks {
        *counts.entry(block.block_type).or_insert(0) += 1;
    }
    counts
}

pub fn count_by_source(blocks: &[SpecBlock]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for block in blocks {
        *counts.entry(block.source.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn pinned_blocks(blocks: &[SpecBlock]) -> Vec<&SpecBlock> {
    blocks.iter().filter(|b| b.pinned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_yaml_round_trip() {
        let yaml = r#"
id: req-001
type: requirement
status: active
content: The service must respond within 200ms.
source: docs/perf.md
pinned: true
acceptance_criteria:
  - when load is nominal then p99 latency is under 200ms
"#;
        let block: SpecBlock = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(block.block_type, SpecType::Requirement);
        assert_eq!(block.status, SpecStatus::Active);
        assert!(block.pinned);
        assert!(block.has_acceptance_criteria());

        let round = serde_yaml::to_string(&block).unwrap();
        let back: SpecBlock = serde_yaml::from_str(&round).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_unclassified_type_maps_to_unknown() {
        let yaml = "id: x-1\ntype: epic\ncontent: something\n";
        let block: SpecBlock = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(block.block_type, SpecType::Unknown);
    }

    #[test]
    fn test_empty_criteria_do_not_count() {
        let mut block = SpecBlock::new("r-1", SpecType::Requirement, "text");
        assert!(!block.has_acceptance_criteria());
        block.acceptance_criteria = Some(vec!["  ".to_string()]);
        assert!(!block.has_acceptance_criteria());
        block.acceptance_criteria = Some(vec!["when x then y".to_string()]);
        assert!(block.has_acceptance_criteria());
    }

    #[test]
    fn test_filter_blocks_and_logic() {
        let mut legacy_task = SpecBlock::new("t-1", SpecType::Task, "a");
        legacy_task.status = SpecStatus::Legacy;
        let active_task = SpecBlock::new("t-2", SpecType::Task, "b");
        let active_req = SpecBlock::new("r-1", SpecType::Requirement, "c");
        let blocks = vec![legacy_task, active_task, active_req];

        let active = filter_blocks(&blocks, Some(SpecStatus::Active), None);
        assert_eq!(active.len(), 2);

        let active_tasks = filter_blocks(&blocks, Some(SpecStatus::Active), Some(SpecType::Task));
        assert_eq!(active_tasks.len(), 1);
        assert_eq!(active_tasks[0].id, "t-2");
    }

    #[test]
    fn test_corpus_counts() {
        let mut a = SpecBlock::new("a", SpecType::Requirement, "");
        a.pinned = true;
        let mut b = SpecBlock::new("b", SpecType::Design, "");
        b.status = SpecStatus::Legacy;
        let counts = corpus_counts(&[a, b]);
        assert_eq!(counts.total, 2);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.legacy, 1);
        assert_eq!(counts.pinned, 1);
    }

    #[test]
    fn test_count_by_type_and_source() {
        let mut a = SpecBlock::new("a", SpecType::Task, "");
        a.source = "docs/plan.md".to_string();
        let mut b = SpecBlock::new("b", SpecType::Task, "");
        b.source = "docs/plan.md".to_string();
        let blocks = vec![a, b];

        assert_eq!(count_by_type(&blocks)[&SpecType::Task], 2);
        assert_eq!(count_by_source(&blocks)["docs/plan.md"], 2);
    }
}
