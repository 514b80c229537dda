//! # Specward - Validation and Governance for Spec Corpora
//!
//! Specward keeps a corpus of machine-readable spec blocks internally
//! consistent. It runs a configurable set of validation rules over a block
//! snapshot and guards lifecycle changes behind an audited state machine.
//!
//! ## Overview
//!
//! Blocks arrive from an upstream document parser as typed units
//! (requirements, designs, tasks, constraints). The validation engine checks
//! structure, acceptance criteria, constraint satisfiability, near-duplicate
//! text, contradictions, and task timelines, then folds the findings into a
//! deterministic pass/fail result. Status changes go through a governance
//! log that enforces a declarative transition table and records an
//! append-only audit trail.
//!
//! ## Core Concepts
//!
//! - **Blocks**: Typed spec units with optional structured fields
//! - **Rules**: Independent validators producing ranked issues
//! - **Similarity providers**: Pluggable nearest-neighbor backends for the
//!   duplicate and contradiction rules
//! - **Governance**: A transition table plus an audit trail for status changes
//!
//! ## Modules
//!
//! - [`block`] - Spec block model and corpus summary helpers
//! - [`config`] - Rule configuration, thresholds, and the failure gate
//! - [`engine`] - Rule orchestration and result aggregation
//! - [`governance`] - Lifecycle transitions and the audit log
//! - [`issue`] - Issues, severities, and the aggregated result
//! - [`rules`] - The individual validation rules
//! - [`similarity`] - Similarity providers and the candidate prefilter
//! - [`subject`] - Quantitative bound parsing shared by the rules
//!
//! ## Example
//!
//! ```no_run
//! use specward::block::{SpecBlock, SpecType};
//! use specward::config::ValidationConfig;
//! use specward::engine::ValidationEngine;
//! use specward::similarity::JaccardProvider;
//!
//! let blocks = vec![
//!     SpecBlock::new("req-001", SpecType::Requirement, "The API must paginate results."),
//! ];
//!
//! let config = ValidationConfig::default();
//! let provider = Box::new(JaccardProvider::new(&blocks));
//! let engine = ValidationEngine::new(config, provider).expect("valid config");
//!
//! let result = engine.validate(&blocks).expect("validation run");
//! if !result.passed {
//!     for issue in &result.issues {
//!         println!("[{}] {}", issue.rule, issue.message);
//!     }
//! }
//! ```

pub mod block;
pub mod config;
pub mod engine;
pub mod governance;
pub mod issue;
pub mod rules;
pub mod similarity;
pub mod subject;

/// Generate a UTC timestamp in ISO 8601 format: `YYYY-MM-DDTHH:MM:SSZ`
///
/// Uses `chrono::Utc::now()` so the timestamp is truly in UTC, not local
/// time with a misleading `Z` suffix.
pub fn utc_now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
