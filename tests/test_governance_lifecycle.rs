//! Lifecycle integration tests for the governance state machine.
//!
//! Drives full transition sequences through GovernanceLog and checks the
//! audit trail after each step.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use specward::block::{SpecBlock, SpecStatus, SpecType};
use specward::governance::{GovernanceLog, TransitionError, TransitionTable};

fn active_block(id: &str) -> SpecBlock {
    SpecBlock::new(id, SpecType::Requirement, "the api must paginate results")
}

#[test]
fn test_retire_then_reject_reopen() {
    let log = GovernanceLog::default();
    let mut block = active_block("req-001");

    let entry = log
        .request_transition(&mut block, SpecStatus::Legacy, "alice", Some("superseded"))
        .unwrap();
    assert_eq!(block.status, SpecStatus::Legacy);
    assert_eq!(entry.previous, SpecStatus::Active);
    assert_eq!(entry.new, SpecStatus::Legacy);

    // Legacy is terminal under the default table.
    let err = log
        .request_transition(&mut block, SpecStatus::Active, "alice", None)
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::InvalidTransition {
            from: SpecStatus::Legacy,
            to: SpecStatus::Active,
            ..
        }
    ));
    assert_eq!(block.status, SpecStatus::Legacy);
    assert_eq!(log.entries().len(), 1, "rejected transition must not be recorded");
}

#[test]
fn test_audit_trail_preserves_append_order() {
    let log = GovernanceLog::default();
    let mut first = active_block("req-001");
    let mut second = active_block("req-002");

    log.request_transition(&mut first, SpecStatus::Legacy, "alice", None)
        .unwrap();
    log.request_transition(&mut second, SpecStatus::Legacy, "bob", Some("merged"))
        .unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].block_id, "req-001");
    assert_eq!(entries[0].actor, "alice");
    assert_eq!(entries[1].block_id, "req-002");
    assert_eq!(entries[1].reason.as_deref(), Some("merged"));
    assert!(!entries[0].at.is_empty());
}

#[test]
fn test_custom_table_round_trip_lifecycle() {
    let mut allowed = BTreeMap::new();
    allowed.insert(SpecStatus::Active, vec![SpecStatus::Legacy]);
    allowed.insert(SpecStatus::Legacy, vec![SpecStatus::Active]);
    let log = GovernanceLog::new(TransitionTable::new(allowed).unwrap());

    let mut block = active_block("req-001");
    log.request_transition(&mut block, SpecStatus::Legacy, "alice", Some("superseded"))
        .unwrap();
    log.request_transition(&mut block, SpecStatus::Active, "bob", Some("revived"))
        .unwrap();

    assert_eq!(block.status, SpecStatus::Active);
    let history = log.entries_for("req-001");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].new, SpecStatus::Legacy);
    assert_eq!(history[1].new, SpecStatus::Active);
}

#[test]
fn test_concurrent_transitions_record_every_success() {
    // Distinct blocks transition concurrently; every success must land in
    // the shared audit trail exactly once.
    let log = Arc::new(GovernanceLog::default());
    let mut handles = Vec::new();

    for i in 0..8 {
        let log = Arc::clone(&log);
        handles.push(thread::spawn(move || {
            let mut block = active_block(&format!("req-{:03}", i));
            log.request_transition(&mut block, SpecStatus::Legacy, "worker", None)
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = log.entries();
    assert_eq!(entries.len(), 8);
    let mut ids: Vec<String> = entries.iter().map(|e| e.block_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[test]
fn test_validation_does_not_bypass_governance() {
    // A legacy block with defects is still reported by validation, but its
    // status never changes outside request_transition.
    use specward::config::ValidationConfig;
    use specward::engine::ValidationEngine;
    use specward::similarity::JaccardProvider;

    let mut block = active_block("req-001");
    let log = GovernanceLog::default();
    log.request_transition(&mut block, SpecStatus::Legacy, "alice", None)
        .unwrap();

    let blocks = vec![block];
    let engine = ValidationEngine::new(
        ValidationConfig::default(),
        Box::new(JaccardProvider::new(&blocks)),
    )
    .unwrap();
    engine.validate(&blocks).unwrap();

    assert_eq!(blocks[0].status, SpecStatus::Legacy);
    assert_eq!(log.entries().len(), 1);
}
