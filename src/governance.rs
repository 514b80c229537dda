//! Lifecycle governance: a declarative transition table, per-block atomic
//! status changes, and an append-only audit trail.
//!
//! Every status change goes through [`GovernanceLog::request_transition`].
//! A transition either mutates the block and appends exactly one audit
//! entry, or does neither.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::block::{SpecBlock, SpecStatus};
use crate::utc_now_iso;

/// Declarative map of which status changes are legal. The table is total:
/// every status has an entry, possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionTable {
    allowed: BTreeMap<SpecStatus, Vec<SpecStatus>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        let mut allowed = BTreeMap::new();
        allowed.insert(SpecStatus::Active, vec![SpecStatus::Legacy]);
        allowed.insert(SpecStatus::Legacy, vec![]);
        TransitionTable { allowed }
    }
}

impl TransitionTable {
    /// Build a table from explicit entries. Fails when any status is
    /// missing an entry, so lookups never need a fallback.
    pub fn new(allowed: BTreeMap<SpecStatus, Vec<SpecStatus>>) -> Result<Self> {
        for status in SpecStatus::ALL {
            if !allowed.contains_key(&status) {
                bail!("transition table has no entry for status '{}'", status);
            }
        }
        Ok(TransitionTable { allowed })
    }

    pub fn allows(&self, from: SpecStatus, to: SpecStatus) -> bool {
        self.allowed
            .get(&from)
            .map_or(false, |targets| targets.contains(&to))
    }

    pub fn allowed_from(&self, from: SpecStatus) -> &[SpecStatus] {
        self.allowed
            .get(&from)
            .map(|targets| targets.as_slice())
            .unwrap_or(&[])
    }

    /// A terminal status permits no outgoing transitions.
    pub fn is_terminal(&self, status: SpecStatus) -> bool {
        self.allowed_from(status).is_empty()
    }
}

/// One recorded status change. Entries are append-only; nothing in the
/// crate removes or rewrites them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub block_id: String,
    pub previous: SpecStatus,
    pub new: SpecStatus,
    pub at: String,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    InvalidTransition {
        block_id: String,
        from: SpecStatus,
        to: SpecStatus,
    },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::InvalidTransition { block_id, from, to } => write!(
                f,
                "block '{}' cannot transition from '{}' to '{}'",
                block_id, from, to
            ),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Governance state: the transition table plus the audit trail.
///
/// Transitions for the same block are serialized through a per-block lock,
/// so concurrent callers cannot interleave the check and the mutation.
pub struct GovernanceLog {
    table: TransitionTable,
    entries: Mutex<Vec<AuditEntry>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GovernanceLog {
    pub fn new(table: TransitionTable) -> Self {
        GovernanceLog {
            table,
            entries: Mutex::new(Vec::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Apply a status change to a block if the table allows it.
    ///
    /// On success the block's status is updated and one [`AuditEntry`] is
    /// appended. On rejection the block is untouched and nothing is
    /// recorded. Self-transitions are rejected unless the table declares
    /// them.
    pub fn request_transition(
        &self,
        block: &mut SpecBlock,
        new_status: SpecStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<AuditEntry, TransitionError> {
        let lock = self.block_lock(&block.id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let previous = block.status;
        if !self.table.allows(previous, new_status) {
            return Err(TransitionError::InvalidTransition {
                block_id: block.id.clone(),
                from: previous,
                to: new_status,
            });
        }

        let entry = AuditEntry {
            block_id: block.id.clone(),
            previous,
            new: new_status,
            at: utc_now_iso(),
            actor: actor.to_string(),
            reason: reason.map(|r| r.to_string()),
        };

        block.status = new_status;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        Ok(entry)
    }

    /// Snapshot of the audit trail in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Audit entries for one block, in append order.
    pub fn entries_for(&self, block_id: &str) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.block_id == block_id)
            .collect()
    }

    fn block_lock(&self, block_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(block_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for GovernanceLog {
    fn default() -> Self {
        GovernanceLog::new(TransitionTable::default())
    }
}
