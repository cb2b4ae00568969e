//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditSink` appends each evaluation record to a SHA-256 hash
//! chain held behind a `Mutex`.  The lock is held only to append or read —
//! never across an await point — so the sink can be shared across tasks
//! via `Arc`.
//!
//! Use `export()` to obtain a sealed `AuditTrail` and `verify_integrity()`
//! at any time to confirm the chain has not been tampered with in memory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use palisade_contracts::error::{GuardError, GuardResult};
use palisade_contracts::evaluation::EvaluationRecord;
use palisade_core::traits::AuditSink;

use crate::{
    chain::{hash_entry, verify_chain},
    entry::{AuditEntry, AuditTrail},
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryAuditSink`.
pub(crate) struct ChainState {
    /// All entries written so far, in append order.
    pub(crate) entries: Vec<AuditEntry>,

    /// The next sequence number to assign (starts at 0).
    pub(crate) sequence: u64,

    /// The `this_hash` of the last written entry, or `GENESIS_HASH` before
    /// any entry has been written.
    pub(crate) last_hash: String,
}

// ── Public sink ───────────────────────────────────────────────────────────────

/// An in-memory, append-only audit sink backed by a SHA-256 hash chain.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    pub(crate) state: Arc<Mutex<ChainState>>,
}

impl InMemoryAuditSink {
    /// Create an empty sink.
    ///
    /// The internal `last_hash` is initialized to `AuditEntry::GENESIS_HASH`
    /// so the first entry's `prev_hash` is automatically correct.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                entries: Vec::new(),
                sequence: 0,
                last_hash: AuditEntry::GENESIS_HASH.to_string(),
            })),
        }
    }

    /// Export a sealed `AuditTrail` containing all entries written so far.
    pub fn export(&self) -> AuditTrail {
        let state = self.state.lock().expect("audit state lock poisoned");
        let terminal_hash = state
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        AuditTrail {
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("audit state lock poisoned");
        verify_chain(&state.entries)
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    /// Append one evaluation record to the hash chain.
    ///
    /// Computes `this_hash` from (sequence, prev_hash, record), wraps the
    /// record in an `AuditEntry`, appends it, then advances the sequence
    /// counter and `last_hash`.
    ///
    /// Returns `Err(AuditWriteFailed)` only if the internal mutex is
    /// poisoned, which cannot happen under normal operation.
    async fn record(&self, record: &EvaluationRecord) -> GuardResult<()> {
        let mut state = self.state.lock().map_err(|e| GuardError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_entry(sequence, record, &prev_hash);

        state.entries.push(AuditEntry {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        debug!(
            request_id = %record.request_id,
            sequence,
            "evaluation record appended to audit chain"
        );

        Ok(())
    }
}
