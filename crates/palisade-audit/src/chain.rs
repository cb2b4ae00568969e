//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the evaluation record (serde_json, compact)

use sha2::{Digest, Sha256};

use palisade_contracts::evaluation::EvaluationRecord;

use crate::entry::AuditEntry;

/// Compute the SHA-256 hash for a single audit entry.
///
/// The hash commits to the entry's position in the chain (`sequence`), its
/// link to the previous entry (`prev_hash`), and the full evaluation
/// record.  Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `record` cannot be serialized to JSON — which cannot happen
/// for the well-formed `EvaluationRecord` type.
pub fn hash_entry(sequence: u64, record: &EvaluationRecord, prev_hash: &str) -> String {
    let record_json = serde_json::to_vec(record)
        .expect("EvaluationRecord must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a hash chain.
///
/// Returns `true` when the chain is valid according to both rules:
///
/// 1. **Prev-hash linkage** — each entry's `prev_hash` equals the
///    `this_hash` of the preceding entry (or `GENESIS_HASH` for entry 0).
/// 2. **Hash correctness** — each entry's `this_hash` matches the value
///    recomputed from its own fields.
///
/// Returns `false` the moment any mismatch is detected.  An empty chain
/// is defined as valid.
pub fn verify_chain(entries: &[AuditEntry]) -> bool {
    let mut expected_prev = AuditEntry::GENESIS_HASH.to_string();

    for entry in entries {
        if entry.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_entry(entry.sequence, &entry.record, &entry.prev_hash);
        if entry.this_hash != recomputed {
            return false;
        }

        expected_prev = entry.this_hash.clone();
    }

    true
}
