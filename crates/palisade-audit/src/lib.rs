//! # palisade-audit
//!
//! Immutable, append-only, SHA-256 hash-chained audit trail for Palisade
//! evaluations.
//!
//! ## Overview
//!
//! Every evaluation call the orchestrator completes produces one
//! `EvaluationRecord`.  This crate wraps each record in an `AuditEntry`
//! that links to the previous entry via its SHA-256 hash.  Tampering with
//! any entry — even a single byte — breaks the chain and is detected by
//! `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palisade_audit::InMemoryAuditSink;
//! use palisade_core::traits::AuditSink;
//!
//! let sink = InMemoryAuditSink::new();
//! sink.record(&evaluation_record).await?;
//!
//! assert!(sink.verify_integrity());
//! let trail = sink.export();
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use entry::{AuditEntry, AuditTrail};
pub use memory::InMemoryAuditSink;

// ── Tests ─────────────────────────────────────────────────────────────────────
