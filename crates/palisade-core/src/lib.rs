//! # palisade-core
//!
//! The evaluation orchestrator for the Palisade guardrail engine.
//!
//! This crate provides:
//! - The collaborator traits (`GuardrailStore`, `AlignmentStore`, `AuditSink`)
//! - The `Evaluator` that fetches applicable guardrails, evaluates them
//!   concurrently in deterministic order, aggregates the should-proceed
//!   decision, and writes the per-call audit record
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palisade_core::{Evaluator, traits::{GuardrailStore, AlignmentStore, AuditSink}};
//!
//! let evaluator = Evaluator::new(judge, guardrails, alignments, audit);
//! let response = evaluator.evaluate_agent(&request).await?;
//! ```

pub mod evaluator;
pub mod traits;

pub use evaluator::{Evaluator, EvaluatorConfig};
