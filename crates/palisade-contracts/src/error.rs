//! Error types for the Palisade guardrail engine.
//!
//! All fallible operations in the engine return `GuardResult<T>`.  The
//! orchestrator classifies errors with `is_soft()`: soft errors mean a single
//! guardrail could not be meaningfully evaluated against this input and is
//! downgraded to `ignored`; every other error surfacing from a guardrail's
//! evaluation downgrades it to `error`.  Neither class aborts the request.

use thiserror::Error;

/// The unified error type for the Palisade engine.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A field path could not be parsed or resolved against the context
    /// (malformed path, missing key, index out of range, type mismatch).
    #[error("field path resolution failed: {reason}")]
    FieldPathResolution { reason: String },

    /// A condition could not be evaluated (unsupported operator for the
    /// resolved value, failed numeric coercion, null-field misuse).
    #[error("condition evaluation failed: {reason}")]
    ConditionEvaluation { reason: String },

    /// The LLM judge failed: provider error, timeout, or a reply that does
    /// not contain a boolean verdict.
    #[error("llm judge failed: {reason}")]
    LlmJudge { reason: String },

    /// An action could not be executed.  Caught per action — the offending
    /// action is dropped while sibling actions stand.
    #[error("action execution failed: {reason}")]
    ActionExecution { reason: String },

    /// The evaluation request is malformed (missing `input`, missing
    /// `output` on an on_end call).  Rejected before evaluation begins.
    #[error("invalid evaluation request: {reason}")]
    InvalidRequest { reason: String },

    /// A guardrail or alignment store could not be read.
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// The audit sink could not persist an evaluation record.
    ///
    /// Swallowed by the orchestrator — audit persistence is best-effort and
    /// never changes the response.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// An unexpected failure during a guardrail's evaluation.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl GuardError {
    /// True for errors that mean "this guardrail cannot be evaluated against
    /// this input" — a configuration/data issue rather than an engine fault.
    ///
    /// Soft errors downgrade the guardrail to `ignored`; hard errors
    /// downgrade it to `error`.  An `LlmJudge` failure surfaces during
    /// condition evaluation and is therefore soft.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            GuardError::FieldPathResolution { .. }
                | GuardError::ConditionEvaluation { .. }
                | GuardError::LlmJudge { .. }
        )
    }
}

/// Convenience alias used throughout the Palisade crates.
pub type GuardResult<T> = Result<T, GuardError>;
