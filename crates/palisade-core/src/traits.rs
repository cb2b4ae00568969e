//! Collaborator traits for the evaluation orchestrator.
//!
//! Three seams separate the engine from the outside world:
//!
//! - `GuardrailStore`   — persisted, agent-scoped guardrails
//! - `AlignmentStore`   — ephemeral, session-scoped guardrails
//! - `AuditSink`        — the per-call audit record
//!
//! The fourth seam, `Judge`, lives in `palisade-engine` because the
//! condition evaluator consumes it directly.  Persistence mechanics are
//! out of scope — implementations may be in-memory, a database, anything.

use async_trait::async_trait;

use palisade_contracts::error::GuardResult;
use palisade_contracts::evaluation::EvaluationRecord;
use palisade_contracts::guardrail::{Guardrail, SessionAlignment};

/// Source of persisted, agent-scoped guardrails.
#[async_trait]
pub trait GuardrailStore: Send + Sync {
    /// Return the guardrails applicable to `agent_id`: assigned to the
    /// agent, currently active, not archived, ordered by creation time
    /// ascending.  Oldest-first ordering makes evaluation deterministic
    /// and repeatable; the orchestrator relies on it.
    async fn guardrails_for_agent(&self, agent_id: &str) -> GuardResult<Vec<Guardrail>>;
}

/// Source of ephemeral, session-scoped guardrails.
#[async_trait]
pub trait AlignmentStore: Send + Sync {
    /// Return the latest alignment record for `session_id`, or `None` when
    /// the session has no alignment yet (evaluation then sees no rules and
    /// no disallowed tools).
    async fn latest_alignment(&self, session_id: &str) -> GuardResult<Option<SessionAlignment>>;
}

/// Destination for per-call audit records.
///
/// Writes are best-effort from the orchestrator's point of view: a failed
/// `record` is logged and never changes the evaluation response.
/// Implementations must treat records as append-only and immutable.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one evaluation record.
    async fn record(&self, entry: &EvaluationRecord) -> GuardResult<()>;
}
