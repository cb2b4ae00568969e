//! The `Judge` seam: natural-language judgment for the `llm_judge` operator.
//!
//! The condition evaluator is pure except for this trait — it is the
//! engine's only network/blocking dependency and its only source of
//! non-determinism.  Implementations live outside the engine crate
//! (`palisade-judge` ships the HTTP chat-completion one).

use async_trait::async_trait;

use palisade_contracts::error::{GuardError, GuardResult};

/// Decides whether `content` satisfies `criteria`.
///
/// Implementations must return `Ok(true)` / `Ok(false)` only for a clear
/// verdict; every other outcome — provider error, timeout, an unparseable
/// reply — is `GuardError::LlmJudge`, which the orchestrator treats as a
/// soft failure (the guardrail is ignored, the request proceeds).
#[async_trait]
pub trait Judge: Send + Sync {
    /// Judge `content` against the natural-language `criteria`.
    async fn judge(&self, content: &str, criteria: &str) -> GuardResult<bool>;
}

/// A judge for deployments with no chat-completion provider configured.
///
/// Every `llm_judge` condition evaluated through it fails soft, so
/// guardrails using the operator are ignored rather than silently passed
/// or failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredJudge;

#[async_trait]
impl Judge for UnconfiguredJudge {
    async fn judge(&self, _content: &str, _criteria: &str) -> GuardResult<bool> {
        Err(GuardError::LlmJudge {
            reason: "no llm_judge provider configured".to_string(),
        })
    }
}
