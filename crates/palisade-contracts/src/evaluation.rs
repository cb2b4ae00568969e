//! Evaluation request, result, and audit record types.
//!
//! One external call produces exactly one `EvaluationResponse` and one
//! `EvaluationRecord`; neither is mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::action::ActionResult;
use crate::error::{GuardError, GuardResult};
use crate::guardrail::Timing;

/// What kind of process the agent is about to run (or just ran).
///
/// Accepted as a selection parameter and recorded for audit scoping, but not
/// used to filter guardrail selection — filtering here would silently change
/// observable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    Llm,
    Tool,
    Retrieval,
    Agent,
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessType::Llm => write!(f, "llm"),
            ProcessType::Tool => write!(f, "tool"),
            ProcessType::Retrieval => write!(f, "retrieval"),
            ProcessType::Agent => write!(f, "agent"),
        }
    }
}

/// Identifiers scoping a call for audit purposes.  All optional — the
/// persisted path sets `agent_id`, the session path sets `session_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// The payload guardrail conditions are resolved against: an arbitrary
/// nested JSON object with a mandatory `input` key and, for `on_end`
/// evaluations, an `output` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext(pub Value);

impl EvaluationContext {
    /// Wrap a JSON value.  Shape is checked by `validate`, not here.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The root value conditions resolve paths against.
    pub fn root(&self) -> &Value {
        &self.0
    }

    /// Reject malformed contexts before evaluation begins.
    ///
    /// The context must be a JSON object whose `input` key holds an object.
    /// For `on_end` evaluations, `output` must hold an object as well.
    pub fn validate(&self, timing: Timing) -> GuardResult<()> {
        let root = self.0.as_object().ok_or_else(|| GuardError::InvalidRequest {
            reason: "evaluation context must be a JSON object".to_string(),
        })?;

        match root.get("input") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(GuardError::InvalidRequest {
                    reason: "context key 'input' must be an object".to_string(),
                })
            }
            None => {
                return Err(GuardError::InvalidRequest {
                    reason: "context is missing the mandatory 'input' key".to_string(),
                })
            }
        }

        if timing == Timing::OnEnd {
            match root.get("output") {
                Some(Value::Object(_)) => {}
                Some(_) => {
                    return Err(GuardError::InvalidRequest {
                        reason: "context key 'output' must be an object".to_string(),
                    })
                }
                None => {
                    return Err(GuardError::InvalidRequest {
                        reason: "on_end evaluation requires an 'output' key".to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

/// One external evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Audit scoping identifiers.
    #[serde(default)]
    pub scope: EvaluationScope,
    /// Whether this is an invocation-start or completion check.
    pub timing: Timing,
    /// The kind of process being guarded.  Informational.
    pub process_type: ProcessType,
    /// Free-text process name; matched against `disallowed_tools` on the
    /// session path.
    pub process_name: String,
    /// The payload conditions resolve against.
    pub context: EvaluationContext,
}

/// The per-guardrail outcome within one evaluation call.
///
/// Invariant: `ignored` and `error` are mutually exclusive, and either one
/// forces `triggered = false` with an empty action list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredGuardrail {
    pub guardrail_id: String,
    pub guardrail_name: String,
    /// True when the trigger's conditions matched under its logic mode.
    pub triggered: bool,
    /// The guardrail could not be meaningfully evaluated against this input.
    pub ignored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_reason: Option<String>,
    /// An unexpected failure occurred during evaluation.
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Every condition index that evaluated true, regardless of logic mode.
    #[serde(default)]
    pub matched_conditions: Vec<usize>,
    /// Results of the executed actions, in declaration order.
    #[serde(default)]
    pub actions: Vec<ActionResult>,
}

impl TriggeredGuardrail {
    /// A guardrail whose conditions matched; actions attached.
    pub fn triggered(
        id: impl Into<String>,
        name: impl Into<String>,
        matched_conditions: Vec<usize>,
        actions: Vec<ActionResult>,
    ) -> Self {
        Self {
            guardrail_id: id.into(),
            guardrail_name: name.into(),
            triggered: true,
            ignored: false,
            ignored_reason: None,
            error: false,
            error_message: None,
            matched_conditions,
            actions,
        }
    }

    /// A guardrail whose conditions did not match.
    pub fn not_triggered(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guardrail_id: id.into(),
            guardrail_name: name.into(),
            triggered: false,
            ignored: false,
            ignored_reason: None,
            error: false,
            error_message: None,
            matched_conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// A guardrail downgraded to ignored by a soft evaluation failure.
    pub fn ignored(
        id: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            guardrail_id: id.into(),
            guardrail_name: name.into(),
            triggered: false,
            ignored: true,
            ignored_reason: Some(reason.into()),
            error: false,
            error_message: None,
            matched_conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// A guardrail downgraded to error by an unexpected failure.
    pub fn errored(
        id: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            guardrail_id: id.into(),
            guardrail_name: name.into(),
            triggered: false,
            ignored: false,
            ignored_reason: None,
            error: true,
            error_message: Some(message.into()),
            matched_conditions: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// Call-level counters and timing.
///
/// `evaluated_guardrails_count` excludes ignored guardrails: evaluated =
/// fetched − ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationMetadata {
    pub evaluation_time_ms: u64,
    pub evaluated_guardrails_count: usize,
    pub triggered_guardrails_count: usize,
    pub ignored_guardrails_count: usize,
}

/// The response returned to the calling agent.  Created once per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// Server-generated, globally unique per call.
    pub request_id: Uuid,
    /// Per-guardrail outcomes in fetch order.
    pub triggered_guardrails: Vec<TriggeredGuardrail>,
    /// The single boolean gate for the calling agent.
    pub should_proceed: bool,
    pub metadata: EvaluationMetadata,
}

/// The audit record written once per call, independent of guardrail source.
///
/// Persistence is best-effort: a failed write is logged and never changes
/// `should_proceed` or raises to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub request_id: Uuid,
    pub scope: EvaluationScope,
    pub timing: Timing,
    pub process_type: ProcessType,
    pub process_name: String,
    /// The full request context as received.
    pub context: Value,
    /// Ids of guardrails that were evaluated (fetched minus ignored).
    pub evaluated_guardrail_ids: Vec<String>,
    pub triggered_guardrail_ids: Vec<String>,
    pub ignored_guardrail_ids: Vec<String>,
    /// The full per-guardrail result set.
    pub results: Vec<TriggeredGuardrail>,
    pub should_proceed: bool,
    pub evaluation_time_ms: u64,
    /// Wall-clock time (UTC) the record was created.
    pub created_at: DateTime<Utc>,
}
