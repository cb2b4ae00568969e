//! Guardrail definition types.
//!
//! A `GuardrailDefinition` is the immutable value the engine evaluates: a
//! trigger (when to fire, how to combine conditions) plus the actions to
//! execute when it fires.  Definitions are authored by an external generator
//! and are read-only to this engine.  They reach the engine from one of two
//! sources: a persisted, agent-scoped `Guardrail` record, or an ephemeral
//! `SessionAlignment` produced for a single session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;

/// When a guardrail is checked relative to the guarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    /// Before the tool/LLM call runs — only `input` is available.
    OnStart,
    /// After the call completes — `output` is available as well.
    OnEnd,
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timing::OnStart => write!(f, "on_start"),
            Timing::OnEnd => write!(f, "on_end"),
        }
    }
}

/// How a trigger combines its condition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerLogic {
    /// Every condition must be true.
    And,
    /// At least one condition must be true.
    Or,
}

impl Default for TriggerLogic {
    fn default() -> Self {
        TriggerLogic::And
    }
}

/// The comparison applied between a resolved field value and the condition's
/// operand.  Serialized in snake_case on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Substring test; both sides are stringified first.
    Contains,
    /// Exact equality, any JSON type.  The only operator defined on a
    /// resolved null value.
    Equals,
    /// Unanchored regex search — matches if the pattern occurs anywhere.
    Regex,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Length of a string or array, strictly greater.
    SizeGt,
    SizeLt,
    SizeGte,
    SizeLte,
    /// Natural-language judgment by a chat-completion provider.  The
    /// condition operand is the judging criteria.  The engine's only
    /// non-deterministic operator.
    LlmJudge,
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConditionOperator::Contains => "contains",
            ConditionOperator::Equals => "equals",
            ConditionOperator::Regex => "regex",
            ConditionOperator::Gt => "gt",
            ConditionOperator::Lt => "lt",
            ConditionOperator::Gte => "gte",
            ConditionOperator::Lte => "lte",
            ConditionOperator::SizeGt => "size_gt",
            ConditionOperator::SizeLt => "size_lt",
            ConditionOperator::SizeGte => "size_gte",
            ConditionOperator::SizeLte => "size_lte",
            ConditionOperator::LlmJudge => "llm_judge",
        };
        write!(f, "{}", name)
    }
}

/// One boolean check against the evaluation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted/bracketed path into the context, e.g. `input.items[0].name`.
    pub field: String,
    /// The comparison to apply.
    pub operator: ConditionOperator,
    /// Comparison operand.  Any JSON scalar; `null` when absent.  For
    /// `llm_judge` this is the judging criteria.
    #[serde(default)]
    pub value: Value,
}

/// The `{type, logic, conditions}` portion of a definition deciding whether
/// it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// When the guardrail is checked.
    #[serde(rename = "type")]
    pub trigger_type: Timing,
    /// AND/OR combination of condition results.  Defaults to AND.
    #[serde(default)]
    pub logic: TriggerLogic,
    /// The conditions to evaluate.  An empty list never triggers.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Operator-facing annotations on a definition.  Not consulted by the
/// evaluation algorithm; carried through to responses and audit records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardrailMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The complete, immutable guardrail value the engine evaluates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailDefinition {
    /// When and whether the guardrail fires.
    pub trigger: Trigger,
    /// Actions executed in declaration order when the trigger fires.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Operator annotations.
    #[serde(default)]
    pub metadata: GuardrailMetadata,
}

/// A persisted guardrail record: a definition plus assignment metadata.
///
/// Selection semantics for the persisted evaluation path: a guardrail is
/// applicable when it is assigned to the agent, `active`, and not `archived`.
/// Applicable guardrails are evaluated oldest-first (`created_at` ascending)
/// so evaluation order is deterministic and repeatable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guardrail {
    /// Stable identifier used in responses and audit records.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The agent this guardrail is assigned to.
    pub agent_id: String,
    /// The definition the engine evaluates.
    pub definition: GuardrailDefinition,
    /// Inactive guardrails are never fetched.
    pub active: bool,
    /// Archived guardrails are never fetched.
    pub archived: bool,
    /// Creation time; the persisted-path evaluation order key.
    pub created_at: DateTime<Utc>,
}

/// One per-tool rule inside a session's alignment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRule {
    /// The tool this rule guards.
    pub tool_name: String,
    /// The ephemeral definition generated for this session.
    pub definition: GuardrailDefinition,
}

/// The latest alignment record for a session: ephemeral, LLM-generated
/// guardrails scoped to a single session rather than an agent.
///
/// `disallowed_tools` is checked before any rule evaluation — a listed tool
/// short-circuits the call with a synthetic block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAlignment {
    /// One rule per tool, each carrying a guardrail definition.
    #[serde(default)]
    pub tool_rules: Vec<ToolRule>,
    /// Tool names that are blocked outright, bypassing condition evaluation.
    #[serde(default)]
    pub disallowed_tools: Vec<String>,
}
