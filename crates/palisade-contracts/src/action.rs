//! Action configuration and result types.
//!
//! Actions are tagged by `type` on the wire.  Unknown `type` values must not
//! poison a definition — they deserialize to `Action::Unknown` and the
//! executor skips them with a log line.  `Deserialize` is hand-written for
//! exactly this reason; `Serialize` uses the derived tagged form.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The default block message when the operator supplies none.
pub const DEFAULT_BLOCK_MESSAGE: &str = "Process blocked";

/// The default warn severity when the operator supplies none.
pub const DEFAULT_WARN_SEVERITY: &str = "medium";

/// The per-field drop check a modify action applies.
///
/// `fields` names the keys to check; the single entry `"*"` means every key
/// of the target object (or item).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropCondition {
    /// Keys to check, or `["*"]` for all keys.
    pub fields: Vec<String>,
    /// The check applied to each field value.
    pub operator: DropOperator,
    /// Comparison operand for `equals`; ignored by the other operators.
    #[serde(default)]
    pub value: Value,
}

/// The check a `DropCondition` applies to a field value.
///
/// A field that is absent from the object never satisfies the condition —
/// drops happen only on positive evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropOperator {
    /// The value is JSON `null`.
    IsNull,
    /// The value is `""` or a zero-length array.
    IsEmpty,
    /// The value equals `DropCondition::value` exactly.
    Equals,
}

impl std::fmt::Display for DropOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropOperator::IsNull => write!(f, "is_null"),
            DropOperator::IsEmpty => write!(f, "is_empty"),
            DropOperator::Equals => write!(f, "equals"),
        }
    }
}

/// An action executed when a guardrail triggers.
///
/// `priority` is informational — execution order is declaration order.
/// `modification_type` is carried as a string so an unsupported value
/// surfaces as an action execution failure, not a definition parse failure.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Deny the call with an operator-supplied message.
    Block {
        message: String,
        priority: i64,
    },

    /// Record a warning.  `allow_proceed = false` makes the warning
    /// blocking; the flag lives only here, never in the `ActionResult` —
    /// the should-proceed calculator reads it from this config.
    Warn {
        message: String,
        severity: String,
        allow_proceed: bool,
        priority: i64,
    },

    /// Rewrite a deep copy of the context by dropping fields or items.
    Modify {
        /// `drop_field` or `drop_item`; anything else fails at execution.
        modification_type: String,
        /// Path to the object or array to modify.
        target: String,
        /// The per-field drop check.
        condition: DropCondition,
        priority: i64,
    },

    /// An action `type` this engine does not recognize.  Skipped (logged)
    /// by the executor.
    Unknown {
        kind: String,
    },
}

impl Action {
    /// The informational priority, 0 for unknown actions.
    pub fn priority(&self) -> i64 {
        match self {
            Action::Block { priority, .. }
            | Action::Warn { priority, .. }
            | Action::Modify { priority, .. } => *priority,
            Action::Unknown { .. } => 0,
        }
    }
}

// Field sets for the known action kinds, with the wire defaults applied.

#[derive(Deserialize)]
struct BlockFields {
    #[serde(default = "default_block_message")]
    message: String,
    #[serde(default)]
    priority: i64,
}

#[derive(Deserialize)]
struct WarnFields {
    message: String,
    #[serde(default = "default_warn_severity")]
    severity: String,
    #[serde(default = "default_true")]
    allow_proceed: bool,
    #[serde(default)]
    priority: i64,
}

#[derive(Deserialize)]
struct ModifyFields {
    modification_type: String,
    target: String,
    condition: DropCondition,
    #[serde(default)]
    priority: i64,
}

fn default_block_message() -> String {
    DEFAULT_BLOCK_MESSAGE.to_string()
}

fn default_warn_severity() -> String {
    DEFAULT_WARN_SEVERITY.to_string()
}

fn default_true() -> bool {
    true
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::custom("action is missing a string `type` field"))?
            .to_string();

        match kind.as_str() {
            "block" => {
                let f: BlockFields = serde_json::from_value(raw).map_err(D::Error::custom)?;
                Ok(Action::Block {
                    message: f.message,
                    priority: f.priority,
                })
            }
            "warn" => {
                let f: WarnFields = serde_json::from_value(raw).map_err(D::Error::custom)?;
                Ok(Action::Warn {
                    message: f.message,
                    severity: f.severity,
                    allow_proceed: f.allow_proceed,
                    priority: f.priority,
                })
            }
            "modify" => {
                let f: ModifyFields = serde_json::from_value(raw).map_err(D::Error::custom)?;
                Ok(Action::Modify {
                    modification_type: f.modification_type,
                    target: f.target,
                    condition: f.condition,
                    priority: f.priority,
                })
            }
            _ => Ok(Action::Unknown { kind }),
        }
    }
}

/// The result of executing one action for a triggered guardrail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionResult {
    /// The call must not proceed.
    Block {
        /// Always true; present so consumers need not match on the tag.
        should_block: bool,
        /// The operator-supplied message.
        message: String,
        /// Synthesized from the first matched condition, or a generic
        /// fallback when no condition index was recorded.
        reason: String,
    },

    /// A non-fatal finding.  Whether it blocks is decided later from the
    /// original action config's `allow_proceed`.
    Warn {
        warning_message: String,
        severity: String,
    },

    /// A rewritten copy of the context.  The original is never mutated.
    Modify {
        modified_data: Value,
        modification_type: String,
        applied_pattern: String,
    },
}
