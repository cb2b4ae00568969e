//! Condition evaluation: one condition against a context, and AND/OR
//! aggregation over a condition list.
//!
//! Evaluation semantics:
//!
//! - The field path is resolved first; resolution failures propagate as
//!   `FieldPathResolution` (soft — the owning guardrail is ignored).
//! - A resolved `null` supports only `equals`; every other operator on a
//!   null field is a `ConditionEvaluation` error.
//! - `contains` stringifies both sides; `equals` is exact JSON equality;
//!   `regex` is an unanchored search; the ordering operators coerce
//!   numbers and numeric strings to `f64`; the size operators measure
//!   strings and arrays.
//! - `llm_judge` delegates to the [`Judge`] trait with the stringified,
//!   truncated field value and the condition operand as criteria.

use serde_json::Value;
use tracing::debug;

use palisade_contracts::error::{GuardError, GuardResult};
use palisade_contracts::guardrail::{Condition, ConditionOperator, TriggerLogic};

use crate::judge::Judge;
use crate::path::resolve;

/// Judged content is truncated to this many characters before being sent
/// to the provider.
pub const MAX_JUDGED_CONTENT_CHARS: usize = 2000;

fn condition_error(reason: impl std::fmt::Display) -> GuardError {
    GuardError::ConditionEvaluation {
        reason: reason.to_string(),
    }
}

/// Stringify a JSON value the way the comparison operators see it:
/// strings are used verbatim, everything else is compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a value to `f64` for the ordering operators.
///
/// Numbers pass through; strings are parsed as integer first, then float.
/// Everything else — including booleans — fails.
fn as_number(value: &Value) -> GuardResult<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| condition_error(format!("number {} is not representable", n))),
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Ok(i as f64);
            }
            s.trim()
                .parse::<f64>()
                .map_err(|_| condition_error(format!("cannot coerce '{}' to a number", s)))
        }
        other => Err(condition_error(format!(
            "cannot coerce {} to a number",
            type_name(other)
        ))),
    }
}

/// Length for the size operators: characters of a string, elements of an
/// array.  Other types fail.
fn size_of(value: &Value) -> GuardResult<usize> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        Value::Array(a) => Ok(a.len()),
        other => Err(condition_error(format!(
            "size operators require a string or array, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Evaluate one condition against the context.
///
/// Only the `llm_judge` arm awaits; everything else is pure computation
/// over the resolved value.
pub async fn evaluate(
    judge: &dyn Judge,
    context: &Value,
    condition: &Condition,
) -> GuardResult<bool> {
    let field_value = resolve(context, &condition.field)?;

    // A null field supports equality only — every other operator is a
    // configuration/data mismatch for this input.
    if field_value.is_null() && condition.operator != ConditionOperator::Equals {
        return Err(condition_error(format!(
            "operator '{}' cannot be evaluated on null field '{}'",
            condition.operator, condition.field
        )));
    }

    let result = match condition.operator {
        ConditionOperator::Contains => {
            stringify(field_value).contains(&stringify(&condition.value))
        }

        ConditionOperator::Equals => field_value == &condition.value,

        ConditionOperator::Regex => {
            let pattern = stringify(&condition.value);
            let re = regex::Regex::new(&pattern)
                .map_err(|e| condition_error(format!("invalid regex '{}': {}", pattern, e)))?;
            re.is_match(&stringify(field_value))
        }

        ConditionOperator::Gt
        | ConditionOperator::Lt
        | ConditionOperator::Gte
        | ConditionOperator::Lte => {
            let left = as_number(field_value)?;
            let right = as_number(&condition.value)?;
            match condition.operator {
                ConditionOperator::Gt => left > right,
                ConditionOperator::Lt => left < right,
                ConditionOperator::Gte => left >= right,
                _ => left <= right,
            }
        }

        ConditionOperator::SizeGt
        | ConditionOperator::SizeLt
        | ConditionOperator::SizeGte
        | ConditionOperator::SizeLte => {
            let size = size_of(field_value)? as f64;
            let bound = as_number(&condition.value)?;
            match condition.operator {
                ConditionOperator::SizeGt => size > bound,
                ConditionOperator::SizeLt => size < bound,
                ConditionOperator::SizeGte => size >= bound,
                _ => size <= bound,
            }
        }

        ConditionOperator::LlmJudge => {
            let content: String = stringify(field_value)
                .chars()
                .take(MAX_JUDGED_CONTENT_CHARS)
                .collect();
            let criteria = stringify(&condition.value);
            judge.judge(&content, &criteria).await?
        }
    };

    debug!(
        field = %condition.field,
        operator = %condition.operator,
        result,
        "condition evaluated"
    );

    Ok(result)
}

/// Evaluate a condition list and combine the results with `logic`.
///
/// Returns `(overall, matched)` where `matched` lists **every** condition
/// index that evaluated true — independent of which logic mode produced
/// the overall result.  The indices feed the block reason later, so no
/// short-circuiting: each condition is always evaluated, and any
/// condition error fails the whole list.
///
/// An empty condition list is `(false, [])` regardless of logic.
pub async fn evaluate_all(
    judge: &dyn Judge,
    context: &Value,
    conditions: &[Condition],
    logic: TriggerLogic,
) -> GuardResult<(bool, Vec<usize>)> {
    if conditions.is_empty() {
        return Ok((false, Vec::new()));
    }

    let mut matched = Vec::new();
    for (index, condition) in conditions.iter().enumerate() {
        if evaluate(judge, context, condition).await? {
            matched.push(index);
        }
    }

    let overall = match logic {
        TriggerLogic::And => matched.len() == conditions.len(),
        TriggerLogic::Or => !matched.is_empty(),
    };

    Ok((overall, matched))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
