//! Action execution for triggered guardrails.
//!
//! Actions run in declaration order.  `block` and `warn` cannot fail;
//! `modify` operates on a deep copy of the context and raises
//! `ActionExecution` on an unsupported modification type or an unusable
//! target — the per-guardrail driver catches that, drops the offending
//! action, and lets sibling actions and the guardrail's triggered status
//! stand.  Unknown action kinds are skipped with a log line.
//!
//! Within one guardrail, modify actions chain: each receives the previous
//! modify's output.  Modifications never leak across guardrails — every
//! guardrail starts from its own copy of the shared, read-only context.

use serde_json::Value;
use tracing::warn;

use palisade_contracts::action::{Action, ActionResult, DropCondition, DropOperator};
use palisade_contracts::error::{GuardError, GuardResult};
use palisade_contracts::guardrail::Condition;

use crate::path::resolve_mut;

fn action_error(reason: impl std::fmt::Display) -> GuardError {
    GuardError::ActionExecution {
        reason: reason.to_string(),
    }
}

/// Execute a block action.
///
/// The reason is synthesized from the first matched condition so operators
/// can see *why* the call was blocked without replaying the evaluation;
/// when no condition index was recorded a generic fallback is used.
pub fn execute_block(
    message: &str,
    matched: &[usize],
    conditions: &[Condition],
) -> ActionResult {
    let reason = matched
        .first()
        .and_then(|&index| conditions.get(index))
        .map(|condition| {
            format!(
                "Field '{}' matched condition (operator: {})",
                condition.field, condition.operator
            )
        })
        .unwrap_or_else(|| "Guardrail conditions matched".to_string());

    ActionResult::Block {
        should_block: true,
        message: message.to_string(),
        reason,
    }
}

/// Execute a warn action: a pass-through of message and severity.
///
/// `allow_proceed` is deliberately NOT part of the result — the
/// should-proceed calculator reads it from the original action config.
pub fn execute_warn(message: &str, severity: &str) -> ActionResult {
    ActionResult::Warn {
        warning_message: message.to_string(),
        severity: severity.to_string(),
    }
}

/// True when `value` satisfies the drop condition's check.
///
/// A missing field never reaches this function — absence is not evidence.
fn satisfies(value: &Value, operator: DropOperator, operand: &Value) -> bool {
    match operator {
        DropOperator::IsNull => value.is_null(),
        DropOperator::IsEmpty => match value {
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        },
        DropOperator::Equals => value == operand,
    }
}

fn is_wildcard(condition: &DropCondition) -> bool {
    condition.fields.len() == 1 && condition.fields[0] == "*"
}

/// Drop every checked key of `map` whose value satisfies the condition.
fn drop_fields(map: &mut serde_json::Map<String, Value>, condition: &DropCondition) {
    if is_wildcard(condition) {
        map.retain(|_, value| !satisfies(value, condition.operator, &condition.value));
        return;
    }
    for field in &condition.fields {
        let should_drop = map
            .get(field)
            .map(|value| satisfies(value, condition.operator, &condition.value))
            .unwrap_or(false);
        if should_drop {
            map.remove(field);
        }
    }
}

/// True when any checked field of `item` satisfies the condition —
/// i.e. the item should be dropped.
fn item_matches(item: &serde_json::Map<String, Value>, condition: &DropCondition) -> bool {
    if is_wildcard(condition) {
        item.values()
            .any(|value| satisfies(value, condition.operator, &condition.value))
    } else {
        condition.fields.iter().any(|field| {
            item.get(field)
                .map(|value| satisfies(value, condition.operator, &condition.value))
                .unwrap_or(false)
        })
    }
}

/// Execute a modify action against `context`.
///
/// The whole context is deep-copied first — the caller's value is never
/// mutated.  `drop_field` accepts a target resolving to an object (drop
/// matching keys) or an array (drop matching keys of each object item);
/// `drop_item` requires an array target and keeps only items whose checked
/// fields do not satisfy the condition.  Non-object items are always kept.
pub fn execute_modify(
    modification_type: &str,
    target: &str,
    condition: &DropCondition,
    context: &Value,
) -> GuardResult<ActionResult> {
    let mut modified = context.clone();

    // Path errors during action execution are action failures, not the
    // soft condition-stage errors that downgrade a guardrail to ignored.
    let target_value = resolve_mut(&mut modified, target)
        .map_err(|e| action_error(format!("cannot resolve modify target: {}", e)))?;

    match modification_type {
        "drop_field" => match target_value {
            Value::Object(map) => drop_fields(map, condition),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if let Value::Object(map) = item {
                        drop_fields(map, condition);
                    }
                }
            }
            other => {
                return Err(action_error(format!(
                    "drop_field target '{}' must be an object or array, got {}",
                    target,
                    json_type(other)
                )))
            }
        },

        "drop_item" => match target_value {
            Value::Array(items) => {
                items.retain(|item| match item.as_object() {
                    Some(map) => !item_matches(map, condition),
                    None => true,
                });
            }
            other => {
                return Err(action_error(format!(
                    "drop_item target '{}' must be an array, got {}",
                    target,
                    json_type(other)
                )))
            }
        },

        other => {
            return Err(action_error(format!(
                "unsupported modification_type '{}'",
                other
            )))
        }
    }

    let applied_pattern = format!(
        "{} target='{}' fields=[{}] operator={}",
        modification_type,
        target,
        condition.fields.join(","),
        condition.operator
    );

    Ok(ActionResult::Modify {
        modified_data: modified,
        modification_type: modification_type.to_string(),
        applied_pattern,
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Execute a triggered guardrail's actions in declaration order.
///
/// `context` is the shared, read-only evaluation context; modify actions
/// chain through a guardrail-local working copy.  A failing action is
/// dropped from the results (logged); unknown kinds are skipped.
pub fn execute_actions(
    guardrail_id: &str,
    actions: &[Action],
    context: &Value,
    matched: &[usize],
    conditions: &[Condition],
) -> Vec<ActionResult> {
    let mut results = Vec::with_capacity(actions.len());
    let mut working: Option<Value> = None;

    for action in actions {
        match action {
            Action::Block { message, .. } => {
                results.push(execute_block(message, matched, conditions));
            }

            Action::Warn { message, severity, .. } => {
                results.push(execute_warn(message, severity));
            }

            Action::Modify {
                modification_type,
                target,
                condition,
                ..
            } => {
                let base = working.as_ref().unwrap_or(context);
                match execute_modify(modification_type, target, condition, base) {
                    Ok(result) => {
                        if let ActionResult::Modify { modified_data, .. } = &result {
                            working = Some(modified_data.clone());
                        }
                        results.push(result);
                    }
                    Err(e) => {
                        // The offending action is dropped; siblings and the
                        // guardrail's triggered status stand.
                        warn!(
                            guardrail_id = %guardrail_id,
                            error = %e,
                            "modify action failed, dropping it"
                        );
                    }
                }
            }

            Action::Unknown { kind } => {
                warn!(
                    guardrail_id = %guardrail_id,
                    action_type = %kind,
                    "skipping unknown action type"
                );
            }
        }
    }

    results
}

/// Apply a sequence of modify actions, each step feeding the next.
///
/// Returns the final data plus the per-step results.  Unlike
/// [`execute_actions`], errors propagate — this is an explicit caller API,
/// not part of the per-guardrail evaluation path, which keeps
/// modifications guardrail-local.
pub fn chain_modify(actions: &[Action], context: &Value) -> GuardResult<(Value, Vec<ActionResult>)> {
    let mut current = context.clone();
    let mut results = Vec::new();

    for action in actions {
        if let Action::Modify {
            modification_type,
            target,
            condition,
            ..
        } = action
        {
            let result = execute_modify(modification_type, target, condition, &current)?;
            if let ActionResult::Modify { modified_data, .. } = &result {
                current = modified_data.clone();
            }
            results.push(result);
        }
    }

    Ok((current, results))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use palisade_contracts::action::{Action, ActionResult, DropCondition, DropOperator};
    use palisade_contracts::guardrail::{Condition, ConditionOperator};

    use super::{chain_modify, execute_actions, execute_block, execute_modify, execute_warn};

    fn drop_condition(fields: &[&str], operator: DropOperator, value: Value) -> DropCondition {
        DropCondition {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            operator,
            value,
        }
    }

    fn modified_of(result: &ActionResult) -> &Value {
        match result {
            ActionResult::Modify { modified_data, .. } => modified_data,
            other => panic!("expected Modify result, got {:?}", other),
        }
    }

    // ── block ─────────────────────────────────────────────────────────────────

    #[test]
    fn block_reason_names_first_matched_condition() {
        let conditions = vec![
            Condition {
                field: "input.query".to_string(),
                operator: ConditionOperator::Contains,
                value: json!("secret"),
            },
            Condition {
                field: "input.other".to_string(),
                operator: ConditionOperator::Equals,
                value: json!(1),
            },
        ];

        let result = execute_block("no secrets", &[0, 1], &conditions);
        match result {
            ActionResult::Block { should_block, message, reason } => {
                assert!(should_block);
                assert_eq!(message, "no secrets");
                assert_eq!(
                    reason,
                    "Field 'input.query' matched condition (operator: contains)"
                );
            }
            other => panic!("expected Block, got {:?}", other),
        }
    }

    #[test]
    fn block_reason_falls_back_without_matches() {
        let result = execute_block("stop", &[], &[]);
        match result {
            ActionResult::Block { reason, .. } => {
                assert_eq!(reason, "Guardrail conditions matched");
            }
            other => panic!("expected Block, got {:?}", other),
        }
    }

    // ── warn ──────────────────────────────────────────────────────────────────

    #[test]
    fn warn_passes_through_message_and_severity() {
        match execute_warn("careful", "high") {
            ActionResult::Warn { warning_message, severity } => {
                assert_eq!(warning_message, "careful");
                assert_eq!(severity, "high");
            }
            other => panic!("expected Warn, got {:?}", other),
        }
    }

    // ── modify: drop_field ────────────────────────────────────────────────────

    #[test]
    fn drop_field_removes_null_email_and_preserves_original() {
        let context = json!({ "input": { "user": { "name": "A", "email": null } } });

        let result = execute_modify(
            "drop_field",
            "input.user",
            &drop_condition(&["email"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .unwrap();

        assert_eq!(
            modified_of(&result),
            &json!({ "input": { "user": { "name": "A" } } })
        );
        // Deep-copy semantics: the original context is untouched.
        assert_eq!(
            context,
            json!({ "input": { "user": { "name": "A", "email": null } } })
        );
    }

    #[test]
    fn drop_field_wildcard_checks_every_key() {
        let context = json!({ "input": { "form": { "a": "", "b": "kept", "c": [] } } });

        let result = execute_modify(
            "drop_field",
            "input.form",
            &drop_condition(&["*"], DropOperator::IsEmpty, Value::Null),
            &context,
        )
        .unwrap();

        assert_eq!(
            modified_of(&result),
            &json!({ "input": { "form": { "b": "kept" } } })
        );
    }

    #[test]
    fn drop_field_equals_matches_exact_value() {
        let context = json!({ "input": { "user": { "role": "debug", "name": "A" } } });

        let result = execute_modify(
            "drop_field",
            "input.user",
            &drop_condition(&["role"], DropOperator::Equals, json!("debug")),
            &context,
        )
        .unwrap();

        assert_eq!(
            modified_of(&result),
            &json!({ "input": { "user": { "name": "A" } } })
        );
    }

    #[test]
    fn drop_field_applies_per_item_on_array_target() {
        let context = json!({
            "input": { "rows": [
                { "id": 1, "note": null },
                { "id": 2, "note": "keep" },
                "scalar-item"
            ] }
        });

        let result = execute_modify(
            "drop_field",
            "input.rows",
            &drop_condition(&["note"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .unwrap();

        assert_eq!(
            modified_of(&result),
            &json!({
                "input": { "rows": [
                    { "id": 1 },
                    { "id": 2, "note": "keep" },
                    "scalar-item"
                ] }
            })
        );
    }

    #[test]
    fn drop_field_missing_key_is_a_no_op() {
        let context = json!({ "input": { "user": { "name": "A" } } });
        let result = execute_modify(
            "drop_field",
            "input.user",
            &drop_condition(&["email"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .unwrap();
        assert_eq!(modified_of(&result), &json!({ "input": { "user": { "name": "A" } } }));
    }

    #[test]
    fn drop_field_scalar_target_fails() {
        let context = json!({ "input": { "n": 1 } });
        assert!(execute_modify(
            "drop_field",
            "input.n",
            &drop_condition(&["x"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .is_err());
    }

    // ── modify: drop_item ─────────────────────────────────────────────────────

    #[test]
    fn drop_item_keeps_non_matching_and_non_object_items() {
        let context = json!({
            "input": { "items": [
                { "status": "" },
                { "status": "ready" },
                42
            ] }
        });

        let result = execute_modify(
            "drop_item",
            "input.items",
            &drop_condition(&["status"], DropOperator::IsEmpty, Value::Null),
            &context,
        )
        .unwrap();

        assert_eq!(
            modified_of(&result),
            &json!({ "input": { "items": [ { "status": "ready" }, 42 ] } })
        );
    }

    #[test]
    fn drop_item_item_without_checked_field_is_kept() {
        let context = json!({ "input": { "items": [ { "other": null }, { "flag": null } ] } });

        let result = execute_modify(
            "drop_item",
            "input.items",
            &drop_condition(&["flag"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .unwrap();

        assert_eq!(
            modified_of(&result),
            &json!({ "input": { "items": [ { "other": null } ] } })
        );
    }

    #[test]
    fn drop_item_non_array_target_fails() {
        let context = json!({ "input": { "items": { "not": "an array" } } });
        assert!(execute_modify(
            "drop_item",
            "input.items",
            &drop_condition(&["x"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .is_err());
    }

    #[test]
    fn unsupported_modification_type_fails() {
        let context = json!({ "input": {} });
        let err = execute_modify(
            "redact",
            "input",
            &drop_condition(&["x"], DropOperator::IsNull, Value::Null),
            &context,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported modification_type"), "{}", err);
    }

    // ── per-guardrail driver ──────────────────────────────────────────────────

    #[test]
    fn actions_run_in_declaration_order_and_modify_chains() {
        let context = json!({
            "input": { "user": { "email": null, "phone": null, "name": "A" } }
        });
        let actions = vec![
            Action::Modify {
                modification_type: "drop_field".to_string(),
                target: "input.user".to_string(),
                condition: drop_condition(&["email"], DropOperator::IsNull, Value::Null),
                priority: 0,
            },
            Action::Modify {
                modification_type: "drop_field".to_string(),
                target: "input.user".to_string(),
                condition: drop_condition(&["phone"], DropOperator::IsNull, Value::Null),
                priority: 0,
            },
        ];

        let results = execute_actions("g-1", &actions, &context, &[], &[]);
        assert_eq!(results.len(), 2);

        // The second modify must see the first one's output.
        assert_eq!(
            modified_of(&results[1]),
            &json!({ "input": { "user": { "name": "A" } } })
        );
    }

    #[test]
    fn failing_action_is_dropped_but_siblings_stand() {
        let context = json!({ "input": { "q": "x" } });
        let actions = vec![
            Action::Modify {
                modification_type: "transmute".to_string(), // unsupported
                target: "input".to_string(),
                condition: drop_condition(&["q"], DropOperator::IsNull, Value::Null),
                priority: 0,
            },
            Action::Block {
                message: "stop".to_string(),
                priority: 0,
            },
        ];

        let results = execute_actions("g-1", &actions, &context, &[], &[]);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], ActionResult::Block { .. }));
    }

    #[test]
    fn unknown_action_kind_is_skipped() {
        let context = json!({ "input": {} });
        let actions = vec![
            Action::Unknown { kind: "escalate".to_string() },
            Action::Warn {
                message: "w".to_string(),
                severity: "low".to_string(),
                allow_proceed: true,
                priority: 0,
            },
        ];

        let results = execute_actions("g-1", &actions, &context, &[], &[]);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], ActionResult::Warn { .. }));
    }

    // ── chain_modify ──────────────────────────────────────────────────────────

    #[test]
    fn chain_modify_threads_data_through_each_step() {
        let context = json!({
            "input": {
                "user": { "email": null, "name": "A" },
                "items": [ { "status": "" }, { "status": "ok" } ]
            }
        });
        let actions = vec![
            Action::Modify {
                modification_type: "drop_field".to_string(),
                target: "input.user".to_string(),
                condition: drop_condition(&["email"], DropOperator::IsNull, Value::Null),
                priority: 0,
            },
            Action::Modify {
                modification_type: "drop_item".to_string(),
                target: "input.items".to_string(),
                condition: drop_condition(&["status"], DropOperator::IsEmpty, Value::Null),
                priority: 0,
            },
        ];

        let (final_data, results) = chain_modify(&actions, &context).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            final_data,
            json!({
                "input": {
                    "user": { "name": "A" },
                    "items": [ { "status": "ok" } ]
                }
            })
        );
        // Original untouched.
        assert_eq!(context["input"]["user"]["email"], Value::Null);
    }
}
