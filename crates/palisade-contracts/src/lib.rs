//! # palisade-contracts
//!
//! Shared types, schemas, and contracts for the Palisade guardrail engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod action;
pub mod error;
pub mod evaluation;
pub mod guardrail;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::action::{Action, ActionResult, DEFAULT_BLOCK_MESSAGE, DEFAULT_WARN_SEVERITY};
    use crate::error::GuardError;
    use crate::evaluation::EvaluationContext;
    use crate::guardrail::{ConditionOperator, GuardrailDefinition, Timing, TriggerLogic};

    // ── Action deserialization ───────────────────────────────────────────────

    #[test]
    fn block_action_defaults_message() {
        let action: Action = serde_json::from_value(json!({ "type": "block" })).unwrap();
        match action {
            Action::Block { message, priority } => {
                assert_eq!(message, DEFAULT_BLOCK_MESSAGE);
                assert_eq!(priority, 0);
            }
            other => panic!("expected Block, got {:?}", other),
        }
    }

    #[test]
    fn warn_action_defaults_severity_and_allow_proceed() {
        let action: Action =
            serde_json::from_value(json!({ "type": "warn", "message": "careful" })).unwrap();
        match action {
            Action::Warn { message, severity, allow_proceed, .. } => {
                assert_eq!(message, "careful");
                assert_eq!(severity, DEFAULT_WARN_SEVERITY);
                assert!(allow_proceed, "allow_proceed must default to true");
            }
            other => panic!("expected Warn, got {:?}", other),
        }
    }

    #[test]
    fn modify_action_round_trips() {
        let value = json!({
            "type": "modify",
            "modification_type": "drop_field",
            "target": "input.user",
            "condition": { "fields": ["email"], "operator": "is_null" }
        });
        let action: Action = serde_json::from_value(value).unwrap();
        match &action {
            Action::Modify { modification_type, target, condition, .. } => {
                assert_eq!(modification_type, "drop_field");
                assert_eq!(target, "input.user");
                assert_eq!(condition.fields, vec!["email"]);
            }
            other => panic!("expected Modify, got {:?}", other),
        }

        // Serialized form keeps the `type` tag.
        let back = serde_json::to_value(&action).unwrap();
        assert_eq!(back["type"], "modify");
    }

    /// An unrecognized action type must deserialize (to Unknown), never fail —
    /// the executor skips it at runtime.
    #[test]
    fn unknown_action_type_is_preserved() {
        let action: Action =
            serde_json::from_value(json!({ "type": "escalate", "to": "oncall" })).unwrap();
        match action {
            Action::Unknown { kind } => assert_eq!(kind, "escalate"),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn action_missing_type_is_rejected() {
        let result: Result<Action, _> = serde_json::from_value(json!({ "message": "x" }));
        assert!(result.is_err(), "an action without a type field is malformed");
    }

    // ── Definition wire format ───────────────────────────────────────────────

    #[test]
    fn definition_round_trips() {
        let value = json!({
            "trigger": {
                "type": "on_start",
                "logic": "or",
                "conditions": [
                    { "field": "input.query", "operator": "contains", "value": "secret" }
                ]
            },
            "actions": [ { "type": "block", "message": "no secrets" } ],
            "metadata": { "severity": "high", "tags": ["pii"] }
        });

        let def: GuardrailDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(def.trigger.trigger_type, Timing::OnStart);
        assert_eq!(def.trigger.logic, TriggerLogic::Or);
        assert_eq!(def.trigger.conditions.len(), 1);
        assert_eq!(def.trigger.conditions[0].operator, ConditionOperator::Contains);
        assert_eq!(def.actions.len(), 1);
        assert_eq!(def.metadata.severity.as_deref(), Some("high"));

        let back = serde_json::to_value(&def).unwrap();
        assert_eq!(back["trigger"]["type"], "on_start");
        assert_eq!(back["trigger"]["conditions"][0]["operator"], "contains");
    }

    #[test]
    fn trigger_logic_defaults_to_and() {
        let def: GuardrailDefinition = serde_json::from_value(json!({
            "trigger": { "type": "on_end", "conditions": [] }
        }))
        .unwrap();
        assert_eq!(def.trigger.logic, TriggerLogic::And);
        assert!(def.actions.is_empty());
    }

    #[test]
    fn operator_wire_names_are_snake_case() {
        let op: ConditionOperator = serde_json::from_value(json!("size_gte")).unwrap();
        assert_eq!(op, ConditionOperator::SizeGte);
        assert_eq!(serde_json::to_value(ConditionOperator::LlmJudge).unwrap(), "llm_judge");
    }

    // ── Context validation ───────────────────────────────────────────────────

    #[test]
    fn context_requires_input_object() {
        let ctx = EvaluationContext::new(json!({ "input": { "q": "hi" } }));
        assert!(ctx.validate(Timing::OnStart).is_ok());

        let missing = EvaluationContext::new(json!({ "other": 1 }));
        assert!(matches!(
            missing.validate(Timing::OnStart),
            Err(GuardError::InvalidRequest { .. })
        ));

        let non_object = EvaluationContext::new(json!({ "input": "text" }));
        assert!(matches!(
            non_object.validate(Timing::OnStart),
            Err(GuardError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn on_end_context_requires_output_object() {
        let ctx = EvaluationContext::new(json!({ "input": {} }));
        assert!(ctx.validate(Timing::OnStart).is_ok());
        assert!(matches!(
            ctx.validate(Timing::OnEnd),
            Err(GuardError::InvalidRequest { .. })
        ));

        let full = EvaluationContext::new(json!({ "input": {}, "output": { "text": "done" } }));
        assert!(full.validate(Timing::OnEnd).is_ok());
    }

    // ── ActionResult wire format ─────────────────────────────────────────────

    #[test]
    fn action_result_block_round_trips() {
        let result = ActionResult::Block {
            should_block: true,
            message: "stop".to_string(),
            reason: "Field 'input.q' matched condition (operator: contains)".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "block");
        assert_eq!(value["should_block"], true);

        let back: ActionResult = serde_json::from_value(value).unwrap();
        assert!(matches!(back, ActionResult::Block { should_block: true, .. }));
    }

    // ── Error classification ─────────────────────────────────────────────────

    #[test]
    fn soft_errors_are_path_condition_and_judge() {
        assert!(GuardError::FieldPathResolution { reason: "x".into() }.is_soft());
        assert!(GuardError::ConditionEvaluation { reason: "x".into() }.is_soft());
        assert!(GuardError::LlmJudge { reason: "x".into() }.is_soft());

        assert!(!GuardError::ActionExecution { reason: "x".into() }.is_soft());
        assert!(!GuardError::InvalidRequest { reason: "x".into() }.is_soft());
        assert!(!GuardError::AuditWriteFailed { reason: "x".into() }.is_soft());
        assert!(!GuardError::Internal { reason: "x".into() }.is_soft());
    }

    #[test]
    fn error_display_carries_reason() {
        let err = GuardError::FieldPathResolution {
            reason: "key 'user' not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("field path resolution failed"));
        assert!(msg.contains("key 'user' not found"));
    }
}
