//! The should-proceed decision calculus.
//!
//! Reduces every action produced by the non-ignored, non-errored triggered
//! guardrails into the single boolean gate returned to the calling agent.
//! Precedence is strictly: block > blocking warn > everything else.
//!
//! The `warn.allow_proceed` flag lives only in the original action config,
//! never in the `ActionResult` — so the calculator takes the original
//! definitions keyed by guardrail id alongside the results.

use std::collections::HashMap;

use palisade_contracts::action::{Action, ActionResult};
use palisade_contracts::evaluation::TriggeredGuardrail;
use palisade_contracts::guardrail::GuardrailDefinition;

/// Compute the single should-proceed boolean for one evaluation call.
///
/// Ignored and errored guardrails contribute nothing.  Among the remaining
/// triggered guardrails:
///
/// 1. any `block` result → `false`;
/// 2. else, any `warn` result whose guardrail's original config carries a
///    warn action with `allow_proceed = false` → `false`;
/// 3. else (warns that all allow proceeding, modify-only, or no actions at
///    all) → `true`.
pub fn should_proceed(
    results: &[TriggeredGuardrail],
    definitions: &HashMap<String, GuardrailDefinition>,
) -> bool {
    let active: Vec<&TriggeredGuardrail> = results
        .iter()
        .filter(|r| r.triggered && !r.ignored && !r.error)
        .collect();

    // Rule 1: any block wins outright.
    if active
        .iter()
        .any(|r| r.actions.iter().any(|a| matches!(a, ActionResult::Block { .. })))
    {
        return false;
    }

    // Rule 2: a warn blocks when its original config says so.
    for result in &active {
        let warned = result
            .actions
            .iter()
            .any(|a| matches!(a, ActionResult::Warn { .. }));
        if !warned {
            continue;
        }

        let blocking_warn = definitions
            .get(&result.guardrail_id)
            .map(|definition| {
                definition.actions.iter().any(
                    |action| matches!(action, Action::Warn { allow_proceed: false, .. }),
                )
            })
            .unwrap_or(false);

        if blocking_warn {
            return false;
        }
    }

    // Rule 3: modify-only, allowing warns, or nothing at all.
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
