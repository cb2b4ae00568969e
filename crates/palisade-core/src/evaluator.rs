//! The evaluation orchestrator.
//!
//! One external call flows through a fixed pipeline:
//!
//!   validate context → fetch applicable guardrails → evaluate each
//!   (concurrently, results in fetch order) → aggregate should_proceed →
//!   build response → persist audit record (best-effort) → return
//!
//! Guardrail evaluations never throw across guardrail boundaries: a soft
//! failure (field path, condition, llm judge) downgrades that guardrail to
//! `ignored`, anything else downgrades it to `error`, and both contribute
//! zero actions.  The same engine serves two call shapes — persisted
//! agent-scoped guardrails and ephemeral session-scoped rules.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use palisade_contracts::action::ActionResult;
use palisade_contracts::error::GuardResult;
use palisade_contracts::evaluation::{
    EvaluationMetadata, EvaluationRecord, EvaluationRequest, EvaluationResponse,
    TriggeredGuardrail,
};
use palisade_contracts::guardrail::GuardrailDefinition;
use palisade_engine::{action, condition, proceed, Judge};

use crate::traits::{AlignmentStore, AuditSink, GuardrailStore};

/// Tuning knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Upper bound on concurrently evaluated guardrails per call.  Sized
    /// to the expected number of `llm_judge` conditions — everything else
    /// completes in microseconds.
    pub max_concurrency: usize,
    /// Per-guardrail evaluation timeout.  A guardrail that outlives it is
    /// downgraded to `ignored` and its outstanding judge call is aborted.
    pub guardrail_timeout: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            guardrail_timeout: Duration::from_secs(30),
        }
    }
}

/// One guardrail ready for evaluation, whatever its source.
///
/// Session rules carry no stored id, so the session path derives
/// `session-rule:<tool>` ids to keep result and audit shapes uniform.
struct ApplicableGuardrail {
    id: String,
    name: String,
    definition: GuardrailDefinition,
}

/// The evaluation orchestrator: fetches, evaluates, decides, audits.
///
/// Stateless across calls apart from the audit write — one instance can
/// serve any number of concurrent callers.
pub struct Evaluator {
    judge: Arc<dyn Judge>,
    guardrails: Arc<dyn GuardrailStore>,
    alignments: Arc<dyn AlignmentStore>,
    audit: Arc<dyn AuditSink>,
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Create an evaluator with default tuning.
    pub fn new(
        judge: Arc<dyn Judge>,
        guardrails: Arc<dyn GuardrailStore>,
        alignments: Arc<dyn AlignmentStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self::with_config(judge, guardrails, alignments, audit, EvaluatorConfig::default())
    }

    /// Create an evaluator with explicit tuning.
    pub fn with_config(
        judge: Arc<dyn Judge>,
        guardrails: Arc<dyn GuardrailStore>,
        alignments: Arc<dyn AlignmentStore>,
        audit: Arc<dyn AuditSink>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            judge,
            guardrails,
            alignments,
            audit,
            config,
        }
    }

    /// Evaluate the persisted, agent-scoped guardrails for one call.
    ///
    /// Selection: guardrails assigned to `scope.agent_id`, active, not
    /// archived, oldest first (the store's contract), then filtered
    /// in-process by `trigger.type == timing`.  `process_type` is recorded
    /// for audit scoping but never filters selection.
    pub async fn evaluate_agent(
        &self,
        request: &EvaluationRequest,
    ) -> GuardResult<EvaluationResponse> {
        let agent_id = request.scope.agent_id.as_deref().ok_or_else(|| {
            palisade_contracts::error::GuardError::InvalidRequest {
                reason: "agent evaluation requires scope.agent_id".to_string(),
            }
        })?;
        request.context.validate(request.timing)?;

        let fetched = self.guardrails.guardrails_for_agent(agent_id).await?;
        debug!(
            agent_id = %agent_id,
            fetched = fetched.len(),
            timing = %request.timing,
            process_type = %request.process_type,
            "fetched persisted guardrails"
        );

        let applicable: Vec<ApplicableGuardrail> = fetched
            .into_iter()
            .filter(|g| g.definition.trigger.trigger_type == request.timing)
            .map(|g| ApplicableGuardrail {
                id: g.id,
                name: g.name,
                definition: g.definition,
            })
            .collect();

        self.evaluate_set(request, applicable).await
    }

    /// Evaluate the ephemeral, session-scoped rules for one call.
    ///
    /// Reads the session's latest alignment record.  A `process_name`
    /// listed in `disallowed_tools` short-circuits with a single synthetic
    /// block — no rule is evaluated.  Otherwise the per-tool rules are
    /// filtered by timing and evaluated exactly like persisted guardrails.
    pub async fn evaluate_session(
        &self,
        request: &EvaluationRequest,
    ) -> GuardResult<EvaluationResponse> {
        let session_id = request.scope.session_id.as_deref().ok_or_else(|| {
            palisade_contracts::error::GuardError::InvalidRequest {
                reason: "session evaluation requires scope.session_id".to_string(),
            }
        })?;
        request.context.validate(request.timing)?;

        let alignment = self
            .alignments
            .latest_alignment(session_id)
            .await?
            .unwrap_or_default();

        if alignment
            .disallowed_tools
            .iter()
            .any(|tool| tool == &request.process_name)
        {
            info!(
                session_id = %session_id,
                tool = %request.process_name,
                "disallowed tool, short-circuiting with a synthetic block"
            );

            let start = Instant::now();
            let synthetic = TriggeredGuardrail::triggered(
                format!("disallowed-tool:{}", request.process_name),
                format!("Disallowed tool '{}'", request.process_name),
                Vec::new(),
                vec![ActionResult::Block {
                    should_block: true,
                    message: format!(
                        "Tool '{}' is not allowed in this session",
                        request.process_name
                    ),
                    reason: "Tool is listed in the session's disallowed tools".to_string(),
                }],
            );
            return Ok(self
                .finish(request, start, vec![synthetic], &HashMap::new())
                .await);
        }

        let applicable: Vec<ApplicableGuardrail> = alignment
            .tool_rules
            .into_iter()
            .filter(|rule| rule.definition.trigger.trigger_type == request.timing)
            .map(|rule| ApplicableGuardrail {
                id: format!("session-rule:{}", rule.tool_name),
                name: format!("Session rule for '{}'", rule.tool_name),
                definition: rule.definition,
            })
            .collect();

        self.evaluate_set(request, applicable).await
    }

    // ── Shared evaluation core ────────────────────────────────────────────────

    /// Evaluate an ordered guardrail set against the request context.
    ///
    /// Guardrails run concurrently (bounded by `max_concurrency`), but
    /// `buffered` yields results in input order — evaluation order is
    /// stable and independent of concurrency, which downstream consumers
    /// rely on.
    async fn evaluate_set(
        &self,
        request: &EvaluationRequest,
        applicable: Vec<ApplicableGuardrail>,
    ) -> GuardResult<EvaluationResponse> {
        let start = Instant::now();
        let context = request.context.root();

        // The should-proceed calculator reads `warn.allow_proceed` from
        // the original definitions, keyed by guardrail id.
        let definitions: HashMap<String, GuardrailDefinition> = applicable
            .iter()
            .map(|g| (g.id.clone(), g.definition.clone()))
            .collect();

        let results: Vec<TriggeredGuardrail> = stream::iter(applicable.iter())
            .map(|guardrail| self.evaluate_one(guardrail, context))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        Ok(self.finish(request, start, results, &definitions).await)
    }

    /// Evaluate one guardrail under the per-guardrail timeout.
    async fn evaluate_one(
        &self,
        guardrail: &ApplicableGuardrail,
        context: &Value,
    ) -> TriggeredGuardrail {
        match tokio::time::timeout(
            self.config.guardrail_timeout,
            self.evaluate_guardrail(guardrail, context),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    guardrail_id = %guardrail.id,
                    timeout_ms = self.config.guardrail_timeout.as_millis() as u64,
                    "guardrail evaluation timed out"
                );
                TriggeredGuardrail::ignored(
                    &guardrail.id,
                    &guardrail.name,
                    format!(
                        "evaluation timed out after {}ms",
                        self.config.guardrail_timeout.as_millis()
                    ),
                )
            }
        }
    }

    /// The per-guardrail state machine:
    /// conditions → [ignored | error | not-triggered | triggered+actions].
    ///
    /// Errors never cross the guardrail boundary.  Soft failures mean the
    /// guardrail cannot be evaluated against this input (ignored); any
    /// other failure is unexpected (error).  Both contribute zero actions.
    async fn evaluate_guardrail(
        &self,
        guardrail: &ApplicableGuardrail,
        context: &Value,
    ) -> TriggeredGuardrail {
        let trigger = &guardrail.definition.trigger;

        match condition::evaluate_all(
            self.judge.as_ref(),
            context,
            &trigger.conditions,
            trigger.logic,
        )
        .await
        {
            Ok((false, _)) => {
                debug!(guardrail_id = %guardrail.id, "guardrail not triggered");
                TriggeredGuardrail::not_triggered(&guardrail.id, &guardrail.name)
            }

            Ok((true, matched)) => {
                debug!(
                    guardrail_id = %guardrail.id,
                    matched = ?matched,
                    "guardrail triggered, executing actions"
                );
                let actions = action::execute_actions(
                    &guardrail.id,
                    &guardrail.definition.actions,
                    context,
                    &matched,
                    &trigger.conditions,
                );
                TriggeredGuardrail::triggered(&guardrail.id, &guardrail.name, matched, actions)
            }

            Err(e) if e.is_soft() => {
                debug!(
                    guardrail_id = %guardrail.id,
                    reason = %e,
                    "guardrail ignored: cannot be evaluated against this input"
                );
                TriggeredGuardrail::ignored(&guardrail.id, &guardrail.name, e.to_string())
            }

            Err(e) => {
                warn!(
                    guardrail_id = %guardrail.id,
                    error = %e,
                    "unexpected failure evaluating guardrail"
                );
                TriggeredGuardrail::errored(&guardrail.id, &guardrail.name, e.to_string())
            }
        }
    }

    /// Aggregate results into a response and write the audit record.
    ///
    /// Audit persistence is fire-and-forget relative to the caller: a sink
    /// failure is logged and never changes `should_proceed` or raises.
    async fn finish(
        &self,
        request: &EvaluationRequest,
        start: Instant,
        results: Vec<TriggeredGuardrail>,
        definitions: &HashMap<String, GuardrailDefinition>,
    ) -> EvaluationResponse {
        let should_proceed = proceed::should_proceed(&results, definitions);

        // evaluated = fetched − ignored; errored guardrails were still
        // evaluated, they just failed.
        let evaluated_ids: Vec<String> = results
            .iter()
            .filter(|r| !r.ignored)
            .map(|r| r.guardrail_id.clone())
            .collect();
        let triggered_ids: Vec<String> = results
            .iter()
            .filter(|r| r.triggered)
            .map(|r| r.guardrail_id.clone())
            .collect();
        let ignored_ids: Vec<String> = results
            .iter()
            .filter(|r| r.ignored)
            .map(|r| r.guardrail_id.clone())
            .collect();

        let request_id = Uuid::new_v4();
        let evaluation_time_ms = start.elapsed().as_millis() as u64;

        info!(
            %request_id,
            process_name = %request.process_name,
            timing = %request.timing,
            evaluated = evaluated_ids.len(),
            triggered = triggered_ids.len(),
            ignored = ignored_ids.len(),
            should_proceed,
            "evaluation complete"
        );

        let record = EvaluationRecord {
            request_id,
            scope: request.scope.clone(),
            timing: request.timing,
            process_type: request.process_type,
            process_name: request.process_name.clone(),
            context: request.context.root().clone(),
            evaluated_guardrail_ids: evaluated_ids.clone(),
            triggered_guardrail_ids: triggered_ids.clone(),
            ignored_guardrail_ids: ignored_ids.clone(),
            results: results.clone(),
            should_proceed,
            evaluation_time_ms,
            created_at: Utc::now(),
        };

        if let Err(e) = self.audit.record(&record).await {
            warn!(%request_id, error = %e, "audit write failed; response unaffected");
        }

        EvaluationResponse {
            request_id,
            metadata: EvaluationMetadata {
                evaluation_time_ms,
                evaluated_guardrails_count: evaluated_ids.len(),
                triggered_guardrails_count: triggered_ids.len(),
                ignored_guardrails_count: ignored_ids.len(),
            },
            triggered_guardrails: results,
            should_proceed,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
