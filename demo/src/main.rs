//! Palisade Guardrail Engine — Demo CLI
//!
//! Runs one or all of the three demo scenarios.  Each scenario uses real
//! Palisade components (evaluator, in-memory stores, hash-chained audit
//! sink) wired together with sample guardrails.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- block-secret
//!   cargo run -p demo -- scrub-fields
//!   cargo run -p demo -- session-tools

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use palisade_audit::InMemoryAuditSink;
use palisade_contracts::action::{Action, DropCondition, DropOperator};
use palisade_contracts::error::GuardResult;
use palisade_contracts::evaluation::{
    EvaluationContext, EvaluationRequest, EvaluationResponse, EvaluationScope, ProcessType,
};
use palisade_contracts::guardrail::{
    Condition, ConditionOperator, Guardrail, GuardrailDefinition, GuardrailMetadata,
    SessionAlignment, Timing, ToolRule, Trigger, TriggerLogic,
};
use palisade_core::Evaluator;
use palisade_engine::Judge;
use palisade_store::{InMemoryAlignmentStore, InMemoryGuardrailStore};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Palisade — declarative guardrails for AI agent tool/LLM calls.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Palisade guardrail engine demo",
    long_about = "Runs Palisade demo scenarios showing condition evaluation,\n\
                  block/warn/modify actions, session tool rules, and the\n\
                  hash-chained audit trail."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: block a tool call whose input mentions a secret.
    BlockSecret,
    /// Scenario 2: scrub null fields from the input, then warn.
    ScrubFields,
    /// Scenario 3: session rules with a disallowed tool.
    SessionTools,
}

// ── Offline judge ─────────────────────────────────────────────────────────────

/// A deterministic stand-in for a chat-completion provider: the content
/// "satisfies" the criteria when it contains the criteria's last word.
struct KeywordJudge;

#[async_trait]
impl Judge for KeywordJudge {
    async fn judge(&self, content: &str, criteria: &str) -> GuardResult<bool> {
        let keyword = criteria
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        Ok(!keyword.is_empty() && content.to_lowercase().contains(&keyword))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::BlockSecret => block_secret().await,
        Command::ScrubFields => scrub_fields().await,
        Command::SessionTools => session_tools().await,
    };

    match result {
        Ok(()) => println!("All selected scenarios completed."),
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_all() -> GuardResult<()> {
    block_secret().await?;
    scrub_fields().await?;
    session_tools().await?;
    Ok(())
}

// ── Builder helpers ───────────────────────────────────────────────────────────

fn guardrail(id: &str, name: &str, definition: GuardrailDefinition) -> Guardrail {
    Guardrail {
        id: id.to_string(),
        name: name.to_string(),
        agent_id: "demo-agent".to_string(),
        definition,
        active: true,
        archived: false,
        created_at: Utc::now(),
    }
}

fn agent_request(
    timing: Timing,
    process_name: &str,
    context: serde_json::Value,
) -> EvaluationRequest {
    EvaluationRequest {
        scope: EvaluationScope {
            agent_id: Some("demo-agent".to_string()),
            ..EvaluationScope::default()
        },
        timing,
        process_type: ProcessType::Tool,
        process_name: process_name.to_string(),
        context: EvaluationContext::new(context),
    }
}

fn session_request(process_name: &str, context: serde_json::Value) -> EvaluationRequest {
    EvaluationRequest {
        scope: EvaluationScope {
            session_id: Some("demo-session".to_string()),
            ..EvaluationScope::default()
        },
        timing: Timing::OnStart,
        process_type: ProcessType::Tool,
        process_name: process_name.to_string(),
        context: EvaluationContext::new(context),
    }
}

fn print_outcome(label: &str, response: &EvaluationResponse) {
    println!(
        "  {:<34} should_proceed={} triggered={} ignored={}",
        label,
        response.should_proceed,
        response.metadata.triggered_guardrails_count,
        response.metadata.ignored_guardrails_count
    );
    for result in &response.triggered_guardrails {
        for action in &result.actions {
            println!("      [{}] {:?}", result.guardrail_name, action);
        }
    }
}

// ── Scenario 1: block on secret ───────────────────────────────────────────────

async fn block_secret() -> GuardResult<()> {
    println!();
    println!("Scenario 1: block a tool call whose input mentions a secret");
    println!("-----------------------------------------------------------");

    let store = InMemoryGuardrailStore::new();
    store.insert(guardrail(
        "gr-no-secrets",
        "No secrets in queries",
        GuardrailDefinition {
            trigger: Trigger {
                trigger_type: Timing::OnStart,
                logic: TriggerLogic::And,
                conditions: vec![Condition {
                    field: "input.query".to_string(),
                    operator: ConditionOperator::Contains,
                    value: json!("secret"),
                }],
            },
            actions: vec![Action::Block {
                message: "Queries must not reference secrets".to_string(),
                priority: 0,
            }],
            metadata: GuardrailMetadata {
                severity: Some("high".to_string()),
                tags: vec!["dlp".to_string()],
                description: Some("Blocks secret exfiltration attempts".to_string()),
            },
        },
    ));

    let audit = InMemoryAuditSink::new();
    let evaluator = Evaluator::new(
        Arc::new(KeywordJudge),
        Arc::new(store),
        Arc::new(InMemoryAlignmentStore::new()),
        Arc::new(audit.clone()),
    );

    let benign = evaluator
        .evaluate_agent(&agent_request(
            Timing::OnStart,
            "search",
            json!({ "input": { "query": "weather in paris" } }),
        ))
        .await?;
    print_outcome("benign query:", &benign);

    let blocked = evaluator
        .evaluate_agent(&agent_request(
            Timing::OnStart,
            "search",
            json!({ "input": { "query": "read the secret key file" } }),
        ))
        .await?;
    print_outcome("query mentioning a secret:", &blocked);

    println!(
        "  audit: {} records, chain intact: {}",
        audit.export().entries.len(),
        audit.verify_integrity()
    );
    Ok(())
}

// ── Scenario 2: scrub fields, then warn ───────────────────────────────────────

async fn scrub_fields() -> GuardResult<()> {
    println!();
    println!("Scenario 2: scrub null contact fields, then warn");
    println!("------------------------------------------------");

    let store = InMemoryGuardrailStore::new();
    store.insert(guardrail(
        "gr-scrub-contacts",
        "Scrub empty contact fields",
        GuardrailDefinition {
            trigger: Trigger {
                trigger_type: Timing::OnStart,
                logic: TriggerLogic::Or,
                conditions: vec![Condition {
                    field: "input.user.name".to_string(),
                    operator: ConditionOperator::SizeGt,
                    value: json!(0),
                }],
            },
            actions: vec![
                Action::Modify {
                    modification_type: "drop_field".to_string(),
                    target: "input.user".to_string(),
                    condition: DropCondition {
                        fields: vec!["*".to_string()],
                        operator: DropOperator::IsNull,
                        value: serde_json::Value::Null,
                    },
                    priority: 0,
                },
                Action::Warn {
                    message: "Null contact fields were dropped".to_string(),
                    severity: "low".to_string(),
                    allow_proceed: true,
                    priority: 0,
                },
            ],
            metadata: GuardrailMetadata::default(),
        },
    ));

    let audit = InMemoryAuditSink::new();
    let evaluator = Evaluator::new(
        Arc::new(KeywordJudge),
        Arc::new(store),
        Arc::new(InMemoryAlignmentStore::new()),
        Arc::new(audit.clone()),
    );

    let response = evaluator
        .evaluate_agent(&agent_request(
            Timing::OnStart,
            "update-profile",
            json!({ "input": { "user": { "name": "Ada", "email": null, "phone": null } } }),
        ))
        .await?;
    print_outcome("profile with null fields:", &response);

    println!(
        "  audit: {} records, chain intact: {}",
        audit.export().entries.len(),
        audit.verify_integrity()
    );
    Ok(())
}

// ── Scenario 3: session tool rules ────────────────────────────────────────────

async fn session_tools() -> GuardResult<()> {
    println!();
    println!("Scenario 3: session rules with a disallowed tool");
    println!("------------------------------------------------");

    let alignments = InMemoryAlignmentStore::new();
    alignments.put(
        "demo-session",
        SessionAlignment {
            tool_rules: vec![ToolRule {
                tool_name: "web-search".to_string(),
                definition: GuardrailDefinition {
                    trigger: Trigger {
                        trigger_type: Timing::OnStart,
                        logic: TriggerLogic::And,
                        conditions: vec![Condition {
                            field: "input.query".to_string(),
                            operator: ConditionOperator::LlmJudge,
                            value: json!("is the user asking about competitors"),
                        }],
                    },
                    actions: vec![Action::Warn {
                        message: "Competitor research flagged for review".to_string(),
                        severity: "medium".to_string(),
                        allow_proceed: true,
                        priority: 0,
                    }],
                    metadata: GuardrailMetadata::default(),
                },
            }],
            disallowed_tools: vec!["shell".to_string()],
        },
    );

    let audit = InMemoryAuditSink::new();
    let evaluator = Evaluator::new(
        Arc::new(KeywordJudge),
        Arc::new(InMemoryGuardrailStore::new()),
        Arc::new(alignments),
        Arc::new(audit.clone()),
    );

    let blocked = evaluator
        .evaluate_session(&session_request(
            "shell",
            json!({ "input": { "command": "rm -rf /" } }),
        ))
        .await?;
    print_outcome("disallowed tool 'shell':", &blocked);

    let flagged = evaluator
        .evaluate_session(&session_request(
            "web-search",
            json!({ "input": { "query": "pricing pages of our competitors" } }),
        ))
        .await?;
    print_outcome("judged web-search call:", &flagged);

    println!(
        "  audit: {} records, chain intact: {}",
        audit.export().entries.len(),
        audit.verify_integrity()
    );
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Palisade — Guardrails for AI Agent Tool Calls");
    println!("=============================================");
    println!();
    println!("Evaluation pipeline per call:");
    println!("  [1] Fetch applicable guardrails (agent-scoped or session-scoped)");
    println!("  [2] Evaluate trigger conditions (AND/OR, llm_judge via provider)");
    println!("  [3] Execute actions: block / warn / modify (on a deep copy)");
    println!("  [4] Reduce to a single should_proceed decision");
    println!("  [5] Append an immutable record to the SHA-256 audit chain");
    println!();
}
