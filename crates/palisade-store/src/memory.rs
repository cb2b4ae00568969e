//! In-memory implementation of `GuardrailStore`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use palisade_contracts::error::{GuardError, GuardResult};
use palisade_contracts::guardrail::Guardrail;
use palisade_core::traits::GuardrailStore;

/// An in-memory guardrail store.
///
/// `guardrails_for_agent` applies the persisted-path selection contract:
/// assigned to the agent, active, not archived, ordered by creation time
/// ascending (ties broken by id for a total order).
#[derive(Default)]
pub struct InMemoryGuardrailStore {
    state: Arc<Mutex<Vec<Guardrail>>>,
}

impl InMemoryGuardrailStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a guardrail record.
    pub fn insert(&self, guardrail: Guardrail) {
        self.state
            .lock()
            .expect("guardrail store lock poisoned")
            .push(guardrail);
    }

    /// Number of records held, regardless of state.
    pub fn len(&self) -> usize {
        self.state.lock().expect("guardrail store lock poisoned").len()
    }

    /// True when no records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GuardrailStore for InMemoryGuardrailStore {
    async fn guardrails_for_agent(&self, agent_id: &str) -> GuardResult<Vec<Guardrail>> {
        let state = self.state.lock().map_err(|e| GuardError::StoreUnavailable {
            reason: format!("guardrail store lock poisoned: {}", e),
        })?;

        let mut selected: Vec<Guardrail> = state
            .iter()
            .filter(|g| g.agent_id == agent_id && g.active && !g.archived)
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            agent_id = %agent_id,
            selected = selected.len(),
            "selected applicable guardrails"
        );

        Ok(selected)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use palisade_contracts::guardrail::{
        Guardrail, GuardrailDefinition, GuardrailMetadata, Timing, Trigger, TriggerLogic,
    };
    use palisade_core::traits::GuardrailStore;

    use super::InMemoryGuardrailStore;

    fn guardrail(id: &str, agent: &str, seconds: i64, active: bool, archived: bool) -> Guardrail {
        Guardrail {
            id: id.to_string(),
            name: format!("guardrail {}", id),
            agent_id: agent.to_string(),
            definition: GuardrailDefinition {
                trigger: Trigger {
                    trigger_type: Timing::OnStart,
                    logic: TriggerLogic::And,
                    conditions: Vec::new(),
                },
                actions: Vec::new(),
                metadata: GuardrailMetadata::default(),
            },
            active,
            archived,
            created_at: Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn selects_only_active_unarchived_for_the_agent() {
        let store = InMemoryGuardrailStore::new();
        store.insert(guardrail("g-keep", "agent-1", 0, true, false));
        store.insert(guardrail("g-inactive", "agent-1", 1, false, false));
        store.insert(guardrail("g-archived", "agent-1", 2, true, true));
        store.insert(guardrail("g-other-agent", "agent-2", 3, true, false));

        let selected = store.guardrails_for_agent("agent-1").await.unwrap();
        let ids: Vec<&str> = selected.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g-keep"]);
    }

    #[tokio::test]
    async fn orders_oldest_first() {
        let store = InMemoryGuardrailStore::new();
        store.insert(guardrail("g-new", "agent-1", 100, true, false));
        store.insert(guardrail("g-old", "agent-1", 0, true, false));
        store.insert(guardrail("g-mid", "agent-1", 50, true, false));

        let selected = store.guardrails_for_agent("agent-1").await.unwrap();
        let ids: Vec<&str> = selected.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g-old", "g-mid", "g-new"]);
    }

    #[tokio::test]
    async fn creation_time_ties_break_by_id() {
        let store = InMemoryGuardrailStore::new();
        store.insert(guardrail("g-b", "agent-1", 0, true, false));
        store.insert(guardrail("g-a", "agent-1", 0, true, false));

        let selected = store.guardrails_for_agent("agent-1").await.unwrap();
        let ids: Vec<&str> = selected.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g-a", "g-b"]);
    }

    #[tokio::test]
    async fn unknown_agent_gets_an_empty_set() {
        let store = InMemoryGuardrailStore::new();
        store.insert(guardrail("g-1", "agent-1", 0, true, false));

        let selected = store.guardrails_for_agent("agent-unknown").await.unwrap();
        assert!(selected.is_empty());
    }
}
