//! In-memory implementation of `AlignmentStore`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use palisade_contracts::error::{GuardError, GuardResult};
use palisade_contracts::guardrail::SessionAlignment;
use palisade_core::traits::AlignmentStore;

/// An in-memory alignment store keeping the latest record per session.
///
/// `put` replaces any previous record for the session — the engine only
/// ever reads the most recent alignment.
#[derive(Default)]
pub struct InMemoryAlignmentStore {
    state: Arc<Mutex<HashMap<String, SessionAlignment>>>,
}

impl InMemoryAlignmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest alignment for a session, replacing any previous one.
    pub fn put(&self, session_id: impl Into<String>, alignment: SessionAlignment) {
        self.state
            .lock()
            .expect("alignment store lock poisoned")
            .insert(session_id.into(), alignment);
    }
}

#[async_trait]
impl AlignmentStore for InMemoryAlignmentStore {
    async fn latest_alignment(&self, session_id: &str) -> GuardResult<Option<SessionAlignment>> {
        let state = self.state.lock().map_err(|e| GuardError::StoreUnavailable {
            reason: format!("alignment store lock poisoned: {}", e),
        })?;
        Ok(state.get(session_id).cloned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use palisade_contracts::guardrail::SessionAlignment;
    use palisade_core::traits::AlignmentStore;

    use super::InMemoryAlignmentStore;

    #[tokio::test]
    async fn missing_session_yields_none() {
        let store = InMemoryAlignmentStore::new();
        assert!(store.latest_alignment("s-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_the_previous_record() {
        let store = InMemoryAlignmentStore::new();

        store.put(
            "s-1",
            SessionAlignment {
                tool_rules: Vec::new(),
                disallowed_tools: vec!["shell".to_string()],
            },
        );
        store.put(
            "s-1",
            SessionAlignment {
                tool_rules: Vec::new(),
                disallowed_tools: vec!["browser".to_string()],
            },
        );

        let latest = store.latest_alignment("s-1").await.unwrap().unwrap();
        assert_eq!(latest.disallowed_tools, vec!["browser"]);
    }
}
