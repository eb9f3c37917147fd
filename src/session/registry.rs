//! Process-wide session registry
//!
//! Sole owner of the id → agent-handle mapping. Insert, lookup and remove
//! are individually atomic behind one async mutex; lookups clone the Arc
//! out so the lock is never held across a long-running agent operation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::SessionError;
use super::handle::SessionHandle;

/// Liveness of one registered session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Dead,
}

/// One row of a status listing
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusEntry {
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Arc<SessionHandle>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, handle: Arc<SessionHandle>) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(handle.id().to_string(), handle);
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).cloned()
    }

    pub async fn remove(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id)
    }

    /// Terminate a session and drop its entry.
    ///
    /// An unknown id is a NotFound outcome and mutates nothing. A failed
    /// termination is reported, but the entry is removed regardless: a
    /// handle whose terminate failed is unusable either way.
    pub async fn close(&self, session_id: &str) -> Result<(), SessionError> {
        let Some(handle) = self.remove(session_id).await else {
            return Err(SessionError::NotFound);
        };

        handle.terminate().await.map_err(|message| {
            SessionError::Terminate {
                session_id: session_id.to_string(),
                message,
            }
        })
    }

    /// Probe every registered session and report its liveness.
    ///
    /// Dead sessions are reported, not removed — removal only happens via
    /// explicit close or bootstrap cleanup.
    pub async fn list_status(&self) -> Vec<SessionStatusEntry> {
        let handles: Vec<Arc<SessionHandle>> = {
            let sessions = self.sessions.lock().await;
            sessions.values().cloned().collect()
        };

        let mut entries = Vec::with_capacity(handles.len());
        for handle in handles {
            let status = if handle.is_alive().await {
                SessionStatus::Active
            } else {
                SessionStatus::Dead
            };
            entries.push(SessionStatusEntry {
                session_id: handle.id().to_string(),
                status,
            });
        }

        entries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        entries
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closing_unknown_session_is_not_found_and_mutates_nothing() {
        let registry = SessionRegistry::new();

        let result = registry.close("no-such-session").await;
        assert!(matches!(result, Err(SessionError::NotFound)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn lookup_of_unknown_session_is_none() {
        let registry = SessionRegistry::new();
        assert!(registry.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn empty_registry_lists_no_sessions() {
        let registry = SessionRegistry::new();
        assert!(registry.list_status().await.is_empty());
        assert_eq!(registry.len().await, 0);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::Dead).unwrap(),
            "\"dead\""
        );
    }
}
