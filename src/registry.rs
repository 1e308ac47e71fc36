//! Process-wide session registry
//!
//! Introspection only: sessions register on connect, update on init and
//! completion, and deregister on disconnect. Per-frame processing never touches
//! the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Snapshot of one live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: Uuid,
    /// Remote address or other connection label
    pub peer: String,
    /// Korean exercise name once initialised
    pub exercise: Option<String>,
    pub rep_count: u32,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SessionInfo>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoned locks are recovered; every write is a single map operation
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionInfo>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, id: Uuid, peer: impl Into<String>, now: DateTime<Utc>) {
        self.lock().insert(
            id,
            SessionInfo {
                id,
                peer: peer.into(),
                exercise: None,
                rep_count: 0,
                connected_at: now,
            },
        );
    }

    pub fn set_exercise(&self, id: Uuid, exercise: &str) {
        if let Some(info) = self.lock().get_mut(&id) {
            info.exercise = Some(exercise.to_string());
            info.rep_count = 0;
        }
    }

    pub fn set_rep_count(&self, id: Uuid, rep_count: u32) {
        if let Some(info) = self.lock().get_mut(&id) {
            info.rep_count = rep_count;
        }
    }

    pub fn deregister(&self, id: Uuid) -> Option<SessionInfo> {
        self.lock().remove(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<SessionInfo> {
        self.lock().get(&id).cloned()
    }

    /// Live sessions ordered by connection time
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.lock().values().cloned().collect();
        sessions.sort_by(|a, b| a.connected_at.cmp(&b.connected_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
