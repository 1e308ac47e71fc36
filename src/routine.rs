//! Completed-set sink
//!
//! The session manager hands every fired completion to a [`RoutineStore`]. The
//! store is the only consumer that must never see a duplicate, which is why
//! completion is debounced upstream.

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// One finished set as reported to the routine store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSet {
    pub session_id: Uuid,
    /// Korean exercise name
    pub exercise: String,
    pub rep_count: u32,
    pub hold_seconds: f64,
    pub average_quality: Option<f64>,
    pub completed_at: DateTime<Utc>,
}

/// Downstream consumer of completion events
pub trait RoutineStore: Send + Sync {
    fn record_completed_set(&self, set: CompletedSet) -> Result<(), AnalysisError>;
}

/// Process-local store, mainly for tests and the offline `run` mode
#[derive(Debug, Default)]
pub struct InMemoryRoutineStore {
    sets: Mutex<Vec<CompletedSet>>,
}

impl InMemoryRoutineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded set, oldest first
    pub fn sets(&self) -> Vec<CompletedSet> {
        self.sets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RoutineStore for InMemoryRoutineStore {
    fn record_completed_set(&self, set: CompletedSet) -> Result<(), AnalysisError> {
        let mut sets = self
            .sets
            .lock()
            .map_err(|_| AnalysisError::RoutineStore("routine store lock poisoned".to_string()))?;
        sets.push(set);
        Ok(())
    }
}
