//! Rolling form history
//!
//! Frames are folded into a pending accumulator until a rep (or hold attempt)
//! closes, at which point one [`FormHistoryEntry`] is appended. The history is a
//! bounded window: the oldest entries drop off past the configured limit.

use crate::types::{FormFeedback, FormHistoryEntry, FormSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Default number of entries kept per session
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Number of messages reported in [`FormSummary::common_errors`]
const COMMON_ERROR_COUNT: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PendingRep {
    quality_sum: f64,
    frames: u32,
    errors: Vec<String>,
}

/// Bounded per-session history of rep/hold quality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormHistory {
    entries: VecDeque<FormHistoryEntry>,
    limit: usize,
    pending: PendingRep,
}

impl Default for FormHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl FormHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit: limit.max(1),
            pending: PendingRep::default(),
        }
    }

    /// Fold one analysed frame into the rep in progress
    pub fn observe(&mut self, feedback: &FormFeedback) {
        self.pending.quality_sum += feedback.rep_quality;
        self.pending.frames += 1;
        if !feedback.is_correct {
            for message in &feedback.messages {
                if !self.pending.errors.contains(message) {
                    self.pending.errors.push(message.clone());
                }
            }
        }
    }

    /// Close the rep in progress and append it to the history
    pub fn record(&mut self, rep_index: u32, now: DateTime<Utc>) -> FormHistoryEntry {
        let pending = std::mem::take(&mut self.pending);
        let quality_score = if pending.frames == 0 {
            1.0
        } else {
            (pending.quality_sum / pending.frames as f64).clamp(0.0, 1.0)
        };

        let entry = FormHistoryEntry {
            rep_index,
            quality_score,
            error_messages: pending.errors,
            recorded_at: now,
        };

        self.entries.push_back(entry.clone());
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        entry
    }

    /// Drop the rep in progress without recording it
    pub fn discard_pending(&mut self) {
        self.pending = PendingRep::default();
    }

    pub fn entries(&self) -> impl Iterator<Item = &FormHistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean quality over the recorded entries
    pub fn average_quality(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|e| e.quality_score).sum();
        Some(sum / self.entries.len() as f64)
    }

    /// Most frequent corrective messages across the history
    pub fn common_errors(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            for message in &entry.error_messages {
                *counts.entry(message.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(COMMON_ERROR_COUNT)
            .map(|(message, _)| message.to_string())
            .collect()
    }

    pub fn summary(&self, exercise: &str, rep_count: u32, hold_time: f64) -> FormSummary {
        FormSummary {
            exercise: exercise.to_string(),
            rep_count,
            hold_time,
            average_quality: self.average_quality(),
            total_entries: self.entries.len(),
            common_errors: self.common_errors(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending = PendingRep::default();
    }
}
