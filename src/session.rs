//! Session manager
//!
//! One [`Session`] per connection, owned exclusively by the task serving that
//! connection. Inbound messages drive the state machine
//! `uninitialized → ready → streaming → (reset → ready)`; every request yields
//! zero or more replies and no request can fail the session itself.

use crate::analyzer::{ExerciseAnalyzer, FrameOutcome, FrameReport, Target};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::SessionRegistry;
use crate::routine::{CompletedSet, RoutineStore};
use crate::types::{ExerciseKind, FormSummary, Landmark, PoseFrame};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Status reply to a `reset`
pub const RESET_MESSAGE: &str = "운동이 초기화되었습니다";

/// Status reply when the routine store refused a completed set
pub const STORE_FAILURE_MESSAGE: &str = "운동 기록 저장에 실패했습니다";

/// Protocol state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for a valid `init`
    Uninitialized,
    /// Exercise selected, no frame analysed since init or reset
    Ready,
    /// At least one frame analysed
    Streaming,
}

pub struct Session {
    id: Uuid,
    config: Arc<AnalyzerConfig>,
    analyzer: Option<ExerciseAnalyzer>,
    status: SessionStatus,
    store: Option<Arc<dyn RoutineStore>>,
    registry: Option<Arc<SessionRegistry>>,
}

impl Session {
    pub fn new(config: Arc<AnalyzerConfig>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            analyzer: None,
            status: SessionStatus::Uninitialized,
            store: None,
            registry: None,
        }
    }

    /// Report fired completions to `store`
    pub fn with_routine_store(mut self, store: Arc<dyn RoutineStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register in `registry` until the session is dropped
    pub fn with_registry(mut self, registry: Arc<SessionRegistry>, peer: impl Into<String>, now: DateTime<Utc>) -> Self {
        registry.register(self.id, peer, now);
        self.registry = Some(registry);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn exercise(&self) -> Option<ExerciseKind> {
        self.analyzer.as_ref().map(|a| a.kind())
    }

    pub fn rep_count(&self) -> u32 {
        self.analyzer.as_ref().map_or(0, |a| a.rep_count())
    }

    pub fn hold_time(&self) -> f64 {
        self.analyzer.as_ref().map_or(0.0, |a| a.hold_time())
    }

    pub fn analyzer(&self) -> Option<&ExerciseAnalyzer> {
        self.analyzer.as_ref()
    }

    /// Parse and handle one raw JSON message
    pub fn handle_text(&mut self, text: &str, now: DateTime<Utc>) -> Vec<ServerMessage> {
        match ClientMessage::from_json(text) {
            Ok(message) => self.handle(message, now),
            Err(err) => {
                warn!(session = %self.id, error = %err, "unparseable client message");
                vec![ServerMessage::error(&err)]
            }
        }
    }

    /// Handle one client message; `now` is the receive time
    pub fn handle(&mut self, message: ClientMessage, now: DateTime<Utc>) -> Vec<ServerMessage> {
        let result = match message {
            ClientMessage::Init {
                exercise,
                target_reps,
                target_time,
            } => self.init(&exercise, target_reps, target_time).map(|reply| vec![reply]),
            ClientMessage::Landmarks {
                landmarks,
                timestamp,
            } => self.landmarks(landmarks, timestamp.unwrap_or(now)),
            ClientMessage::Reset => self.reset().map(|reply| vec![reply]),
            ClientMessage::Summary => self
                .summary()
                .map(|summary| vec![ServerMessage::Summary { summary }]),
        };

        result.unwrap_or_else(|err| vec![ServerMessage::error(&err)])
    }

    fn init(
        &mut self,
        exercise: &str,
        target_reps: Option<i64>,
        target_time: Option<i64>,
    ) -> Result<ServerMessage, AnalysisError> {
        let kind = ExerciseKind::from_korean_name(exercise).map_err(|err| {
            warn!(session = %self.id, exercise, "unsupported exercise");
            err
        })?;
        let target = Target::resolve(kind, target_reps, target_time, &self.config)?;
        let analyzer = ExerciseAnalyzer::new(kind, target, &self.config);
        let guide = analyzer.setup_guide();

        info!(session = %self.id, exercise = kind.as_str(), ?target, "session initialized");
        self.analyzer = Some(analyzer);
        self.status = SessionStatus::Ready;
        if let Some(registry) = &self.registry {
            registry.set_exercise(self.id, kind.korean_name());
        }

        Ok(ServerMessage::InitSuccess {
            exercise: kind.korean_name().to_string(),
            target_reps: target.reps(),
            target_time: target.seconds(),
            is_time_based: kind.is_time_based(),
            camera_guide: guide.camera_guide,
            pose_guide: guide.pose_guide,
        })
    }

    fn landmarks(&mut self, landmarks: Vec<Landmark>, at: DateTime<Utc>) -> Result<Vec<ServerMessage>, AnalysisError> {
        let analyzer = self.analyzer.as_mut().ok_or(AnalysisError::NotInitialized)?;
        let frame = PoseFrame::new(landmarks).map_err(|err| {
            warn!(session = %self.id, error = %err, "malformed frame rejected");
            err
        })?;

        let report = match analyzer.process(&frame, at) {
            FrameOutcome::Analyzed(report) => report,
            // Still one feedback per frame, with counters unchanged
            FrameOutcome::Dropped { report, .. } => return Ok(vec![feedback_reply(report)]),
        };
        self.status = SessionStatus::Streaming;

        let mut replies = Vec::with_capacity(2);
        if report.is_complete {
            let set = CompletedSet {
                session_id: self.id,
                exercise: analyzer.kind().korean_name().to_string(),
                rep_count: report.rep_count,
                hold_seconds: report.hold_time,
                average_quality: analyzer.history().average_quality(),
                completed_at: at,
            };
            if let Some(registry) = &self.registry {
                registry.set_rep_count(self.id, report.rep_count);
            }
            if let Some(store) = &self.store {
                if let Err(err) = store.record_completed_set(set) {
                    warn!(session = %self.id, error = %err, "failed to record completed set");
                    replies.push(ServerMessage::status(STORE_FAILURE_MESSAGE));
                }
            }
        }

        replies.insert(0, feedback_reply(report));
        Ok(replies)
    }

    fn reset(&mut self) -> Result<ServerMessage, AnalysisError> {
        let analyzer = self.analyzer.as_mut().ok_or(AnalysisError::NotInitialized)?;
        analyzer.reset();
        self.status = SessionStatus::Ready;
        if let Some(registry) = &self.registry {
            registry.set_rep_count(self.id, 0);
        }
        info!(session = %self.id, "session reset");
        Ok(ServerMessage::status(RESET_MESSAGE))
    }

    fn summary(&self) -> Result<FormSummary, AnalysisError> {
        self.analyzer
            .as_ref()
            .map(|a| a.summary())
            .ok_or(AnalysisError::NotInitialized)
    }
}

fn feedback_reply(report: FrameReport) -> ServerMessage {
    ServerMessage::Feedback {
        feedback: report.feedback,
        rep_count: report.rep_count,
        hold_time: report.hold_time,
        is_complete: report.is_complete,
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(registry) = &self.registry {
            registry.deregister(self.id);
        }
    }
}
