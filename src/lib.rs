//! Posture Coach - real-time exercise posture analysis engine
//!
//! Posture Coach turns a stream of 33-point body-landmark frames into per-frame
//! form feedback, repetition counts, hold-time tracking and exactly-once
//! completion events: smoothing → rule evaluation → rep/hold state machine →
//! completion debounce.
//!
//! ## Modules
//!
//! - **Analysis**: geometry, landmark smoothing, per-exercise rule sets, rep/hold
//!   state machines and completion debouncing
//! - **Sessions**: the JSON protocol state machine, one session per connection
//! - **Server** (feature `server`): WebSocket front-end with one task per connection

pub mod analyzer;
pub mod config;
pub mod counter;
pub mod debounce;
pub mod error;
pub mod exercises;
pub mod geometry;
pub mod history;
pub mod protocol;
pub mod registry;
pub mod routine;
pub mod session;
pub mod smoother;
pub mod types;

#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod testing;

pub use analyzer::{ExerciseAnalyzer, FrameOutcome, FrameReport, Target};
pub use config::{AnalyzerConfig, ServerConfig};
pub use error::AnalysisError;
pub use exercises::{rules_for, ExerciseRules, SetupGuide};
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{SessionInfo, SessionRegistry};
pub use routine::{CompletedSet, InMemoryRoutineStore, RoutineStore};
pub use session::{Session, SessionStatus};
pub use types::{ExerciseKind, ExercisePhase, FormFeedback, FormSummary, Landmark, PoseFrame};

#[cfg(feature = "server")]
pub use server::{PostureServer, ServerState};

/// Crate version reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "posture-coach";
