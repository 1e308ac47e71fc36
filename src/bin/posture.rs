//! Posture CLI - Command-line interface for Posture Coach
//!
//! Commands:
//! - serve: Run the WebSocket analysis server
//! - run: Replay NDJSON client messages from stdin (one session)
//! - exercises: List supported exercises and their setup guidance
//! - doctor: Diagnose configuration and environment

use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use posture_coach::config::{DEFAULT_BIND_ADDR, DEFAULT_MAX_MESSAGE_BYTES};
use posture_coach::routine::InMemoryRoutineStore;
use posture_coach::{
    rules_for, AnalysisError, AnalyzerConfig, ExerciseKind, PostureServer, ServerConfig, ServerState, Session,
    PRODUCER_NAME, VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Posture - real-time exercise posture analysis engine
#[derive(Parser)]
#[command(name = "posture")]
#[command(version = VERSION)]
#[command(about = "Analyse exercise form from pose landmark streams", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the WebSocket analysis server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_BIND_ADDR)]
        bind: String,

        /// Analyzer config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Largest accepted inbound message in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
        max_message_bytes: usize,
    },

    /// Replay NDJSON client messages from stdin and write NDJSON replies
    Run {
        /// Analyzer config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Flush output after each input line (`--flush false` to buffer)
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        flush: bool,
    },

    /// List supported exercises
    Exercises {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Analyzer config file to validate
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

// Logs go to stderr so stdout stays a clean NDJSON stream
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PostureCliError> {
    match cli.command {
        Commands::Serve {
            bind,
            config,
            max_message_bytes,
        } => cmd_serve(
            ServerConfig {
                bind_addr: bind,
                max_message_bytes,
            },
            config.as_deref(),
        ),
        Commands::Run { config, flush } => cmd_run(config.as_deref(), flush),
        Commands::Exercises { json } => cmd_exercises(json),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, PostureCliError> {
    match path {
        Some(path) => Ok(AnalyzerConfig::load(path)?),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn cmd_serve(server: ServerConfig, config: Option<&Path>) -> Result<(), PostureCliError> {
    let analyzer = load_config(config)?;
    let store = Arc::new(InMemoryRoutineStore::new());
    let state = ServerState::new(analyzer, &server).with_routine_store(store);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async {
        let mut listener = PostureServer::bind(&server.bind_addr, state).await?;
        listener.wait().await;
        Ok::<(), PostureCliError>(())
    })
}

fn cmd_run(config: Option<&Path>, flush: bool) -> Result<(), PostureCliError> {
    let store = Arc::new(InMemoryRoutineStore::new());
    let mut session = Session::new(Arc::new(load_config(config)?)).with_routine_store(store.clone());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        for reply in session.handle_text(trimmed, Utc::now()) {
            writeln!(stdout, "{}", reply.to_json()?)?;
        }
        if flush {
            stdout.flush()?;
        }
    }
    stdout.flush()?;

    info!(sets = store.len(), reps = session.rep_count(), "replay finished");
    Ok(())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseInfo {
    name: &'static str,
    id: &'static str,
    is_time_based: bool,
    default_target: u32,
    camera_guide: String,
    pose_guide: String,
}

fn cmd_exercises(json: bool) -> Result<(), PostureCliError> {
    let defaults = AnalyzerConfig::default();
    let exercises: Vec<ExerciseInfo> = ExerciseKind::ALL
        .iter()
        .map(|kind| {
            let guide = rules_for(*kind).setup_guide();
            ExerciseInfo {
                name: kind.korean_name(),
                id: kind.as_str(),
                is_time_based: kind.is_time_based(),
                default_target: if kind.is_time_based() {
                    defaults.default_target_seconds
                } else {
                    defaults.default_target_reps
                },
                camera_guide: guide.camera_guide,
                pose_guide: guide.pose_guide,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
    } else {
        for exercise in &exercises {
            let target = if exercise.is_time_based {
                format!("{}s hold", exercise.default_target)
            } else {
                format!("{} reps", exercise.default_target)
            };
            println!("{} ({}) - default {}", exercise.name, exercise.id, target);
            println!("    camera: {}", exercise.camera_guide);
            println!("    pose:   {}", exercise.pose_guide);
        }
    }
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PostureCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Posture Coach version {}", VERSION),
    });

    checks.push(DoctorCheck {
        name: "exercises".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} exercises: {}", ExerciseKind::ALL.len(), ExerciseKind::supported_names().join(", ")),
    });

    if let Some(path) = config {
        let check = if !path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match AnalyzerConfig::load(path) {
                Ok(loaded) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (smoothing {}, velocity guard {}°, cooldown {}s)",
                        loaded.smoothing_factor, loaded.velocity_threshold_deg, loaded.completion_cooldown_secs
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", e),
                },
            }
        };
        checks.push(check);
    }

    // Check stdin mode (for replay)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (replay mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Posture Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PostureCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum PostureCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for PostureCliError {
    fn from(e: io::Error) -> Self {
        PostureCliError::Io(e)
    }
}

impl From<AnalysisError> for PostureCliError {
    fn from(e: AnalysisError) -> Self {
        PostureCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for PostureCliError {
    fn from(e: serde_json::Error) -> Self {
        PostureCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PostureCliError> for CliError {
    fn from(e: PostureCliError) -> Self {
        match e {
            PostureCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths, permissions and the bind address".to_string()),
            },
            PostureCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::Config(_) => Some("Run 'posture doctor --config <path>' for details".to_string()),
                    AnalysisError::Io(_) => Some("Check file paths, permissions and the bind address".to_string()),
                    AnalysisError::JsonError(_) => Some("Check JSON syntax".to_string()),
                    _ => None,
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint,
                }
            }
            PostureCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PostureCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flush_defaults_on_and_can_be_disabled() {
        let cli = Cli::try_parse_from(["posture", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { flush: true, .. }));

        let cli = Cli::try_parse_from(["posture", "run", "--flush", "false"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { flush: false, .. }));
    }
}
