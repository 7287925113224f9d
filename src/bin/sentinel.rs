//! Sentinel CLI - Command-line interface for Focus Sentinel
//!
//! Commands:
//! - replay: Run a recorded frame stream through a monitoring session
//! - config: Print the effective alert configuration
//! - doctor: Diagnose configuration and environment

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use focus_sentinel::config::{default_config_dir, SentinelConfig};
use focus_sentinel::types::{FrameObservation, SessionReport};
use focus_sentinel::{ManualClock, SessionCoordinator, PRODUCER_NAME, SENTINEL_VERSION};

/// Sentinel - Attention monitoring session engine
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(version = SENTINEL_VERSION)]
#[command(about = "Turn per-frame attention classifications into alerts and focus statistics", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay NDJSON frames through a monitoring session
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Alert output path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Write the final session report to this file instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,

        /// Session identifier (generated when omitted)
        #[arg(long)]
        session_id: Option<String>,

        /// Report format
        #[arg(long, default_value = "json-pretty")]
        report_format: ReportFormat,

        /// Flush output after each alert (`--flush false` to buffer)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,
    },

    /// Print the effective alert configuration
    Config,

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

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

fn run(cli: Cli) -> Result<(), SentinelCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            report,
            session_id,
            report_format,
            flush,
        } => {
            let config = SentinelConfig::load_from(cli.config.as_deref())?;
            cmd_replay(
                config,
                &input,
                &output,
                report.as_deref(),
                session_id,
                report_format,
                flush,
            )
        }
        Commands::Config => {
            let config = SentinelConfig::load_from(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Doctor { json } => cmd_doctor(cli.config.as_deref(), json),
    }
}

fn cmd_replay(
    config: SentinelConfig,
    input: &Path,
    output: &Path,
    report_path: Option<&Path>,
    session_id: Option<String>,
    report_format: ReportFormat,
    flush: bool,
) -> Result<(), SentinelCliError> {
    let reader: Box<dyn BufRead> = if input.to_string_lossy() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(fs::File::open(input)?))
    };

    let mut writer: Box<dyn Write> = if output.to_string_lossy() == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(fs::File::create(output)?)
    };

    let mut lines = reader.lines();
    let mut line_number = 0usize;

    // The session clock follows frame timestamps, so the session starts at the first frame
    let first = loop {
        match lines.next() {
            Some(line) => {
                line_number += 1;
                let line = line?;
                if !line.trim().is_empty() {
                    break parse_frame(&line, line_number)?;
                }
            }
            None => return Err(SentinelCliError::NoFrames),
        }
    };

    let clock = Arc::new(ManualClock::new(first.timestamp));
    let coordinator = SessionCoordinator::with_clock(config, clock.clone());
    let started = coordinator.start_session(session_id)?;
    tracing::debug!(session_id = %started.session_id, "replay session started");

    let mut frames = 0usize;
    let mut pending = Some(first);
    loop {
        let frame = match pending.take() {
            Some(frame) => frame,
            None => match lines.next() {
                Some(line) => {
                    line_number += 1;
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    parse_frame(&line, line_number)?
                }
                None => break,
            },
        };

        clock.set(frame.timestamp);
        let outcome = coordinator.ingest(&frame)?;
        frames += 1;

        for alert in &outcome.alerts {
            writeln!(writer, "{}", serde_json::to_string(alert)?)?;
            if flush {
                writer.flush()?;
            }
        }
    }
    writer.flush()?;

    let report = coordinator.stop_session()?;
    tracing::info!(frames, alerts = report.alert_count, "replay finished");

    let rendered = format_report(&report, &report_format)?;
    match report_path {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }

    Ok(())
}

fn parse_frame(line: &str, line_number: usize) -> Result<FrameObservation, SentinelCliError> {
    serde_json::from_str(line.trim()).map_err(|e| {
        SentinelCliError::ParseError(format!("Failed to parse frame on line {}: {}", line_number, e))
    })
}

fn format_report(report: &SessionReport, format: &ReportFormat) -> Result<String, SentinelCliError> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string(report)?),
        ReportFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), SentinelCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "sentinel_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Sentinel version {}", SENTINEL_VERSION),
    });

    let default_file = default_config_dir().map(|dir| dir.join("config.toml"));
    checks.push(match &default_file {
        Some(path) if path.exists() => DoctorCheck {
            name: "config_file".to_string(),
            status: CheckStatus::Ok,
            message: format!("Using {}", path.display()),
        },
        Some(path) => DoctorCheck {
            name: "config_file".to_string(),
            status: CheckStatus::Ok,
            message: format!("No config at {} (defaults in use)", path.display()),
        },
        None => DoctorCheck {
            name: "config_file".to_string(),
            status: CheckStatus::Warning,
            message: "No platform config directory".to_string(),
        },
    });

    if let Some(path) = config_path {
        if !path.exists() {
            checks.push(DoctorCheck {
                name: "explicit_config".to_string(),
                status: CheckStatus::Error,
                message: format!("Config file {} does not exist", path.display()),
            });
        }
    }

    checks.push(match SentinelConfig::load_from(config_path) {
        Ok(config) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Thresholds: sleeping {}s, yawning {}s, not focused {}s, no person {}s; cooldown {}s",
                config.thresholds.sleeping,
                config.thresholds.yawning,
                config.thresholds.not_focused,
                config.thresholds.no_person,
                config.alert_cooldown_secs
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

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
            message: "stdin is a pipe (replay from - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SENTINEL_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sentinel Doctor Report");
        println!("======================");
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
        Err(SentinelCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum SentinelCliError {
    Io(io::Error),
    Session(focus_sentinel::SessionError),
    Config(focus_sentinel::ConfigError),
    Json(serde_json::Error),
    NoFrames,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for SentinelCliError {
    fn from(e: io::Error) -> Self {
        SentinelCliError::Io(e)
    }
}

impl From<focus_sentinel::SessionError> for SentinelCliError {
    fn from(e: focus_sentinel::SessionError) -> Self {
        SentinelCliError::Session(e)
    }
}

impl From<focus_sentinel::ConfigError> for SentinelCliError {
    fn from(e: focus_sentinel::ConfigError) -> Self {
        SentinelCliError::Config(e)
    }
}

impl From<serde_json::Error> for SentinelCliError {
    fn from(e: serde_json::Error) -> Self {
        SentinelCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SentinelCliError> for CliError {
    fn from(e: SentinelCliError) -> Self {
        match e {
            SentinelCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SentinelCliError::Session(e) => CliError {
                code: "SESSION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Frames must be ordered by timestamp".to_string()),
            },
            SentinelCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'sentinel doctor' for details".to_string()),
            },
            SentinelCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SentinelCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SentinelCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            SentinelCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be {\"timestamp\", \"present\", \"category\"}".to_string()),
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

    fn replay_flush(args: &[&str]) -> bool {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Replay { flush, .. } => flush,
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_replay_flush_defaults_on() {
        assert!(replay_flush(&["sentinel", "replay", "--input", "frames.ndjson"]));
    }

    #[test]
    fn test_replay_flush_can_be_disabled() {
        assert!(!replay_flush(&["sentinel", "replay", "--input", "-", "--flush", "false"]));
        assert!(replay_flush(&["sentinel", "replay", "--input", "-", "--flush", "true"]));
    }
}
