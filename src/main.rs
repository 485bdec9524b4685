#![forbid(unsafe_code)]

//! `ucci-analyzer`: prints live multi-PV analysis from a UCCI engine.
//!
//! Starts the engine, asks it to think about one position, and reprints the
//! ranked lines after every polling window until interrupted, the optional
//! duration elapses, or the engine exits.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ucci_analyzer::{AppError, EngineConfig, EngineSession, Line, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ucci-analyzer", about = "Live analysis from a UCCI engine", version, long_about = None)]
struct Cli {
    /// Path to the engine executable.
    engine: PathBuf,

    /// Position to analyse, in FEN (quote it).
    fen: String,

    /// Number of ranked lines (`MultiPV`) to show.
    #[arg(long, default_value_t = 1)]
    lines: usize,

    /// Optional TOML file with timing and parser settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    duration: Option<u64>,

    /// Log output format (text or json). Logs go to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("ucci-analyzer: {err}");
        return ExitCode::FAILURE;
    }

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))
        .and_then(|runtime| runtime.block_on(run(args)));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "analysis failed");
            eprintln!("ucci-analyzer: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::new(PathBuf::new()),
    };
    config.engine_path.clone_from(&args.engine);

    let mut session = EngineSession::new(config);
    let outcome = analyse(&mut session, &args).await;
    session.shutdown().await;
    outcome
}

async fn analyse(session: &mut EngineSession, args: &Cli) -> Result<()> {
    session.start().await?;
    let mut analysis = session.think(&args.fen, args.lines).await?;

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("analysis duration elapsed");
            break;
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            lines = analysis.poll() => {
                let Some(lines) = lines else { break };
                print_lines(lines)?;
            }
        }

        if !analysis.engine_alive() {
            return Err(AppError::Io("engine exited during analysis".into()));
        }
    }

    analysis.interrupt().await
}

/// Single-line analysis is redrawn in place; multi-line output is printed as
/// a block followed by a blank line.
fn print_lines(lines: &[Line]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    if let [line] = lines {
        write!(out, "\r{line}")?;
    } else {
        for line in lines {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
