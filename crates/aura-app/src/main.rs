//! # Aura
//!
//! Reveals the artists behind a Last.fm profile, one tile at a time, and
//! reads a color and a headline from their moods and genres.

mod presenter;
mod services;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use aura_core::{Config, ImageProvider, Period, ProviderPriority};
use clap::Parser;
use presenter::TerminalPresenter;
use services::Backends;
use state::{Session, SessionCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "aura", version, about = "Reveal the personality behind your top artists")]
struct Args {
    /// Last.fm username
    user: String,

    /// Listening window: 7day, 1month, 3month, 6month, 12month or overall
    #[arg(long, short)]
    period: Option<Period>,

    /// Number of top artists
    #[arg(long, short)]
    limit: Option<u32>,

    /// Image providers in order of preference, e.g. itunes,discogs,theaudiodb
    #[arg(long)]
    priority: Option<String>,

    /// Configuration file (JSON)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// API proxy base URL
    #[arg(long)]
    proxy: Option<String>,

    /// Never rotate providers automatically
    #[arg(long)]
    reduced_motion: bool,

    /// Keep running after the reveal: rotate providers and read commands
    /// (`load <user>`, `show <provider>`, `priority <a,b,c>`, `quit`) from stdin
    #[arg(long, short)]
    watch: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::load_default().context("Failed to read default config")?,
    };
    apply_overrides(config, args)
}

/// Apply command-line flags on top of the file configuration.
fn apply_overrides(mut config: Config, args: &Args) -> Result<Config> {
    if let Some(period) = args.period {
        config.period = period;
    }
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if let Some(list) = &args.priority {
        config = config.with_priority(ProviderPriority::parse(list)?);
    }
    if let Some(proxy) = &args.proxy {
        config = config.with_proxy(proxy.clone());
    }
    if args.reduced_motion {
        config = config.with_reduced_motion(true);
    }
    config.validate()?;
    Ok(config)
}

/// Parse one line typed in watch mode.
fn parse_command(line: &str) -> Option<SessionCommand> {
    let mut parts = line.split_whitespace();
    match (parts.next()?, parts.next()) {
        ("load" | "user", Some(user)) => Some(SessionCommand::Load(user.to_string())),
        ("show" | "select", Some(provider)) => provider
            .parse::<ImageProvider>()
            .ok()
            .map(SessionCommand::SelectProvider),
        ("priority", Some(list)) => ProviderPriority::parse(list)
            .ok()
            .map(SessionCommand::SetPriority),
        ("quit" | "exit", None) => Some(SessionCommand::Shutdown),
        _ => None,
    }
}

/// Forward stdin lines to the session until EOF or `quit`.
fn spawn_stdin_commands(tx: mpsc::Sender<SessionCommand>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let Some(command) = parse_command(&line) else {
                warn!("Unknown command: {line}");
                continue;
            };
            let quit = matches!(command, SessionCommand::Shutdown);
            if tx.send(command).await.is_err() || quit {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aura=info,aura_app=info,aura_sources=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Starting Aura v{}", env!("CARGO_PKG_VERSION"));

    let backends = Backends::from_config(&config).context("Failed to create API clients")?;
    let mut session = Session::new(config, backends, TerminalPresenter::new());

    // The presenter has already shown why.
    if session.load(&args.user).await.is_err() {
        return Ok(ExitCode::FAILURE);
    }

    let (tx, rx) = mpsc::channel(16);
    if args.watch {
        spawn_stdin_commands(tx);
    } else {
        drop(tx);
    }
    session.run(rx, !args.watch).await;

    Ok(ExitCode::SUCCESS)
}
