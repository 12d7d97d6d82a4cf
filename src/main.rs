//! MoodSync relay - AI advisory relay for mood tracking role views.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use moodsync_relay::audit::{AuditError, AuditLog, AuditRecorder};
use moodsync_relay::config::{ConfigError, ConfigLoader, RelayConfig};
use moodsync_relay::display::{print_advice, print_audit_disabled, print_audit_records};
use moodsync_relay::fallback::{DegradedModeProvider, FallbackPolicy};
use moodsync_relay::relay::{
    AdvisoryProvider, Provider, Relay, RelayError, RelayRequest, RequestKind,
};
use moodsync_relay::server::{AppState, RelayServer, ServerError};

#[derive(Parser)]
#[command(
    name = "moodsync-relay",
    about = "AI advisory relay for mood tracking role views",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file path (defaults to ./.moodsync-relay.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the relay over HTTP.
    Serve {
        /// Override the configured host.
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one advisory request and print the answer.
    Ask {
        /// Request kind (journal, empathy, doctor, insight).
        kind: String,
        /// JSON payload for the kind.
        payload: String,
        /// Caller identifier recorded in the audit trail.
        #[arg(long)]
        caller: Option<String>,
        /// Answer with canned content when the relay fails or is not configured.
        #[arg(long)]
        fallback: bool,
    },
    /// Show the newest audit records.
    Logs {
        /// Maximum number of records.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("Invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<RelayConfig, ConfigError> {
    match path {
        Some(path) => ConfigLoader::with_path(path).load(),
        None => ConfigLoader::new().load(),
    }
}

async fn serve(
    mut config: RelayConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), CliError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let provider = Provider::from_config(&config.ai)?;
    let audit = AuditLog::open_configured(&config.audit).await;
    let relay = Relay::new(Arc::new(provider), AuditRecorder::for_log(audit.as_ref()));

    let mut state = AppState::new(Arc::new(relay));
    if let Some(audit) = audit {
        state = state.with_audit(audit);
    }
    let server = RelayServer::new(state).with_config(config.server);

    let cancel = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C");
            cancel.cancel();
        }
    });

    server.run().await?;
    Ok(())
}

async fn ask(
    config: RelayConfig,
    kind: &str,
    payload: &str,
    caller: Option<String>,
    fallback: bool,
) -> Result<(), CliError> {
    let kind: RequestKind = kind.parse()?;
    let mut request = RelayRequest::new(kind, serde_json::from_str(payload)?);
    request.caller_id = caller;

    let relay = match Provider::from_config(&config.ai) {
        Ok(provider) => {
            let audit = AuditLog::open_configured(&config.audit).await;
            Some(Relay::new(
                Arc::new(provider),
                AuditRecorder::for_log(audit.as_ref()),
            ))
        }
        Err(err @ RelayError::Configuration(_)) if fallback => {
            tracing::warn!(error = %err, degraded = true, "Relay not configured, using fallback content");
            None
        }
        Err(err) => return Err(err.into()),
    };

    let advice = match &relay {
        Some(relay) if fallback => FallbackPolicy::new(relay.clone()).advise(&request).await,
        Some(relay) => relay.advise(&request).await,
        None => DegradedModeProvider::new().advise(&request).await,
    };

    if let Some(relay) = &relay {
        relay.recorder().flush().await;
    }

    print_advice(&advice?);
    Ok(())
}

async fn logs(config: RelayConfig, limit: usize) -> Result<(), CliError> {
    if !config.audit.enabled {
        print_audit_disabled();
        return Ok(());
    }
    let audit = AuditLog::open(config.audit.resolved_path()).await?;
    let records = audit.recent(limit).await?;
    print_audit_records(&records);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config)?;
    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Ask {
            kind,
            payload,
            caller,
            fallback,
        } => ask(config, &kind, &payload, caller, fallback).await,
        Commands::Logs { limit } => logs(config, limit).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
