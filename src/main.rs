use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use tokio::net::TcpListener;
use tracing::info;

use sse_bridge::api::{AppState, create_router};
use sse_bridge::bridge::{AckHandler, BridgeServer};
use sse_bridge::session::spawn_reaper;
use sse_bridge::settings::Settings;

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.common)?;

    let settings = Settings::load(cli.common.config.as_deref())
        .context("loading configuration")?;

    match cli.command {
        Command::Serve(cmd) => async_serve(settings, cmd),
        Command::Config { command } => handle_config(&cli.common, &settings, command),
    }
}

#[tokio::main]
async fn async_serve(settings: Settings, cmd: ServeCommand) -> Result<()> {
    handle_serve(settings, cmd).await
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Bridges a streaming event transport onto a buffered request/response server.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    debug: bool,
    /// Enable trace logging (overrides other levels)
    #[arg(long, global = true)]
    trace: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the bridge server
    Serve(ServeCommand),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Args)]
struct ServeCommand {
    /// Host address to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration
    Show,
    /// Print the resolved config file path
    Path,
}

fn effective_log_level(common: &CommonOpts) -> LevelFilter {
    if common.trace {
        LevelFilter::Trace
    } else if common.debug {
        LevelFilter::Debug
    } else {
        match common.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn init_logging(common: &CommonOpts) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    if common.quiet {
        log::set_max_level(LevelFilter::Off);
        return Ok(());
    }

    let level = match effective_log_level(common) {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sse_bridge={level},tower_http={level}")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    // Also init env_logger for compatibility with log crate users
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.filter_level(effective_log_level(common));
    builder.try_init().ok();

    Ok(())
}

fn handle_config(
    common: &CommonOpts,
    settings: &Settings,
    command: ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(settings).context("rendering configuration")?;
            print!("{rendered}");
        }
        ConfigCommand::Path => match &common.config {
            Some(path) => println!("{}", path.display()),
            None => println!("(defaults; no config file)"),
        },
    }
    Ok(())
}

async fn handle_serve(settings: Settings, cmd: ServeCommand) -> Result<()> {
    info!("Starting SSE bridge server...");

    let bridge = BridgeServer::new(Arc::new(AckHandler));
    let state = AppState::new(bridge, settings.bridge.message_endpoint.clone())
        .with_allowed_origins(settings.cors.allowed_origins.clone());

    spawn_reaper(
        state.registry.clone(),
        Duration::from_secs(settings.bridge.session_ttl_secs),
        Duration::from_secs(settings.bridge.sweep_interval_secs),
    );

    let router = create_router(state);

    let host = cmd.host.unwrap_or(settings.server.host);
    let port = cmd.port.unwrap_or(settings.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, router)
        .await
        .context("serving HTTP")?;

    Ok(())
}
