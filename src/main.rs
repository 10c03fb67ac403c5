use std::sync::Arc;

use clap::{Parser, Subcommand};
use scenario_desk::background::Background;
use scenario_desk::config::{ClientConfig, ConfigError, normalize_base_url};
use scenario_desk::controller::ClientContext;
use scenario_desk::net::api::BackendApi;
use scenario_desk::net::transport::{HttpTransport, TransportError};
use scenario_desk::repl::{self, Desk, ReplError};
use scenario_desk::telemetry::Telemetry;
use scenario_desk::util::render::RenderMode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Repl(#[from] ReplError),
}

#[derive(Parser, Debug)]
#[command(name = "scenario-desk", about = "Client for the Jira test-scenario helper")]
struct Cli {
    /// Overrides SCENARIO_DESK_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// `markdown` or `text`; overrides SCENARIO_DESK_RENDER_MODE.
    #[arg(long, global = true)]
    render_mode: Option<RenderMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read commands from stdin, one per line (default).
    Repl,
    /// Ask the backend whether an AI key is stored.
    Ping,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = normalize_base_url(base_url)?;
    }
    if let Some(mode) = cli.render_mode {
        config.render_mode = mode;
    }

    let transport = HttpTransport::new(&config.base_url, config.timeouts.request(), config.timeouts.connect())?;
    let api = BackendApi::new(Arc::new(transport));
    tracing::info!(base_url = %config.base_url, "scenario-desk starting");

    match cli.command.unwrap_or(Command::Repl) {
        Command::Ping => run_ping(&api).await,
        Command::Repl => run_repl(api, &config).await,
    }
}

async fn run_ping(api: &BackendApi) -> Result<(), CliError> {
    let has_key = api.has_key().await?;
    println!("ok (api key {})", if has_key { "present" } else { "missing" });
    Ok(())
}

async fn run_repl(api: BackendApi, config: &ClientConfig) -> Result<(), CliError> {
    let background = Background::new();
    let (telemetry, _worker) = if config.telemetry {
        let (telemetry, worker) = Telemetry::with_beacon(api.clone(), background.clone(), config.telemetry_queue);
        (telemetry, Some(worker))
    } else {
        (Telemetry::disabled(), None)
    };

    let ctx = ClientContext::new(api, telemetry, background, config.timeouts.request());
    let mut desk = Desk::new(ctx, config.render_mode);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl::run(&mut desk, stdin, &mut stdout).await?;
    Ok(())
}
