use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use parley_core::{
    ChatClient, Config, Conversation, Durability, Endpoint, MemoryKv, MessageStore, SqliteKv,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, TICK_RATE};

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version, about = "Terminal chat client with a persistent conversation")]
struct Cli {
    /// Endpoint preset (local, lan, production) or a base URL
    #[arg(long, env = "PARLEY_BASE_URL", value_parser = parse_endpoint)]
    base_url: Option<Endpoint>,

    /// Storage durability: strict or best-effort
    #[arg(long, env = "PARLEY_DURABILITY", value_parser = parse_durability)]
    durability: Option<Durability>,

    /// Directory holding the message database and log file
    #[arg(long, env = "PARLEY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keep messages in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Log file (defaults to parley.log in the data directory)
    #[arg(long, env = "PARLEY_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remember the resolved endpoint in the config file
    #[arg(long)]
    save_endpoint: bool,
}

fn parse_endpoint(s: &str) -> Result<Endpoint, String> {
    Endpoint::from_str(s)
        .ok_or_else(|| format!("expected local, lan, production or an http(s) URL, got '{}'", s))
}

fn parse_durability(s: &str) -> Result<Durability, String> {
    Durability::from_str(s).ok_or_else(|| format!("expected strict or best-effort, got '{}'", s))
}

/// Effective settings: command line first, then the config file, then defaults.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    endpoint: Endpoint,
    durability: Durability,
    greeting: String,
    data_dir: PathBuf,
    log_file: PathBuf,
    ephemeral: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => config.data_dir()?,
        };
        let log_file = cli
            .log_file
            .clone()
            .unwrap_or_else(|| data_dir.join("parley.log"));

        Ok(Self {
            endpoint: cli.base_url.clone().unwrap_or_else(|| config.endpoint()),
            durability: cli.durability.unwrap_or_else(|| config.durability()),
            greeting: config.greeting(),
            data_dir,
            log_file,
            ephemeral: cli.ephemeral,
        })
    }

    fn open_store(&self) -> Result<MessageStore> {
        if self.ephemeral {
            return Ok(MessageStore::new(MemoryKv::new(), self.durability));
        }
        let kv = SqliteKv::open(self.data_dir.join("chat.db"))
            .context("Failed to open message database")?;
        Ok(MessageStore::new(kv, self.durability))
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn persist_endpoint(path: Option<&Path>, endpoint: &Endpoint) -> Result<()> {
    match path {
        Some(path) => Config::save_endpoint_to(path, endpoint),
        None => Config::save_endpoint(endpoint),
    }
}

/// Logs go to a file because the terminal belongs to the UI.
fn init_tracing(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parley=info,parley_core=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, &config)?;

    init_tracing(&settings.log_file)?;
    info!(
        endpoint = %settings.endpoint.base_url(),
        durability = settings.durability.as_str(),
        ephemeral = settings.ephemeral,
        "Starting parley"
    );

    if cli.save_endpoint {
        persist_endpoint(cli.config.as_deref(), &settings.endpoint)
            .context("Failed to save endpoint to config")?;
        info!(endpoint = settings.endpoint.as_str(), "Saved endpoint to config");
    }

    let store = settings.open_store()?;
    let conversation = Conversation::new(store, settings.greeting.clone());
    let client = ChatClient::from_endpoint(&settings.endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(conversation, client, settings.endpoint.clone());
    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    info!("Exiting parley");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    // Show the loading screen for the first frame, then load
    terminal.draw(|frame| ui::render(app, frame))?;
    app.start();

    while !app.should_quit {
        app.drain_signals();
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await?;
        app.poll_send_task().await;
    }

    Ok(())
}
