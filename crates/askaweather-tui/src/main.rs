use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use askaweather_core::config::BASE_URL_ENV;
use askaweather_core::{AssistantClient, Config};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "askaweather")]
#[command(about = "Terminal chat client for the Askaweather forecast assistant")]
#[command(version)]
struct Cli {
    /// Assistant API base URL (overrides $ASKAWEATHER_API_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Save the resolved base URL to the config file
    #[arg(long)]
    remember: bool,

    /// Write logs here instead of the default data directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config; a bad file falls back to defaults and is reported below
    let (mut config, config_error) = Config::load_or_default();

    let log_path = match cli.log_file {
        Some(path) => path,
        None => logging::default_log_path()?,
    };
    let _log_guard = logging::init(&log_path, config.log_level.as_deref())?;

    if let Some(e) = config_error {
        warn!(error = %e, "could not load config, using defaults");
    }

    let env_url = std::env::var(BASE_URL_ENV).ok();
    let base_url = config.resolve_base_url(cli.base_url.as_deref(), env_url.as_deref());
    info!(%base_url, "starting askaweather");

    if cli.remember {
        config.api_base_url = Some(base_url.clone());
        if let Err(e) = config.save() {
            warn!(error = %e, "could not save config");
        }
    }

    let client = AssistantClient::new(&base_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, client).await;
    tui::restore()?;

    info!("exiting");
    result
}

async fn run(terminal: &mut Tui, client: AssistantClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender());
    app.probe_backend();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    Ok(())
}
