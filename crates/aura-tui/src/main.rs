use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use aura_core::{Config, GeminiGateway};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "aura", version)]
#[command(about = "Chat with Aura to turn your skills and interests into a contribution plan")]
struct Cli {
    /// Log at DEBUG level
    #[arg(short, long)]
    verbose: bool,

    /// Model for the conversation, plan and lookups
    #[arg(long)]
    chat_model: Option<String>,

    /// Model for the mood board images
    #[arg(long)]
    image_model: Option<String>,

    /// Where the mood board page is saved
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aura")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // The terminal belongs to the UI, so logs only go to the file
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("aura.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(model) = cli.chat_model {
        config.chat_model = model;
    }
    if let Some(model) = cli.image_model {
        config.image_model = model;
    }
    info!(
        "Aura loaded config: chat_model={}, image_model={}",
        config.chat_model, config.image_model
    );

    let gateway = Arc::new(GeminiGateway::from_config(&config));
    let mut app = App::new(gateway, &config.chat_model, cli.output_dir);

    tui::install_panic_hook();
    let mut terminal = tui::init().context("Failed to initialize terminal")?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    info!("Aura exiting");
    Ok(())
}
