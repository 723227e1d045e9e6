use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use dnr_player::{
    app::App,
    config,
    events::AppEvent,
    input, logging,
    player::{LocalEngine, MediaEngine},
    ui, viewmodel,
};

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Stream the latest .NET Rocks! episode from your terminal
#[derive(Parser, Debug)]
#[command(name = "dnr-player", version, about)]
struct Args {
    /// Media URL to play (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Config file path (default: <config dir>/dnr-player/config.yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "dnr_player=trace"
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut config = config::load_or_create_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(url) = args.url {
        config.media_url = url;
        config.validate().context("Invalid --url")?;
    }

    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    let _log_guard = logging::init(&logging::default_log_dir(), &log_level)?;
    info!(config = %config_path.display(), url = %config.media_url, "Starting dnr-player");

    ui::theme::init_theme(config.theme);

    let engine: Arc<dyn MediaEngine> = Arc::new(LocalEngine::spawn(config.resolved_cache_dir()));
    let view_model = viewmodel::spawn(engine.clone(), config.media_url.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let _input_handle = input::thread::spawn(event_tx.clone());

    let mut app = App::new(view_model.clone(), engine, event_tx);
    app.notifications.info("Press p to play, s to stop");

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, &mut event_rx).await;
    ratatui::restore();

    if let Err(e) = view_model.shutdown().await {
        warn!(error = %e, "View-model already stopped");
    }
    info!("Exiting");

    result
}

async fn run(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui::render::render(f, &*app))?;

        match tokio::time::timeout(FRAME_INTERVAL, event_rx.recv()).await {
            Ok(Some(event)) => match event {
                AppEvent::Input(key_event) => app.handle_input(key_event),
                AppEvent::Resize(_width, _height) => {}
                AppEvent::CommandFailed(message) => app.on_command_failed(message),
            },
            Ok(None) => break,
            Err(_) => {
                // Frame timeout, redraw
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
