use std::io;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use uuid::Uuid;

use curator::config::AppConfig;
use curator::tui::{AppState, Services};

/// Terminal operations console for R2R collections.
#[derive(Parser, Debug)]
#[command(name = "curator", version, about)]
struct Cli {
    /// Collection to open on startup.
    collection: Option<Uuid>,

    /// Override the API base URL from config.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Override the API key from config.
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(key) = cli.api_key {
        config.api.api_key = Some(key);
    }

    // Initialize logging before the terminal goes raw; the guard must live
    // until exit so buffered lines are flushed.
    let _log_guard = curator::logging::init(&config.log_dir());
    log::info!("curator v{} starting", curator::VERSION);

    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // Service construction fails fast (bad base URL, client build error)
    // while stderr is still usable.
    let services = Services::init(&config, event_tx.clone())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let mut app = AppState::new(event_rx, event_tx, services, cli.collection);
    let tick_rate = Duration::from_millis(config.tui.tick_rate_ms);
    let result = app.run(&mut terminal, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        log::error!("fatal: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    log::info!("curator shutting down");
    Ok(())
}
