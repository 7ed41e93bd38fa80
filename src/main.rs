// main.rs

mod api;
mod app;
mod config;
mod error;
mod filter;
mod forms;
mod logging;
mod models;
mod parser;
mod ui;
mod views;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{error, info};

use crate::api::RestGateway;
use crate::app::App;
use crate::config::Config;
use crate::ui::run_app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    // Held until exit so buffered log lines get flushed
    let _guard = logging::init(&config.log_level, &config.log_dir)?;

    let config_source = config::default_config_path()
        .filter(|path| path.exists())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "environment only".to_string());
    info!(
        config = %config_source,
        backend = %config::backend_host(&config.backend_url),
        "configuration loaded"
    );

    let gateway = RestGateway::new(&config);

    let mut app = App::new();
    app.reload_all(&gateway).await;
    info!(
        tasks = app.tasks.len(),
        lists = app.lists.len(),
        "initial load finished"
    );

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = run_app(&mut terminal, app, &gateway).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
