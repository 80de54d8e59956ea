mod api;
mod app;
mod config;
mod session;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AuthApi;
use app::{App, Popup, View};
use config::AppConfig;
use session::{FileStore, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "torii")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly login client for REST authentication backends")]
struct Args {
    /// Output the stored session as JSON (for scripts)
    #[arg(short, long)]
    status: bool,

    /// Clear the stored session and exit
    #[arg(long)]
    logout: bool,

    /// Query the backend health endpoint and print the response
    #[arg(long)]
    health: bool,

    /// Override the backend base URL for this invocation
    #[arg(short, long)]
    api: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(api_base) = args.api {
        config.api_base = api_base;
    }

    // Handle CLI-only commands
    if args.status {
        return print_status();
    }

    if args.logout {
        return clear_session(&config);
    }

    if args.health {
        return print_health(&config).await;
    }

    // Run TUI
    run_tui(config).await
}

fn print_status() -> Result<()> {
    let mut store = FileStore::new()?;

    // Script-friendly JSON, one object either way
    let output = match store.load() {
        Some(session) => serde_json::json!({
            "logged_in": true,
            "username": session.username,
            "role": session.role,
            "login_time": session.login_time,
        }),
        None => serde_json::json!({ "logged_in": false }),
    };

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn clear_session(config: &AppConfig) -> Result<()> {
    let mut store = FileStore::new()?;
    let had_session = store.load().is_some();
    store.clear()?;

    if had_session {
        tracing::info!("Stored session cleared");
        // Best effort: a missing notification daemon shouldn't fail the logout
        if config.notifications {
            let _ = notify("torii", "Logged out");
        }
    }
    Ok(())
}

async fn print_health(config: &AppConfig) -> Result<()> {
    let api = AuthApi::new(config.api_base.clone());
    let body = api.health().await?;
    println!("{}", serde_json::to_string(&body)?);
    Ok(())
}

async fn run_tui(config: AppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let store = FileStore::new()?;
    let mut app = App::new(config, Box::new(store)).await?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        // 'q' only quits outside the form, where it isn't input
                        KeyCode::Char('q')
                            if app.view == View::SuccessPanel && app.popup == Popup::None =>
                        {
                            return Ok(())
                        }
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.notify(format!("Error: {}", e), app::NoticeKind::Error);
                            }
                        }
                    }
                }
            }
        }

        // Deferred work: pending login request, notice expiry
        let _ = app.tick().await;
    }
}

pub(crate) fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("dialog-password")
        .show()?;
    Ok(())
}
