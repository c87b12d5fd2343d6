use std::path::PathBuf;
use std::sync::Arc;

use aitos_core::{Config, CurrentUser, KeyValueStore, MemoryStore, Provider, SqliteStore};
use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "aitos")]
#[command(about = "AIT-OS team dashboard: ask OSS BOT, run modules, manage the task board")]
#[command(version)]
struct Cli {
    /// Override the data directory (database and logs)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// AI provider for this session: ollama, claude or openai
    #[arg(short, long)]
    provider: Option<String>,

    /// Model for this session
    #[arg(short, long)]
    model: Option<String>,
}

/// Log to `<data_dir>/logs/aitos.log`, rotated daily. The terminal belongs
/// to the UI so nothing is written to stdout or stderr.
fn init_logging(data_dir: &std::path::Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(data_dir.join("logs"), "aitos.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AITOS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    guard
}

fn open_store(data_dir: &std::path::Path) -> Arc<dyn KeyValueStore> {
    let path = data_dir.join("dashboard.db");
    match SqliteStore::open(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "database unavailable, nothing will be saved");
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|_| Config::new());
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(provider) = cli.provider {
        let parsed = Provider::parse(&provider)
            .ok_or_else(|| anyhow::anyhow!("unknown provider '{provider}'"))?;
        config.provider = Some(parsed.as_str().to_string());
        if cli.model.is_none() {
            config.default_model = Some(parsed.default_model().to_string());
        }
    }
    if let Some(model) = cli.model {
        config.default_model = Some(model);
    }

    let data_dir = config.data_dir()?;
    let _log_guard = init_logging(&data_dir);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), data_dir = %data_dir.display(), "starting");

    let store = open_store(&data_dir);
    let user = CurrentUser::resolve(&config);
    let mut app = App::new(config, store, user);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "dashboard exited with an error");
    }
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await?;
        app.poll_pending().await;
    }
    Ok(())
}
