mod action;
mod app;
mod components;
mod target;
mod theme;
mod widgets;

use clap::Parser;

use roster_core::config::Config;
use roster_core::history::{make_address, HistoryStore};
use roster_core::platform;
use roster_core::prefs::Preferences;
use roster_core::SessionController;

/// Live player roster for a game server, with avatars filled in as they resolve.
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Server to fetch on startup, as host or host:port
    target: Option<String>,

    /// Port used when the target has none (defaults to the configured port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_file();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("roster log: {}", log_path.display());
    tracing::info!("roster starting…");

    // ── Load config and persisted state ──────────────────────────────────────
    let config = Config::load().unwrap_or_default();
    let default_port = args.port.unwrap_or(config.session.default_port);

    let history = HistoryStore::load(platform::history_file());
    let prefs_path = Preferences::default_path();
    let prefs = Preferences::load(&prefs_path);

    let initial_target = args.target.map(|t| {
        let (host, port) = target::parse_target(&t, default_port);
        make_address(&host, port)
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let session = SessionController::from_config(&config, history);
    let app = app::App::new(session, prefs, prefs_path, default_port, initial_target);
    app.run().await?;

    Ok(())
}
