use anyhow::Context;
use clap::Parser;
use lucid::app::App;
use lucid::config::Config;
use lucid::games::GameHost;
use lucid::interpreter::Interpreter;
use lucid::logs;
use lucid::modes::{self, ModeStore};
use lucid::output::Console;
use lucid::time_source::RealTimeSource;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A consciousness terminal.
#[derive(Debug, Parser)]
#[command(name = "lucid", version, about)]
struct Cli {
    /// Path to a config file (defaults to ~/.config/lucid/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the persisted mode flags
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Log filter, e.g. "lucid=debug"
    #[arg(long, default_value = "lucid=info")]
    log_filter: String,
}

fn init_logging(filter: &str) -> anyhow::Result<()> {
    logs::cleanup_stale_logs();
    let path = logs::main_log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_filter)?;

    let config = Arc::new(Config::load(cli.config.as_deref()));
    let store_path = cli
        .state_dir
        .map(|dir| dir.join("modes.json"))
        .unwrap_or_else(modes::default_store_path);
    let modes = Arc::new(ModeStore::open(store_path));

    let console = Console::new(config.render.clone());
    let (interpreter, control) = Interpreter::new(
        config,
        console,
        modes,
        GameHost::new(),
        RealTimeSource::shared(),
    );

    let terminal = ratatui::init();
    let result = App::new(interpreter, control).run(terminal).await;
    ratatui::restore();
    result
}
