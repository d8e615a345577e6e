//! drop7tui binary: parse the CLI, set up logging, run the terminal app.

use anyhow::{Context, Result};
use clap::Parser;
use drop7tui::app::App;
use drop7tui::theme::Theme;
use drop7tui::{Args, GameConfig};
use std::time::{SystemTime, UNIX_EPOCH};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    let theme = match Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("theme not loaded, using defaults: {}", e);
            Theme::default()
        }
    };
    let config = GameConfig::from_args(&args, time_seed());
    log::info!("starting with {:?}", config);
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Logs go to a file only; the terminal belongs to the UI.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = args.log_file.as_deref() else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
