//! drop7tui: a Drop7-style number tile puzzle in the terminal.
//!
//! The simulation (`tile`, `grid`, `animation`, `puzzle`) is headless and
//! driven by [`puzzle::PuzzleController::tick`]; `ui`, `input`, and `app` are
//! the terminal host around it.

pub mod animation;
pub mod app;
pub mod grid;
pub mod input;
pub mod puzzle;
pub mod theme;
pub mod tile;
pub mod ui;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::puzzle::{DEFAULT_DROP_RATE, MAX_LEVELS, PuzzleConfig};

/// Drop7-style puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "drop7tui",
    version,
    about = "Drop7-style number tile puzzle in the terminal. Drop the next tile into a column; place every number to reach the next level.",
    long_about = "drop7tui is a terminal take on the Drop7 falling number puzzle.\n\n\
        Each level gives you a fixed number of tiles to place. Drop the pending tile above \
        the board into any column that still has room; when the level's budget runs out a fresh \
        board is generated and the next level begins.\n\n\
        CONTROLS:\n  1-7         Drop into column   Left/Right or h/l   Move cursor\n  \
        Enter/Space Drop at cursor     Mouse click        Drop into column\n  \
        p           Pause              r                  Restart\n  q / Esc     Quit"
)]
pub struct Args {
    /// Seed for the puzzle generator. Defaults to a time-derived seed.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Starting level.
    #[arg(long, default_value = "1", value_name = "N", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LEVELS)))]
    pub level: u32,

    /// Drop speed in tiles per second.
    #[arg(long, default_value_t = DEFAULT_DROP_RATE, value_name = "RATE")]
    pub drop_rate: f32,

    /// Target update/render frames per second (1-240).
    #[arg(long, default_value = "60.0", value_name = "RATE", value_parser = parse_frame_rate)]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Drops land instantly.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Accepted `--frame-rate` range.
pub const MIN_FRAME_RATE: f64 = 1.0;
pub const MAX_FRAME_RATE: f64 = 240.0;
const DEFAULT_FRAME_RATE: f64 = 60.0;

fn parse_frame_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!(
            "{} is not in {}..={}",
            s, MIN_FRAME_RATE, MAX_FRAME_RATE
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

/// Host settings resolved from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub puzzle: PuzzleConfig,
    pub frame_rate: f64,
    pub no_animation: bool,
}

impl GameConfig {
    pub fn from_args(args: &Args, fallback_seed: u64) -> Self {
        let drop_rate = if args.no_animation {
            f32::INFINITY
        } else {
            args.drop_rate
        };
        Self {
            puzzle: PuzzleConfig {
                seed: args.seed.unwrap_or(fallback_seed),
                start_level: args.level,
                drop_rate,
                ..PuzzleConfig::default()
            },
            frame_rate: if args.frame_rate.is_finite() {
                args.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
            } else {
                DEFAULT_FRAME_RATE
            },
            no_animation: args.no_animation,
        }
    }

    /// Time between loop steps. Rates outside the accepted range are clamped.
    pub fn frame_interval(&self) -> Duration {
        let rate = if self.frame_rate.is_finite() {
            self.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
        } else {
            DEFAULT_FRAME_RATE
        };
        Duration::from_secs_f64(1.0 / rate)
    }
}
