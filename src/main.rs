//! Cubelinetui: drag colour-block sequences onto a grid and clear same-coloured groups.

mod app;
mod game;
mod grid;
mod input;
mod region;
mod save;
mod sequence;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use theme::{Rgba, Theme};
use thiserror::Error;
use tracing::warn;

/// Engine options derived from the CLI (board size, palette, scoring, generation odds).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub columns: usize,
    pub rows: usize,
    pub palette: Vec<Rgba>,
    /// Smallest same-coloured group that clears.
    pub min_match: usize,
    pub points_per_cell: u32,
    pub one_or_four_chance: f64,
    /// Fixed seed for block generation; random when None.
    pub seed: Option<u64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column (got {columns}x{rows})")]
    EmptyGrid { columns: usize, rows: usize },
    #[error("palette has no colours")]
    EmptyPalette,
    #[error("minimum match size must be at least 1")]
    ZeroMinMatch,
}

impl GameConfig {
    pub fn from_args(args: &Args, theme: &Theme) -> Self {
        Self {
            columns: usize::from(args.columns),
            rows: usize::from(args.rows),
            palette: theme.block_palette(usize::from(args.colors)),
            min_match: usize::from(args.min_match),
            points_per_cell: args.points_per_cell,
            one_or_four_chance: args.one_or_four_chance.clamp(0.0, 1.0),
            seed: args.seed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.min_match == 0 {
            return Err(ConfigError::ZeroMinMatch);
        }
        if self.palette.len() < self.min_match {
            warn!(
                colours = self.palette.len(),
                min_match = self.min_match,
                "palette smaller than the match size"
            );
        }
        Ok(())
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = args.log_file.as_deref() else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_max_level(args.log_level)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    let theme = Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!(error = %e, "theme not loaded, using defaults");
        Theme::default()
    });
    let config = GameConfig::from_args(&args, &theme);
    config.validate()?;
    let mut app = App::new(args, config, theme);
    app.run()?;
    Ok(())
}

/// Colour-block line puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "cubelinetui",
    version,
    about = "Drag colour-block sequences onto a grid; groups of 3+ same-coloured cells clear for points.",
    long_about = "Cubelinetui is a terminal puzzle game.\n\n\
        Each turn you get a sequence of 1-4 coloured blocks. Draw it onto empty cells as one \
        stroke, each block next to the previous one (no diagonals). Same-coloured groups of \
        three or more clear for points. The game ends when the sequence fits nowhere.\n\n\
        CONTROLS:\n  Mouse       Press on an empty cell and drag through neighbours\n  \
        Arrows/hjkl Move cursor (extends the stroke while grabbing)\n  \
        Space/Enter Grab / let go    Esc  Cancel stroke\n  \
        x Hammer (then pick a filled cell)   n Hint (next sequence)   s Skip\n  \
        r Restart   q Quit"
)]
pub struct Args {
    /// Board width in cells (1-12).
    #[arg(long, default_value = "5", value_name = "N", value_parser = clap::value_parser!(u16).range(1..=12))]
    pub columns: u16,

    /// Board height in cells (1-12).
    #[arg(long, default_value = "5", value_name = "N", value_parser = clap::value_parser!(u16).range(1..=12))]
    pub rows: u16,

    /// Number of block colours in play (1-6, taken from the theme).
    #[arg(long, default_value = "3", value_name = "N", value_parser = clap::value_parser!(u8).range(1..=6))]
    pub colors: u8,

    /// Smallest group of same-coloured cells that clears.
    #[arg(long, default_value = "3", value_name = "N")]
    pub min_match: u8,

    /// Points for each cleared cell.
    #[arg(long, default_value = "10", value_name = "N")]
    pub points_per_cell: u32,

    /// Probability of a 1- or 4-block sequence instead of 2 or 3.
    #[arg(long, default_value = "0.33", value_name = "P")]
    pub one_or_four_chance: f64,

    /// Seed for block generation (same seed, same sequences).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Save file. Defaults to $XDG_CONFIG_HOME/cubelinetui/save.json.
    #[arg(long, value_name = "FILE")]
    pub save_file: Option<PathBuf>,

    /// Neither load nor write the save file.
    #[arg(long)]
    pub no_save: bool,

    /// Disable the clear animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (nothing is logged otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: tracing::Level,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("cubelinetui").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_classic_rules() {
        let args = parse(&[]);
        let config = GameConfig::from_args(&args, &Theme::default());
        assert_eq!((config.columns, config.rows), (5, 5));
        assert_eq!(config.palette.len(), 3);
        assert_eq!(config.min_match, 3);
        assert_eq!(config.points_per_cell, 10);
        assert!((config.one_or_four_chance - 0.33).abs() < f64::EPSILON);
        assert_eq!(config.seed, None);
        assert_eq!(args.log_level, tracing::Level::INFO);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn colour_count_is_bounded() {
        assert!(Args::try_parse_from(["cubelinetui", "--colors", "7"]).is_err());
        assert!(Args::try_parse_from(["cubelinetui", "--colors", "0"]).is_err());
        assert_eq!(parse(&["--colors", "6"]).colors, 6);
    }

    #[test]
    fn palette_aliases() {
        assert_eq!(parse(&["--palette", "contrast"]).palette, Palette::HighContrast);
        assert_eq!(parse(&["--palette", "colourblind"]).palette, Palette::Colorblind);
    }

    #[test]
    fn chance_is_clamped() {
        let args = parse(&["--one-or-four-chance", "3.5"]);
        let config = GameConfig::from_args(&args, &Theme::default());
        assert!((config.one_or_four_chance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn board_size_is_bounded() {
        for flag in ["--columns", "--rows"] {
            assert!(Args::try_parse_from(["cubelinetui", flag, "0"]).is_err());
            assert!(Args::try_parse_from(["cubelinetui", flag, "13"]).is_err());
            assert!(Args::try_parse_from(["cubelinetui", flag, "20000"]).is_err());
        }
        let args = parse(&["--columns", "12", "--rows", "1"]);
        assert_eq!((args.columns, args.rows), (12, 1));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = GameConfig::from_args(&parse(&[]), &Theme::default());
        config.columns = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGrid { columns: 0, rows: 5 })
        );

        let args = parse(&["--min-match", "0"]);
        let config = GameConfig::from_args(&args, &Theme::default());
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinMatch));

        let mut config = GameConfig::from_args(&parse(&[]), &Theme::default());
        config.palette.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));
    }
}
