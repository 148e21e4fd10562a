//! Command-line argument parsing for the tessera tools.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::Config;

/// Which generator to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GeneratorKind {
    Heightmap,
    Colormap,
    City,
    Dungeon,
    Cave,
    Foliage,
    /// Every generator above.
    All,
}

impl GeneratorKind {
    /// The concrete generators this kind stands for.
    pub fn expand(self) -> &'static [GeneratorKind] {
        use GeneratorKind::*;
        match self {
            All => &[Heightmap, Colormap, City, Dungeon, Cave, Foliage],
            Heightmap => &[Heightmap],
            Colormap => &[Colormap],
            City => &[City],
            Dungeon => &[Dungeon],
            Cave => &[Cave],
            Foliage => &[Foliage],
        }
    }

    /// Lowercase name used in file names.
    pub fn name(self) -> &'static str {
        match self {
            GeneratorKind::Heightmap => "heightmap",
            GeneratorKind::Colormap => "colormap",
            GeneratorKind::City => "city",
            GeneratorKind::Dungeon => "dungeon",
            GeneratorKind::Cave => "cave",
            GeneratorKind::Foliage => "foliage",
            GeneratorKind::All => "all",
        }
    }
}

/// tessera command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Deterministic tileable world generation")]
pub struct CliArgs {
    /// Generator to run.
    #[arg(value_enum)]
    pub kind: GeneratorKind,

    /// World seed.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Tile width in cells.
    #[arg(long)]
    pub width: Option<usize>,

    /// Tile height in cells.
    #[arg(long)]
    pub height: Option<usize>,

    /// World X of the tile origin.
    #[arg(long, allow_negative_numbers = true)]
    pub origin_x: Option<f64>,

    /// World Y of the tile origin.
    #[arg(long, allow_negative_numbers = true)]
    pub origin_y: Option<f64>,

    /// World units between cells.
    #[arg(long)]
    pub units_per_cell: Option<f64>,

    /// Output directory for PNG files.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.tile.seed = seed;
        }
        if let Some(w) = args.width {
            self.tile.width = w;
        }
        if let Some(h) = args.height {
            self.tile.height = h;
        }
        if let Some(x) = args.origin_x {
            self.tile.origin_x = x;
        }
        if let Some(y) = args.origin_y {
            self.tile.origin_y = y;
        }
        if let Some(upc) = args.units_per_cell {
            self.tile.units_per_cell = upc;
        }
        if let Some(ref dir) = args.output {
            self.output.directory = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
