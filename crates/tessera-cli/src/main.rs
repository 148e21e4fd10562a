//! `tessera`: generate world tiles and write them as PNG files.
//!
//! Run with: `cargo run -p tessera-cli -- all --seed 42 --width 256`

mod error;
mod render;

use std::path::{Path, PathBuf};

use clap::Parser;
use tessera_config::{CliArgs, Config, GeneratorKind};
use tessera_worldgen::debug_viz::DebugImage;
use tracing::{error, info};

use crate::error::CliError;

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    tessera_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(args.kind, &config) {
        Ok(written) => {
            for path in written {
                info!("wrote {}", path.display());
            }
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

/// Generate every requested kind in parallel and write one PNG per kind.
fn run(kind: GeneratorKind, config: &Config) -> Result<Vec<PathBuf>, CliError> {
    config.validate()?;
    let out_dir = &config.output.directory;
    std::fs::create_dir_all(out_dir).map_err(|source| CliError::OutputDir {
        path: out_dir.clone(),
        source,
    })?;

    info!(
        "seed {} tile {}x{} at ({}, {})",
        config.tile.seed,
        config.tile.width,
        config.tile.height,
        config.tile.origin_x,
        config.tile.origin_y
    );

    std::thread::scope(|scope| {
        let workers: Vec<_> = kind
            .expand()
            .iter()
            .map(|&k| {
                scope.spawn(move || {
                    let image = render::render(k, config);
                    let path = out_dir.join(file_name(k, config));
                    write_png(&image, &path).map(|()| path)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().map_err(|_| CliError::Worker)?)
            .collect()
    })
}

/// `<kind>_<seed>_<ox>_<oy>.png`.
fn file_name(kind: GeneratorKind, config: &Config) -> String {
    let origin = render::cell_origin(config);
    format!(
        "{}_{}_{}_{}.png",
        kind.name(),
        config.tile.seed,
        origin.x,
        origin.y
    )
}

fn write_png(image: &DebugImage, path: &Path) -> Result<(), CliError> {
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.pixels.clone())
        .ok_or_else(|| CliError::Buffer(path.to_path_buf()))?;
    buffer.save(path).map_err(|source| CliError::Image {
        path: path.to_path_buf(),
        source,
    })
}
