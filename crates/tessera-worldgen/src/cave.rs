//! Field-based cave tiles.
//!
//! A cell is floor where any of several band-pass noise fields says so:
//! two corridor networks where warped FBM crosses zero, low-frequency room
//! blobs and a slow "worm" field. Two cellular smoothing passes clean up
//! specks, and world-anchored backbone corridors keep neighbouring tiles
//! connected.
//!
//! Smoothing reads neighbours, so the field is evaluated over the tile plus
//! an apron as wide as the number of passes and then cropped. Every output
//! cell therefore depends only on world data around it.

use glam::I64Vec2;
use serde::{Deserialize, Serialize};

use crate::noise::{Basis, Fractal, clamp01, smoothstep, to_unit};
use crate::tile::{CaveCell, CaveTile, CellTile};

/// Configuration for cave generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Half-width of the corridor bands in noise units. Higher values open
    /// more corridors. Default: 0.18.
    pub corridor_width: f64,
    /// Frequency of the main corridor network. Default: 0.060.
    pub corridor_frequency: f64,
    /// Frequency of the secondary, branchier network. Default: 0.095.
    pub branch_frequency: f64,
    /// Frequency of room blobs. Lower values make bigger rooms. Default: 0.035.
    pub room_frequency: f64,
    /// Noise level where rooms start; the mask ramps up over the next 0.10.
    /// Default: 0.62.
    pub room_cut: f64,
    /// Frequency of the worm field. Default: 0.030.
    pub worm_frequency: f64,
    /// Frequency of the domain warp applied to the corridor fields. Default: 0.040.
    pub warp_frequency: f64,
    /// Domain warp displacement in cells. Default: 1.25.
    pub warp_strength: f64,
    /// Cells whose floor score exceeds this become floor. Default: 0.22.
    pub floor_threshold: f64,
    /// Number of cellular smoothing passes. Default: 2.
    pub smoothing_steps: u32,
    /// Width of the world bands that each carry one backbone corridor per
    /// axis. 0 disables the backbone. Default: 128.
    pub backbone_spacing: u32,
    /// Frequency of the backbone meander. Default: 0.02.
    pub backbone_frequency: f64,
    /// Backbone meander amplitude as a fraction of the spacing. Default: 0.18.
    pub backbone_amplitude: f64,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            corridor_width: 0.18,
            corridor_frequency: 0.060,
            branch_frequency: 0.095,
            room_frequency: 0.035,
            room_cut: 0.62,
            worm_frequency: 0.030,
            warp_frequency: 0.040,
            warp_strength: 1.25,
            floor_threshold: 0.22,
            smoothing_steps: 2,
            backbone_spacing: 128,
            backbone_frequency: 0.02,
            backbone_amplitude: 0.18,
        }
    }
}

/// Wall-to-floor when at least this many of the 8 neighbours are floor.
const OPEN_NEIGHBOURS: usize = 6;
/// Floor-to-wall when at most this many neighbours are floor.
const CLOSE_NEIGHBOURS: usize = 2;

/// The noise layers of one seed.
struct CaveField<'a> {
    config: &'a CaveConfig,
    warp_x: Fractal,
    warp_y: Fractal,
    corridors: Fractal,
    branches: Fractal,
    rooms: Fractal,
    worms: Fractal,
}

impl<'a> CaveField<'a> {
    fn new(config: &'a CaveConfig, seed: i64) -> Self {
        let layer = |offset: i64, octaves: u32| {
            Fractal::new(Basis::Value, seed.wrapping_add(offset)).octaves(octaves)
        };
        Self {
            config,
            warp_x: layer(101, 3),
            warp_y: layer(202, 3),
            corridors: layer(303, 5),
            branches: layer(404, 4),
            rooms: layer(505, 3),
            worms: layer(606, 2),
        }
    }

    /// Combined floor score at a world cell, in `[0, 1]`.
    fn score(&self, cell: I64Vec2) -> f64 {
        let c = self.config;
        let fx = cell.x as f64;
        let fy = cell.y as f64;

        let wx = self.warp_x.fbm(fx * c.warp_frequency, fy * c.warp_frequency);
        let wy = self.warp_y.fbm(fx * c.warp_frequency, fy * c.warp_frequency);
        let fxw = fx + wx * c.warp_strength;
        let fyw = fy + wy * c.warp_strength;

        // Corridors follow the zero crossings of the noise.
        let a = self
            .corridors
            .fbm(fxw * c.corridor_frequency, fyw * c.corridor_frequency);
        let b = self
            .branches
            .fbm(fxw * c.branch_frequency, fyw * c.branch_frequency);
        let corridor = 1.0 - clamp01(a.abs() / c.corridor_width);
        let branch = 1.0 - clamp01(b.abs() / (c.corridor_width * 0.85));

        let room_noise = self.rooms.fbm(fx * c.room_frequency, fy * c.room_frequency);
        let room = smoothstep(c.room_cut, c.room_cut + 0.10, to_unit(room_noise));

        let flow = self.worms.fbm(fx * c.worm_frequency, fy * c.worm_frequency);
        let worm = 1.0 - clamp01(flow.abs() / (c.corridor_width * 0.9));

        corridor.max(branch * 0.9).max(worm * 0.65).max(room)
    }

    fn cell(&self, cell: I64Vec2) -> CaveCell {
        if self.score(cell) > self.config.floor_threshold {
            CaveCell::Floor
        } else {
            CaveCell::Wall
        }
    }
}

/// One cellular automaton pass; cells outside the raster count as absent.
fn smooth_once(grid: &CaveTile) -> CaveTile {
    CaveTile::from_fn(grid.width(), grid.height(), |x, y| {
        let (x, y) = (x as i64, y as i64);
        let mut floors = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx != 0 || dy != 0) && grid.try_get(x + dx, y + dy) == Some(CaveCell::Floor) {
                    floors += 1;
                }
            }
        }
        match grid.get(x as usize, y as usize) {
            CaveCell::Wall if floors >= OPEN_NEIGHBOURS => CaveCell::Floor,
            CaveCell::Floor if floors <= CLOSE_NEIGHBOURS => CaveCell::Wall,
            cell => cell,
        }
    })
}

/// Generates cave tiles.
#[derive(Clone, Debug, Default)]
pub struct CaveGenerator {
    config: CaveConfig,
}

impl CaveGenerator {
    /// Create a generator for `config`.
    pub fn new(config: CaveConfig) -> Self {
        Self { config }
    }

    /// Returns the cave configuration.
    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Generate a tile of wall and floor cells.
    pub fn generate(&self, tile: CellTile) -> CaveTile {
        if tile.width == 0 || tile.height == 0 {
            return CaveTile::filled(tile.width, tile.height, CaveCell::Wall);
        }

        let field = CaveField::new(&self.config, tile.seed);
        let apron = self.config.smoothing_steps as usize;
        let corner = tile.origin - I64Vec2::splat(apron as i64);

        let mut grid = CaveTile::from_fn(tile.width + 2 * apron, tile.height + 2 * apron, |x, y| {
            field.cell(corner + I64Vec2::new(x as i64, y as i64))
        });
        for _ in 0..self.config.smoothing_steps {
            grid = smooth_once(&grid);
        }
        let mut grid = grid.crop(apron, apron, tile.width, tile.height);

        if self.config.backbone_spacing > 0 {
            self.carve_backbone(&mut grid, &tile);
        }

        tracing::debug!(
            floor = grid.pixels().iter().filter(|&&c| c == CaveCell::Floor).count(),
            cells = grid.pixels().len(),
            "generated cave tile at ({}, {})",
            tile.origin.x,
            tile.origin.y
        );
        grid
    }

    /// Centre of band `band`'s meandering corridor at position `along` on
    /// the other axis.
    fn backbone_center(&self, meander: &Fractal, band: i64, along: i64, vertical: bool) -> i64 {
        let cfg = &self.config;
        let spacing = i64::from(cfg.backbone_spacing);
        let band_start = (band * spacing) as f64 * cfg.backbone_frequency;
        let along = along as f64 * cfg.backbone_frequency;
        let n = if vertical {
            meander.fbm(band_start, along)
        } else {
            meander.fbm(along, band_start)
        };
        let s = spacing as f64;
        band * spacing + (s / 2.0 + n * s * cfg.backbone_amplitude) as i64
    }

    /// Carve one 3-wide vertical and one horizontal corridor per world band.
    fn carve_backbone(&self, grid: &mut CaveTile, tile: &CellTile) {
        let spacing = i64::from(self.config.backbone_spacing);
        let (w, h) = (tile.width as i64, tile.height as i64);
        let origin = tile.origin;
        let vertical = Fractal::new(Basis::Value, tile.seed.wrapping_add(777)).octaves(3);
        let horizontal = Fractal::new(Basis::Value, tile.seed.wrapping_add(888)).octaves(3);

        let bands_x = (origin.x - 2).div_euclid(spacing)..=(origin.x + w + 1).div_euclid(spacing);
        let bands_y = (origin.y - 2).div_euclid(spacing)..=(origin.y + h + 1).div_euclid(spacing);

        for y in 0..h {
            for band in bands_x.clone() {
                let center = self.backbone_center(&vertical, band, origin.y + y, true);
                for x in center - 1 - origin.x..=center + 1 - origin.x {
                    if (0..w).contains(&x) {
                        grid.set(x as usize, y as usize, CaveCell::Floor);
                    }
                }
            }
        }
        for x in 0..w {
            for band in bands_y.clone() {
                let center = self.backbone_center(&horizontal, band, origin.x + x, false);
                for y in center - 1 - origin.y..=center + 1 - origin.y {
                    if (0..h).contains(&y) {
                        grid.set(x as usize, y as usize, CaveCell::Floor);
                    }
                }
            }
        }
    }
}
