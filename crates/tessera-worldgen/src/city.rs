//! City block height tiles.
//!
//! The world is divided into square blocks separated by streets. Each block
//! interior is split into lots, and each lot holds at most one rectangular
//! building whose footprint and height are hashed from the lot's world key.

use serde::{Deserialize, Serialize};

use crate::noise::{hash_01, lerp};
use crate::tile::{CityTile, WorldTile};

/// City layout configuration, in world units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    /// Side length of a block including its street. Default: 2000.
    pub block_size: f64,
    /// Street width along the far edges of each block. Default: 3.
    pub street_width: f64,
    /// Lots per block along each axis. Default: 4.
    pub lots_per_block: u32,
    /// Fraction of the lot size left empty on every side. Default: 0.14.
    pub lot_inset: f64,
    /// Probability that a lot holds a building. Default: 0.80.
    pub build_probability: f64,
    /// Lowest building height. Default: 18.
    pub min_height: f64,
    /// Tallest building height. Default: 120.
    pub max_height: f64,
    /// Number of distinct building heights. Default: 10.
    pub height_levels: u32,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            block_size: 2000.0,
            street_width: 3.0,
            lots_per_block: 4,
            lot_inset: 0.14,
            build_probability: 0.80,
            min_height: 18.0,
            max_height: 120.0,
            height_levels: 10,
        }
    }
}

/// Per-lot hash streams.
const SALT_BUILD: i64 = 1001;
const SALT_WIDTH: i64 = 1002;
const SALT_DEPTH: i64 = 1003;
const SALT_OFFSET_X: i64 = 1004;
const SALT_OFFSET_Y: i64 = 1005;
const SALT_HEIGHT: i64 = 1006;

/// Footprint size as a fraction of the inset lot.
const FOOTPRINT_MIN: f64 = 0.60;
const FOOTPRINT_MAX: f64 = 0.92;

/// Generates city height tiles.
#[derive(Clone, Debug, Default)]
pub struct CityGenerator {
    config: CityConfig,
}

impl CityGenerator {
    /// Create a generator for `config`.
    pub fn new(config: CityConfig) -> Self {
        Self { config }
    }

    /// Returns the layout configuration.
    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    /// Generate a tile of building heights; 0 is street or open ground.
    pub fn generate(&self, tile: WorldTile) -> CityTile {
        let cfg = &self.config;
        let interior = cfg.block_size - cfg.street_width;
        if interior <= 1.0 || cfg.lots_per_block == 0 {
            tracing::warn!(
                "city block interior {interior} with {} lots is degenerate, emitting streets only",
                cfg.lots_per_block
            );
            return CityTile::filled(tile.width, tile.height, 0);
        }

        let tile = tile.sanitized();
        let layout = BlockLayout {
            interior,
            lot_size: interior / f64::from(cfg.lots_per_block),
        };
        CityTile::from_fn(tile.width, tile.height, |x, y| {
            let w = tile.world_coord(x, y);
            self.height_at(&layout, tile.seed, w.x, w.y)
        })
    }

    fn height_at(&self, layout: &BlockLayout, seed: i64, wx: f64, wy: f64) -> u8 {
        let cfg = &self.config;
        let bx = (wx / cfg.block_size).floor() as i64;
        let by = (wy / cfg.block_size).floor() as i64;
        let lx = wx - bx as f64 * cfg.block_size;
        let ly = wy - by as f64 * cfg.block_size;

        if lx >= layout.interior || ly >= layout.interior {
            return 0;
        }

        let lot = layout.lot_size;
        let lot_x = (lx / lot) as i64;
        let lot_y = (ly / lot) as i64;
        let llx = lx - lot_x as f64 * lot;
        let lly = ly - lot_y as f64 * lot;

        let inset = lot * cfg.lot_inset;
        if llx < inset || llx > lot - inset || lly < inset || lly > lot - inset {
            return 0;
        }

        let key_x = bx.wrapping_mul(1000).wrapping_add(lot_x);
        let key_y = by.wrapping_mul(1000).wrapping_add(lot_y);
        let stream = |salt: i64| hash_01(key_x, key_y, seed.wrapping_add(salt));

        if stream(SALT_BUILD) > cfg.build_probability {
            return 0;
        }

        let inner = lot - 2.0 * inset;
        let foot_w = inner * lerp(FOOTPRINT_MIN, FOOTPRINT_MAX, stream(SALT_WIDTH));
        let foot_h = inner * lerp(FOOTPRINT_MIN, FOOTPRINT_MAX, stream(SALT_DEPTH));
        let off_x = (stream(SALT_OFFSET_X) - 0.5) * (inner - foot_w) * 0.25;
        let off_y = (stream(SALT_OFFSET_Y) - 0.5) * (inner - foot_h) * 0.25;

        let cx = inset + inner * 0.5 + off_x;
        let cy = inset + inner * 0.5 + off_y;
        if llx < cx - foot_w * 0.5
            || llx > cx + foot_w * 0.5
            || lly < cy - foot_h * 0.5
            || lly > cy + foot_h * 0.5
        {
            return 0;
        }

        // Skew toward low buildings before quantising.
        let r = stream(SALT_HEIGHT).powf(1.9);
        let level = quantize_levels(r, cfg.height_levels);
        lerp(cfg.min_height, cfg.max_height, level)
            .clamp(0.0, 255.0)
            .round() as u8
    }
}

struct BlockLayout {
    interior: f64,
    lot_size: f64,
}

/// Snap `v` in `[0, 1]` to one of `levels` evenly spaced values.
fn quantize_levels(v: f64, levels: u32) -> f64 {
    if levels <= 1 {
        return v;
    }
    let steps = f64::from(levels - 1);
    (v * steps).round() / steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn tile(seed: i64, origin: DVec2, upp: f64) -> WorldTile {
        WorldTile::new(seed, 64, 64, origin, upp)
    }

    #[test]
    fn test_streets_every_forty_cells() {
        let city = CityGenerator::default().generate(tile(1, DVec2::ZERO, 50.0));
        for k in [0, 40] {
            for i in 0..64 {
                assert_eq!(city.get(k, i), 0, "column {k} row {i}");
                assert_eq!(city.get(i, k), 0, "row {k} column {i}");
            }
        }
    }

    #[test]
    fn test_has_buildings() {
        let city = CityGenerator::default().generate(tile(1, DVec2::ZERO, 50.0));
        assert_eq!(city.get(53, 2), 52);
        assert!(city.pixels().iter().filter(|&&h| h > 0).count() > 500);
    }

    #[test]
    fn test_heights_are_quantised_levels() {
        let cfg = CityConfig::default();
        let levels: Vec<u8> = (0..cfg.height_levels)
            .map(|i| {
                let q = f64::from(i) / f64::from(cfg.height_levels - 1);
                lerp(cfg.min_height, cfg.max_height, q).round() as u8
            })
            .collect();
        let city = CityGenerator::new(cfg).generate(tile(9, DVec2::new(-7000.0, 3000.0), 37.5));
        for &h in city.pixels() {
            assert!(h == 0 || levels.contains(&h), "unexpected height {h}");
        }
    }

    #[test]
    fn test_deterministic() {
        let g = CityGenerator::default();
        let t = tile(4, DVec2::new(123.0, -456.0), 25.0);
        assert_eq!(g.generate(t), g.generate(t));
    }

    #[test]
    fn test_seed_changes_buildings() {
        let g = CityGenerator::default();
        let a = g.generate(tile(100, DVec2::ZERO, 50.0));
        let b = g.generate(tile(101, DVec2::ZERO, 50.0));
        let (mut built, mut changed) = (0, 0);
        for (&p, &q) in a.pixels().iter().zip(b.pixels()) {
            if p != 0 || q != 0 {
                built += 1;
                if p != q {
                    changed += 1;
                }
            }
        }
        assert!(built > 0);
        assert!(
            changed * 2 >= built,
            "only {changed} of {built} building cells changed"
        );
    }

    #[test]
    fn test_degenerate_block_is_all_street() {
        let cfg = CityConfig {
            block_size: 3.5,
            ..CityConfig::default()
        };
        let city = CityGenerator::new(cfg).generate(tile(1, DVec2::ZERO, 1.0));
        assert!(city.pixels().iter().all(|&h| h == 0));
    }

    #[test]
    fn test_negative_world_uses_floor_blocks() {
        // A pixel just left of the origin lies in the street of block -1.
        let g = CityGenerator::default();
        let t = WorldTile::new(1, 1, 1, DVec2::new(-1.0, 10.0), 1.0);
        assert_eq!(g.generate(t).get(0, 0), 0);
    }

    #[test]
    fn test_quantize_levels() {
        assert_eq!(quantize_levels(0.0, 10), 0.0);
        assert_eq!(quantize_levels(1.0, 10), 1.0);
        assert_eq!(quantize_levels(0.5, 3), 0.5);
        assert_eq!(quantize_levels(0.37, 1), 0.37);
    }
}
