//! Overlapping and adjacent tiles agree cell for cell.

use std::fmt::Debug;

use glam::{DVec2, I64Vec2};
use tessera_worldgen::*;

const SIZE: usize = 128;
/// Offsets of the second tile relative to the first, in cells.
const OFFSETS: [(i64, i64); 4] = [(64, 32), (-50, 77), (100, -100), (-13, -29)];

/// Compare every cell of `b` that also lies in `a`; returns how many matched.
fn assert_overlap<T: Copy + PartialEq + Debug>(
    name: &str,
    a: &Raster<T>,
    b: &Raster<T>,
    offset: (i64, i64),
) -> usize {
    let mut compared = 0;
    for (x, y, &cell) in b.iter_cells() {
        let ax = x as i64 + offset.0;
        let ay = y as i64 + offset.1;
        if let Some(expected) = a.try_get(ax, ay) {
            assert_eq!(
                cell, expected,
                "{name}: offset {offset:?}, local ({x}, {y})"
            );
            compared += 1;
        }
    }
    compared
}

fn world_pair(
    origin: DVec2,
    upp: f64,
    offset: (i64, i64),
    seed: i64,
) -> (WorldTile, WorldTile) {
    let shifted = origin + DVec2::new(offset.0 as f64, offset.1 as f64) * upp;
    (
        WorldTile::new(seed, SIZE, SIZE, origin, upp),
        WorldTile::new(seed, SIZE, SIZE, shifted, upp),
    )
}

fn cell_pair(origin: I64Vec2, offset: (i64, i64), seed: i64) -> (CellTile, CellTile) {
    (
        CellTile::new(seed, SIZE, SIZE, origin),
        CellTile::new(seed, SIZE, SIZE, origin + I64Vec2::new(offset.0, offset.1)),
    )
}

#[test]
fn test_heightmap_overlaps_agree() {
    let generator = HeightmapGenerator::default();
    let mut compared = 0;
    for offset in OFFSETS {
        let (a, b) = world_pair(DVec2::new(-300.0, 1200.0), 0.75, offset, 17);
        let (tile_a, tile_b) = (generator.generate(a), generator.generate(b));
        compared += assert_overlap("heightmap", &tile_a, &tile_b, offset);
    }
    assert!(compared >= 10_000, "only {compared} cells compared");
}

#[test]
fn test_city_overlaps_agree() {
    let generator = CityGenerator::default();
    let mut compared = 0;
    for offset in OFFSETS {
        let (a, b) = world_pair(DVec2::new(-4000.0, 2500.0), 37.5, offset, 5);
        let (tile_a, tile_b) = (generator.generate(a), generator.generate(b));
        compared += assert_overlap("city", &tile_a, &tile_b, offset);
    }
    assert!(compared >= 10_000, "only {compared} cells compared");
}

#[test]
fn test_dungeon_overlaps_agree() {
    let generator = DungeonGenerator::default();
    let mut compared = 0;
    for offset in OFFSETS {
        let (a, b) = cell_pair(I64Vec2::new(-200, 90), offset, 42);
        let (tile_a, tile_b) = (generator.generate(a), generator.generate(b));
        compared += assert_overlap("dungeon", &tile_a, &tile_b, offset);
    }
    assert!(compared >= 10_000, "only {compared} cells compared");
}

#[test]
fn test_cave_overlaps_agree() {
    let generator = CaveGenerator::default();
    let mut compared = 0;
    for offset in OFFSETS {
        let (a, b) = cell_pair(I64Vec2::new(77, -300), offset, 7);
        let (tile_a, tile_b) = (generator.generate(a), generator.generate(b));
        compared += assert_overlap("cave", &tile_a, &tile_b, offset);
    }
    assert!(compared >= 10_000, "only {compared} cells compared");
}

#[test]
fn test_heightmap_and_colormap_share_tile_edges() {
    const WORLD: f64 = 256.0;
    let heights = HeightmapGenerator::default();
    let colors = ColormapGenerator::default();

    for seed in [1, 99, -4] {
        let left_origin = DVec2::new(-WORLD, 3.0 * WORLD);
        let right_origin = left_origin + DVec2::new(WORLD, 0.0);
        let below_origin = left_origin + DVec2::new(0.0, WORLD);

        let left = heights.generate_world_size(seed, SIZE + 1, SIZE + 1, left_origin, WORLD);
        let right = heights.generate_world_size(seed, SIZE + 1, SIZE + 1, right_origin, WORLD);
        let below = heights.generate_world_size(seed, SIZE + 1, SIZE + 1, below_origin, WORLD);
        for i in 0..=SIZE {
            assert_eq!(left.get(SIZE, i), right.get(0, i), "seed {seed} row {i}");
            assert_eq!(left.get(i, SIZE), below.get(i, 0), "seed {seed} column {i}");
        }

        let tex = 65;
        let left_c = colors.colorize(&left, seed, left_origin, WORLD, tex, tex);
        let right_c = colors.colorize(&right, seed, right_origin, WORLD, tex, tex);
        for i in 0..tex {
            assert_eq!(left_c.get(tex - 1, i), right_c.get(0, i), "seed {seed} texel row {i}");
        }
    }
}
