//! Runs one generator for the configured tile and renders it as an image.

use glam::{DVec2, I64Vec2};
use tessera_config::{Config, GeneratorKind};
use tessera_worldgen::debug_viz::{
    DebugImage, render_cave, render_city, render_dungeon, render_foliage, render_rgba,
};
use tessera_worldgen::sampling::normalized_heights;
use tessera_worldgen::{
    CaveGenerator, CellTile, CityGenerator, ColormapGenerator, DungeonGenerator,
    HeightmapGenerator, WorldTile, place_foliage,
};

fn world_tile(config: &Config) -> WorldTile {
    let t = &config.tile;
    WorldTile::new(
        t.seed,
        t.width,
        t.height,
        DVec2::new(t.origin_x, t.origin_y),
        t.units_per_cell,
    )
}

fn cell_tile(config: &Config) -> CellTile {
    let t = &config.tile;
    CellTile::new(t.seed, t.width, t.height, cell_origin(config))
}

/// The tile origin snapped to the nearest world cell.
pub fn cell_origin(config: &Config) -> I64Vec2 {
    I64Vec2::new(
        config.tile.origin_x.round() as i64,
        config.tile.origin_y.round() as i64,
    )
}

/// Generate `kind` for the configured tile.
///
/// `kind` must be a concrete generator; [`GeneratorKind::All`] renders the
/// heightmap.
pub fn render(kind: GeneratorKind, config: &Config) -> DebugImage {
    let tile = world_tile(config);
    match kind {
        GeneratorKind::Heightmap | GeneratorKind::All => {
            render_rgba(&HeightmapGenerator::new(config.terrain.clone()).generate(tile))
        }
        GeneratorKind::Colormap => {
            let world_width = config.tile.world_width();
            let heights = HeightmapGenerator::new(config.terrain.clone()).generate_world_size(
                tile.seed,
                tile.width,
                tile.height,
                tile.origin,
                world_width,
            );
            let colors = ColormapGenerator::new(config.terrain.clone()).colorize(
                &heights,
                tile.seed,
                tile.origin,
                world_width,
                config.tile.texture_width,
                config.tile.texture_height,
            );
            render_rgba(&colors)
        }
        GeneratorKind::City => render_city(&CityGenerator::new(config.city.clone()).generate(tile)),
        GeneratorKind::Dungeon => {
            let generator = DungeonGenerator::new(config.dungeon.clone());
            render_dungeon(&generator.generate(cell_tile(config)))
        }
        GeneratorKind::Cave => {
            let generator = CaveGenerator::new(config.cave.clone());
            render_cave(&generator.generate(cell_tile(config)))
        }
        GeneratorKind::Foliage => {
            // Foliage works on a square field.
            let size = tile.width.min(tile.height);
            let square = WorldTile::new(tile.seed, size, size, tile.origin, tile.units_per_cell);
            let heights = HeightmapGenerator::new(config.terrain.clone()).generate(square);
            let field = normalized_heights(&heights);
            let points = place_foliage(size, &field, &config.forest, tile.seed);
            tracing::info!("placed {} foliage points", points.len());
            render_foliage(&heights, &points)
        }
    }
}
