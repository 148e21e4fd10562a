//! Tile debug renderers: heightmap, colormap, city, dungeon, cave and foliage.

use super::image::DebugImage;
use crate::foliage::FoliagePoint;
use crate::tile::{CaveCell, CaveTile, CityTile, DungeonCell, DungeonTile, Raster, Rgba};

const STREET: Rgba = Rgba::rgb(30, 30, 35);
const FOLIAGE: Rgba = Rgba::rgb(30, 140, 40);

/// Copy an RGBA raster (heightmap or colormap) into an image.
pub fn render_rgba(tile: &Raster<Rgba>) -> DebugImage {
    DebugImage::from_raster(tile, |p| p)
}

/// Streets dark, buildings brighter the taller they are.
pub fn render_city(tile: &CityTile) -> DebugImage {
    DebugImage::from_raster(tile, |h| match h {
        0 => STREET,
        h => Rgba::grey(h.saturating_mul(2)),
    })
}

/// Map a dungeon cell to an RGB color.
pub fn dungeon_color(cell: DungeonCell) -> Rgba {
    match cell {
        DungeonCell::Wall => Rgba::rgb(20, 20, 30),
        DungeonCell::Floor => Rgba::rgb(200, 190, 170),
        DungeonCell::Door => Rgba::rgb(200, 120, 40),
    }
}

pub fn render_dungeon(tile: &DungeonTile) -> DebugImage {
    DebugImage::from_raster(tile, dungeon_color)
}

/// Walls grey 100, floor grey 200.
pub fn render_cave(tile: &CaveTile) -> DebugImage {
    DebugImage::from_raster(tile, |cell| match cell {
        CaveCell::Wall => Rgba::grey(100),
        CaveCell::Floor => Rgba::grey(200),
    })
}

/// Mark foliage points over the heightmap they were placed on.
///
/// Points are in heightmap pixel coordinates; any outside the image are
/// skipped.
pub fn render_foliage(heights: &Raster<Rgba>, points: &[FoliagePoint]) -> DebugImage {
    let mut image = render_rgba(heights);
    for p in points {
        if p.x < 0.0 || p.z < 0.0 {
            continue;
        }
        let (x, y) = (p.x as u32, p.z as u32);
        if x < image.width && y < image.height {
            image.set_pixel(x, y, FOLIAGE);
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::CaveGenerator;
    use crate::dungeon::DungeonGenerator;
    use crate::tile::CellTile;
    use glam::I64Vec2;

    #[test]
    fn test_cave_image_has_two_states() {
        let cave = CaveGenerator::default().generate(CellTile::new(42, 64, 64, I64Vec2::ZERO));
        let image = render_cave(&cave);
        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(image.unique_color_count(), 2);
        for (x, y, &cell) in cave.iter_cells() {
            let expected = if cell == CaveCell::Floor { 200 } else { 100 };
            assert_eq!(image.get_pixel(x as u32, y as u32), Rgba::grey(expected));
        }
    }

    #[test]
    fn test_dungeon_image_uses_cell_colors() {
        let dungeon =
            DungeonGenerator::default().generate(CellTile::new(42, 64, 64, I64Vec2::ZERO));
        let image = render_dungeon(&dungeon);
        assert_eq!(image.pixels.len(), 64 * 64 * 4);
        assert_eq!(image.unique_color_count(), 3);
        assert_eq!(image.get_pixel(24, 3), dungeon_color(DungeonCell::Floor));
    }

    #[test]
    fn test_city_streets_are_dark() {
        let mut city = CityTile::filled(2, 1, 0);
        city.set(1, 0, 60);
        let image = render_city(&city);
        assert_eq!(image.get_pixel(0, 0), STREET);
        assert_eq!(image.get_pixel(1, 0), Rgba::grey(120));
    }

    #[test]
    fn test_foliage_marks_points() {
        let heights = Raster::filled(8, 8, Rgba::grey(90));
        let points = [
            FoliagePoint { x: 2.7, z: 5.1 },
            FoliagePoint { x: 9.0, z: 1.0 },
            FoliagePoint { x: -0.5, z: 1.0 },
        ];
        let image = render_foliage(&heights, &points);
        assert_eq!(image.get_pixel(2, 5), FOLIAGE);
        assert_eq!(image.get_pixel(0, 1), Rgba::grey(90));
        assert_eq!(image.unique_color_count(), 2);
    }
}
