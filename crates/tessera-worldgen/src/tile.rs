//! Tile requests and the row-major rasters generators return.

use glam::{DVec2, I64Vec2};

/// An RGBA8 pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba {
    /// Opaque colour from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque grey with `R = G = B = v`.
    pub const fn grey(v: u8) -> Self {
        Self::rgb(v, v, v)
    }
}

/// A `width x height` grid of values stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster<T> {
    width: usize,
    height: usize,
    pixels: Vec<T>,
}

impl<T: Copy> Raster<T> {
    /// Create a raster filled with `fill`.
    pub fn filled(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// Build a raster by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        self.pixels[y * self.width + x]
    }

    /// Value at `(x, y)`, or `None` outside the raster.
    #[inline]
    pub fn try_get(&self, x: i64, y: i64) -> Option<T> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    /// Overwrite the value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        self.pixels[y * self.width + x] = value;
    }

    /// Convert every cell with `f`.
    pub fn map<U: Copy>(&self, f: impl FnMut(T) -> U) -> Raster<U> {
        Raster {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().copied().map(f).collect(),
        }
    }

    /// Copy the `width x height` window whose top-left corner is `(x0, y0)`.
    ///
    /// # Panics
    ///
    /// Panics if the window does not fit inside the raster.
    pub fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        assert!(x0 + width <= self.width && y0 + height <= self.height);
        Self::from_fn(width, height, |x, y| self.get(x0 + x, y0 + y))
    }
}

impl<T> Raster<T> {
    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns `true` if the raster has no cells.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major cell slice.
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    /// Consume the raster and return its row-major cells.
    pub fn into_pixels(self) -> Vec<T> {
        self.pixels
    }

    /// Iterate `(x, y, &value)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, v)| (i % width, i / width, v))
    }
}

impl Raster<Rgba> {
    /// Raw RGBA8 bytes, `width * height * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Greyscale heightmap: `R = G = B` in `[0, 255]`, `A = 255`.
pub type HeightTile = Raster<Rgba>;
/// Biome-tinted colour texture.
pub type ColorTile = Raster<Rgba>;
/// City heights: 0 is street, anything above is a building level.
pub type CityTile = Raster<u8>;
/// Dungeon cell classes.
pub type DungeonTile = Raster<DungeonCell>;
/// Cave cell classes.
pub type CaveTile = Raster<CaveCell>;

/// Dungeon cell class.
///
/// Ordered by carving precedence: a door is never downgraded to floor.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DungeonCell {
    /// Solid rock.
    #[default]
    Wall = 0,
    /// Room or corridor floor.
    Floor = 1,
    /// Passable floor where a corridor enters a room.
    Door = 2,
}

impl DungeonCell {
    /// Returns `true` for floor and door cells.
    pub fn is_open(self) -> bool {
        !matches!(self, DungeonCell::Wall)
    }
}

/// Cave cell class.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CaveCell {
    /// Solid rock.
    #[default]
    Wall = 0,
    /// Open floor.
    Floor = 1,
}

/// A raster request addressed in continuous world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTile {
    /// World seed.
    pub seed: i64,
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
    /// World position of cell `(0, 0)`.
    pub origin: DVec2,
    /// World units between adjacent cells.
    pub units_per_cell: f64,
}

impl WorldTile {
    /// Create a request.
    pub fn new(seed: i64, width: usize, height: usize, origin: DVec2, units_per_cell: f64) -> Self {
        Self {
            seed,
            width,
            height,
            origin,
            units_per_cell,
        }
    }

    /// The cell spacing, with non-positive or non-finite values replaced by 1.
    pub fn spacing(&self) -> f64 {
        valid_spacing(self.units_per_cell).unwrap_or(1.0)
    }

    /// The same request with a degenerate spacing replaced by 1.
    ///
    /// Generators call this once per tile; the correction is logged here
    /// rather than on every [`Self::world_coord`].
    pub fn sanitized(self) -> Self {
        Self {
            units_per_cell: sanitize_spacing(self.units_per_cell),
            ..self
        }
    }

    /// World coordinate of cell `(x, y)`.
    #[inline]
    pub fn world_coord(&self, x: usize, y: usize) -> DVec2 {
        let step = self.spacing();
        DVec2::new(
            self.origin.x + x as f64 * step,
            self.origin.y + y as f64 * step,
        )
    }
}

/// A raster request addressed in integer world cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellTile {
    /// World seed.
    pub seed: i64,
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
    /// World cell of local `(0, 0)`.
    pub origin: I64Vec2,
}

impl CellTile {
    /// Create a request.
    pub fn new(seed: i64, width: usize, height: usize, origin: I64Vec2) -> Self {
        Self {
            seed,
            width,
            height,
            origin,
        }
    }

    /// Inclusive world-cell bounds `(min, max)`, or `None` for an empty tile.
    pub fn world_bounds(&self) -> Option<(I64Vec2, I64Vec2)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let max = self.origin + I64Vec2::new(self.width as i64 - 1, self.height as i64 - 1);
        Some((self.origin, max))
    }
}

fn valid_spacing(units_per_cell: f64) -> Option<f64> {
    (units_per_cell > 0.0 && units_per_cell.is_finite()).then_some(units_per_cell)
}

/// Replace a degenerate cell spacing with 1, warning once per call.
pub(crate) fn sanitize_spacing(units_per_cell: f64) -> f64 {
    valid_spacing(units_per_cell).unwrap_or_else(|| {
        tracing::warn!("units per cell {units_per_cell} is not positive, using 1.0");
        1.0
    })
}

/// FNV-1a 64-bit digest of a byte stream, used for raster snapshots.
pub fn fnv1a_64(bytes: impl IntoIterator<Item = u8>) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_row_major() {
        let r = Raster::from_fn(3, 2, |x, y| (y * 10 + x) as u8);
        assert_eq!(r.pixels(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(r.get(2, 1), 12);
    }

    #[test]
    fn test_try_get_out_of_bounds() {
        let r = Raster::filled(4, 4, 1u8);
        assert_eq!(r.try_get(-1, 0), None);
        assert_eq!(r.try_get(0, 4), None);
        assert_eq!(r.try_get(3, 3), Some(1));
    }

    #[test]
    fn test_crop() {
        let r = Raster::from_fn(4, 4, |x, y| (y * 4 + x) as u8);
        let c = r.crop(1, 2, 2, 2);
        assert_eq!(c.pixels(), &[9, 10, 13, 14]);
    }

    #[test]
    fn test_rgba_bytes_layout() {
        let r = Raster::filled(2, 1, Rgba::rgb(1, 2, 3));
        assert_eq!(r.as_bytes(), &[1, 2, 3, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn test_degenerate_spacing_is_one() {
        let tile = WorldTile::new(0, 2, 2, DVec2::new(5.0, 5.0), -3.0);
        assert_eq!(tile.world_coord(1, 1), DVec2::new(6.0, 6.0));
        let tile = WorldTile::new(0, 2, 2, DVec2::ZERO, f64::NAN);
        assert_eq!(tile.spacing(), 1.0);
        assert_eq!(tile.sanitized().units_per_cell, 1.0);
        let tile = WorldTile::new(0, 2, 2, DVec2::ZERO, 0.25);
        assert_eq!(tile.sanitized(), tile);
    }

    #[test]
    fn test_cell_tile_bounds() {
        let tile = CellTile::new(0, 10, 5, I64Vec2::new(-3, 4));
        assert_eq!(
            tile.world_bounds(),
            Some((I64Vec2::new(-3, 4), I64Vec2::new(6, 8)))
        );
        assert_eq!(CellTile::new(0, 0, 5, I64Vec2::ZERO).world_bounds(), None);
    }

    #[test]
    fn test_fnv_known_value() {
        assert_eq!(fnv1a_64(*b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(*b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
