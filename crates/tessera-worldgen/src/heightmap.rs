//! Band-limited, domain-warped heightmap tiles.
//!
//! Composites continent, hill, ridge and valley layers of gradient noise into a
//! `[0, 255]` greyscale raster. Every layer is evaluated at the true world
//! coordinate of the pixel, so adjacent tiles agree bit for bit on shared
//! samples.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::noise::{Basis, Fractal, clamp01, perlin_2d, smoothstep, to_unit};
use crate::tile::{HeightTile, Rgba, WorldTile, sanitize_spacing};

/// World-defining terrain constants shared by the heightmap and colormap.
///
/// These describe the world rather than a tile: every tile of a world must be
/// generated with the same values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTunables {
    /// Normalised height of the shoreline. Default: 0.30.
    pub sea_level: f64,
    /// Width of the beach band above sea level. Default: 0.03.
    pub sand_band: f64,
    /// Height where grass gives way to rock. Default: 0.70.
    pub mountain_start: f64,
    /// Height where rock gives way to snow. Default: 0.86.
    pub snow_start: f64,
    /// Domain warp displacement, in units of one base wavelength. Default: 0.85.
    pub warp_strength: f64,
    /// Frequency of the domain warp fields in world units. Default: 0.10.
    pub warp_frequency: f64,
    /// Frequency applied to warped world coordinates. Default: 0.20.
    pub base_frequency: f64,
}

impl Default for TerrainTunables {
    fn default() -> Self {
        Self {
            sea_level: 0.30,
            sand_band: 0.03,
            mountain_start: 0.70,
            snow_start: 0.86,
            warp_strength: 0.85,
            warp_frequency: 0.10,
            base_frequency: 0.20,
        }
    }
}

/// Fraction of the Nyquist frequency the fractal layers may reach.
const NYQUIST_SAFETY: f64 = 0.85;

const CONTINENT_SCALE: f64 = 0.20;
const HILLS_SCALE: f64 = 0.75;
const MOUNTAIN_SCALE: f64 = 1.10;
const VALLEY_SCALE: f64 = 1.60;

/// Generates heightmap tiles for a fixed set of [`TerrainTunables`].
#[derive(Clone, Debug, Default)]
pub struct HeightmapGenerator {
    tunables: TerrainTunables,
}

impl HeightmapGenerator {
    /// Create a generator for a world described by `tunables`.
    pub fn new(tunables: TerrainTunables) -> Self {
        Self { tunables }
    }

    /// Returns the terrain tunables.
    pub fn tunables(&self) -> &TerrainTunables {
        &self.tunables
    }

    /// Generate a greyscale heightmap tile.
    ///
    /// Pixel `(x, y)` samples world position `origin + (x, y) * units_per_cell`.
    pub fn generate(&self, tile: WorldTile) -> HeightTile {
        let tile = tile.sanitized();
        let layers = Layers::new(tile.seed, tile.units_per_cell, &self.tunables);

        HeightTile::from_fn(tile.width, tile.height, |x, y| {
            let w = tile.world_coord(x, y);
            let h = layers.sample(w.x, w.y, &self.tunables);
            Rgba::grey(quantize(h))
        })
    }

    /// Generate a tile whose `width` pixels span exactly `world_width` units.
    ///
    /// Uses the shared-edge convention `units_per_cell = world_width / (width - 1)`,
    /// so the last column of one tile is the first column of its neighbour.
    pub fn generate_world_size(
        &self,
        seed: i64,
        width: usize,
        height: usize,
        origin: DVec2,
        world_width: f64,
    ) -> HeightTile {
        let upp = if width > 1 {
            world_width / (width - 1) as f64
        } else {
            1.0
        };
        self.generate(WorldTile::new(seed, width, height, origin, upp))
    }

    /// Normalised height in `[0, 1]` at a single world position.
    ///
    /// `units_per_pixel` sets the band limit exactly as [`Self::generate`]
    /// would for a tile at that resolution.
    pub fn sample(&self, seed: i64, world: DVec2, units_per_pixel: f64) -> f64 {
        let layers = Layers::new(seed, sanitize_spacing(units_per_pixel), &self.tunables);
        layers.sample(world.x, world.y, &self.tunables)
    }
}

/// Quantise a normalised height to a byte.
#[inline]
fn quantize(h: f64) -> u8 {
    (clamp01(h) * 255.0).round() as u8
}

/// The per-call noise layers, with band limits fixed by the pixel spacing.
struct Layers {
    seed: i64,
    continent: Fractal,
    hills: Fractal,
    mountains: Fractal,
    valleys: Fractal,
}

impl Layers {
    fn new(seed: i64, units_per_pixel: f64, tunables: &TerrainTunables) -> Self {
        let max_freq = 0.5 / units_per_pixel * NYQUIST_SAFETY;
        let limit = |scale: f64| max_freq / (tunables.base_frequency * scale);

        Self {
            seed,
            continent: Fractal::new(Basis::Perlin, seed.wrapping_add(303))
                .octaves(8)
                .band_limited(limit(CONTINENT_SCALE)),
            hills: Fractal::new(Basis::Perlin, seed.wrapping_add(404))
                .octaves(10)
                .lacunarity(2.05)
                .gain(0.52)
                .band_limited(limit(HILLS_SCALE)),
            mountains: Fractal::new(Basis::Perlin, seed.wrapping_add(505))
                .octaves(9)
                .band_limited(limit(MOUNTAIN_SCALE)),
            valleys: Fractal::new(Basis::Perlin, seed.wrapping_add(606))
                .octaves(6)
                .band_limited(limit(VALLEY_SCALE)),
        }
    }

    fn sample(&self, wx: f64, wy: f64, t: &TerrainTunables) -> f64 {
        // Domain warp, displacement measured in base wavelengths.
        let warp_scale = t.warp_strength * (1.0 / t.base_frequency) * 0.15;
        let dx = perlin_2d(
            wx * t.warp_frequency,
            wy * t.warp_frequency,
            self.seed.wrapping_add(101),
        );
        let dy = perlin_2d(
            wx * t.warp_frequency,
            wy * t.warp_frequency,
            self.seed.wrapping_add(202),
        );
        let sx = (wx + dx * warp_scale) * t.base_frequency;
        let sy = (wy + dy * warp_scale) * t.base_frequency;

        let continent = to_unit(
            self.continent
                .fbm(sx * CONTINENT_SCALE, sy * CONTINENT_SCALE),
        )
        .max(0.0)
        .powf(1.35);
        let hills = to_unit(self.hills.fbm(sx * HILLS_SCALE, sy * HILLS_SCALE))
            .max(0.0)
            .powf(1.15);
        let mountains = self
            .mountains
            .ridged(sx * MOUNTAIN_SCALE, sy * MOUNTAIN_SCALE)
            * smoothstep(0.35, 0.85, continent);

        let mut h = 0.55 * continent + 0.35 * hills + 0.55 * mountains;
        h -= 0.10 * to_unit(self.valleys.fbm(sx * VALLEY_SCALE, sy * VALLEY_SCALE));

        let h = clamp01(h).powf(1.30);
        clamp01(shape_sea(h, t.sea_level))
    }
}

/// Flatten the sea floor and lift land slightly above the shoreline.
fn shape_sea(h: f64, sea_level: f64) -> f64 {
    if sea_level <= 0.0 || sea_level >= 1.0 {
        return h;
    }
    if h < sea_level {
        sea_level * (h / sea_level).powf(1.55)
    } else {
        sea_level + (1.0 - sea_level) * ((h - sea_level) / (1.0 - sea_level)).powf(1.08)
    }
}
