//! Biome colour textures derived from a heightmap tile.
//!
//! The texture may have a different resolution than the heightmap it is
//! built from. Every texel is mapped back into world space, the height is
//! sampled bilinearly and classified into elevation bands, and a small
//! world-space variation is added on land.

use glam::DVec2;

use crate::heightmap::TerrainTunables;
use crate::noise::{clamp01, lerp, perlin_2d, smoothstep};
use crate::tile::{ColorTile, HeightTile, Rgba, sanitize_spacing};

type Rgb = [f64; 3];

const DEEP_WATER: Rgb = [0.04, 0.10, 0.32];
const SHALLOW_WATER: Rgb = [0.12, 0.36, 0.60];
const SAND: Rgb = [0.80, 0.74, 0.52];
const GRASS_LOW: Rgb = [0.26, 0.52, 0.20];
const GRASS_HIGH: Rgb = [0.40, 0.58, 0.28];
const ROCK_LOW: Rgb = [0.44, 0.40, 0.36];
const ROCK_HIGH: Rgb = [0.60, 0.57, 0.54];
const SNOW_LOW: Rgb = [0.86, 0.88, 0.91];
const SNOW_HIGH: Rgb = [0.98, 0.98, 1.00];

/// Amplitude of the land colour variation.
const VARIATION_AMPLITUDE: f64 = 0.06;

fn mix(a: Rgb, b: Rgb, t: f64) -> Rgb {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Base colour of normalised height `h`, before variation.
///
/// Each band blends between its two palette entries with a smoothstep over
/// the band's height range.
pub fn band_color(h: f64, t: &TerrainTunables) -> [f64; 3] {
    let sand_top = t.sea_level + t.sand_band;
    if h <= t.sea_level {
        mix(DEEP_WATER, SHALLOW_WATER, smoothstep(0.0, t.sea_level, h))
    } else if h <= sand_top {
        mix(SHALLOW_WATER, SAND, smoothstep(t.sea_level, sand_top, h))
    } else if h < t.mountain_start {
        mix(GRASS_LOW, GRASS_HIGH, smoothstep(sand_top, t.mountain_start, h))
    } else if h < t.snow_start {
        mix(ROCK_LOW, ROCK_HIGH, smoothstep(t.mountain_start, t.snow_start, h))
    } else {
        mix(SNOW_LOW, SNOW_HIGH, smoothstep(t.snow_start, 1.0, h))
    }
}

/// Low-amplitude colour noise at a world position.
fn variation(world: DVec2, seed: i64) -> f64 {
    let fine = perlin_2d(world.x * 0.10, world.y * 0.10, seed.wrapping_add(9001));
    let coarse = perlin_2d(world.x * 0.04, world.y * 0.04, seed.wrapping_add(9002));
    (0.6 * fine + 0.4 * coarse) * VARIATION_AMPLITUDE
}

#[inline]
fn to_byte(c: f64) -> u8 {
    (clamp01(c) * 255.0).round() as u8
}

/// Position of texel `t` along an axis of `tex` texels, in units of `span`.
///
/// Shared-edge: texel 0 lands on 0 and the last texel lands exactly on `span`.
#[inline]
fn texel_to_span(t: usize, tex: usize, span: f64) -> f64 {
    if tex > 1 {
        t as f64 * span / (tex - 1) as f64
    } else {
        0.0
    }
}

/// Bilinear height in `[0, 1]` at fractional heightmap coordinates, clamped
/// to the raster edges.
fn sample_bilinear(heights: &HeightTile, fx: f64, fy: f64) -> f64 {
    let (w, h) = heights.dimensions();
    let fx = fx.clamp(0.0, (w - 1) as f64);
    let fy = fy.clamp(0.0, (h - 1) as f64);
    let x0 = fx.floor() as usize;
    let y0 = fy.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let at = |x: usize, y: usize| f64::from(heights.get(x, y).r) / 255.0;
    let top = lerp(at(x0, y0), at(x1, y0), tx);
    let bottom = lerp(at(x0, y1), at(x1, y1), tx);
    lerp(top, bottom, ty)
}

/// Produces colour textures for heightmaps of one world.
#[derive(Clone, Debug, Default)]
pub struct ColormapGenerator {
    tunables: TerrainTunables,
}

impl ColormapGenerator {
    /// Create a colouriser using the band thresholds in `tunables`.
    pub fn new(tunables: TerrainTunables) -> Self {
        Self { tunables }
    }

    /// Colour a heightmap tile into a `tex_width x tex_height` texture.
    ///
    /// `heights` must come from [`crate::HeightmapGenerator::generate_world_size`]
    /// with the same `origin` and `world_width`: the heightmap spans
    /// `world_width` units across its width under the shared-edge convention,
    /// and the texture covers the same rectangle.
    pub fn colorize(
        &self,
        heights: &HeightTile,
        seed: i64,
        origin: DVec2,
        world_width: f64,
        tex_width: usize,
        tex_height: usize,
    ) -> ColorTile {
        let (hm_w, hm_h) = heights.dimensions();
        if heights.is_empty() || tex_width == 0 || tex_height == 0 {
            return ColorTile::filled(0, 0, Rgba::default());
        }

        let upp = if hm_w > 1 {
            sanitize_spacing(world_width / (hm_w - 1) as f64)
        } else {
            1.0
        };
        let world_w = upp * (hm_w - 1) as f64;
        let world_h = upp * (hm_h - 1) as f64;
        let t = &self.tunables;

        ColorTile::from_fn(tex_width, tex_height, |tx, ty| {
            let fx = texel_to_span(tx, tex_width, (hm_w - 1) as f64);
            let fy = texel_to_span(ty, tex_height, (hm_h - 1) as f64);
            let h = sample_bilinear(heights, fx, fy);

            let world = origin
                + DVec2::new(
                    texel_to_span(tx, tex_width, world_w),
                    texel_to_span(ty, tex_height, world_h),
                );

            let mut rgb = band_color(h, t);
            if h > t.sea_level * 0.98 {
                let v = variation(world, seed);
                for c in &mut rgb {
                    *c += v;
                }
            }
            Rgba::rgb(to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::HeightmapGenerator;

    fn ramp(width: usize) -> HeightTile {
        HeightTile::from_fn(width, 1, |x, _| {
            Rgba::grey((x as f64 / (width - 1) as f64 * 255.0).round() as u8)
        })
    }

    fn assert_close(a: [f64; 3], b: [f64; 3]) {
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() < 1e-12, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_band_endpoints() {
        let t = TerrainTunables::default();
        assert_close(band_color(0.0, &t), DEEP_WATER);
        assert_close(band_color(t.sea_level, &t), SHALLOW_WATER);
        assert_close(band_color(t.sea_level + t.sand_band, &t), SAND);
        assert_close(band_color(t.mountain_start, &t), ROCK_LOW);
        assert_close(band_color(t.snow_start, &t), SNOW_LOW);
        assert_close(band_color(1.0, &t), SNOW_HIGH);
    }

    #[test]
    fn test_band_classification_on_ramp() {
        let t = TerrainTunables::default();
        let sand_top = t.sea_level + t.sand_band;
        for i in 0..=1000 {
            let h = i as f64 / 1000.0;
            let (lo, hi) = if h <= t.sea_level {
                (DEEP_WATER, SHALLOW_WATER)
            } else if h <= sand_top {
                (SHALLOW_WATER, SAND)
            } else if h < t.mountain_start {
                (GRASS_LOW, GRASS_HIGH)
            } else if h < t.snow_start {
                (ROCK_LOW, ROCK_HIGH)
            } else {
                (SNOW_LOW, SNOW_HIGH)
            };
            let c = band_color(h, &t);
            for k in 0..3 {
                let (min, max) = (lo[k].min(hi[k]), lo[k].max(hi[k]));
                assert!(
                    c[k] >= min - 1e-12 && c[k] <= max + 1e-12,
                    "h = {h}: channel {k} = {} outside [{min}, {max}]",
                    c[k]
                );
            }
        }
    }

    #[test]
    fn test_bands_continuous_inside() {
        let t = TerrainTunables::default();
        let boundaries = [t.sea_level + t.sand_band, t.mountain_start, t.snow_start];
        let n = 4000;
        for i in 0..n {
            let a = i as f64 / n as f64;
            let b = (i + 1) as f64 / n as f64;
            if boundaries.iter().any(|edge| (a..=b).contains(edge)) {
                continue;
            }
            let (ca, cb) = (band_color(a, &t), band_color(b, &t));
            for k in 0..3 {
                assert!(
                    (ca[k] - cb[k]).abs() <= 0.05,
                    "jump between {a} and {b}: {ca:?} -> {cb:?}"
                );
            }
        }
    }

    #[test]
    fn test_water_has_no_variation() {
        let t = TerrainTunables::default();
        let heights = HeightTile::filled(8, 8, Rgba::grey(20));
        let tex =
            ColormapGenerator::default().colorize(&heights, 3, DVec2::new(5.0, -9.0), 70.0, 16, 16);
        let h = 20.0 / 255.0;
        let c = band_color(h, &t);
        let expected = Rgba::rgb(to_byte(c[0]), to_byte(c[1]), to_byte(c[2]));
        assert!(tex.pixels().iter().all(|&p| p == expected));
    }

    #[test]
    fn test_land_varies_with_world_position() {
        let heights = HeightTile::filled(16, 16, Rgba::grey(140));
        let tex =
            ColormapGenerator::default().colorize(&heights, 3, DVec2::ZERO, 150.0, 32, 32);
        let first = tex.get(0, 0);
        assert!(tex.pixels().iter().any(|&p| p != first));
        assert!(tex.pixels().iter().all(|p| p.a == 255));
    }

    #[test]
    fn test_ramp_texture_follows_palette() {
        // Same resolution: texels sit exactly on heightmap pixels.
        let t = TerrainTunables::default();
        let heights = ramp(256);
        let tex =
            ColormapGenerator::default().colorize(&heights, 0, DVec2::ZERO, 255.0, 256, 1);
        for x in 0..256 {
            let h = f64::from(heights.get(x, 0).r) / 255.0;
            if h > t.sea_level * 0.98 {
                continue;
            }
            let c = band_color(h, &t);
            let expected = Rgba::rgb(to_byte(c[0]), to_byte(c[1]), to_byte(c[2]));
            assert_eq!(tex.get(x, 0), expected, "x = {x}");
        }
    }

    #[test]
    fn test_upsampled_texture_interpolates() {
        let heights =
            HeightTile::from_fn(2, 2, |x, _| Rgba::grey(if x == 0 { 0 } else { 60 }));
        let tex = ColormapGenerator::default().colorize(&heights, 0, DVec2::ZERO, 1.0, 3, 3);
        let h = 30.0 / 255.0;
        let t = TerrainTunables::default();
        let c = band_color(h, &t);
        assert_eq!(
            tex.get(1, 1),
            Rgba::rgb(to_byte(c[0]), to_byte(c[1]), to_byte(c[2]))
        );
    }

    #[test]
    fn test_shared_edge_between_textures() {
        let hm = HeightmapGenerator::default();
        let cm = ColormapGenerator::default();
        let a_origin = DVec2::new(0.0, 0.0);
        let b_origin = DVec2::new(256.0, 0.0);
        let texture = |origin: DVec2| {
            let heights = hm.generate_world_size(9, 129, 129, origin, 256.0);
            cm.colorize(&heights, 9, origin, 256.0, 65, 65)
        };
        let a = texture(a_origin);
        let b = texture(b_origin);
        for y in 0..65 {
            assert_eq!(a.get(64, y), b.get(0, y), "row {y}");
        }
    }

    #[test]
    fn test_empty_inputs() {
        let cm = ColormapGenerator::default();
        let heights = HeightTile::filled(4, 4, Rgba::grey(100));
        assert!(cm.colorize(&heights, 0, DVec2::ZERO, 3.0, 0, 8).is_empty());
        let none = HeightTile::filled(0, 0, Rgba::default());
        assert!(cm.colorize(&none, 0, DVec2::ZERO, 3.0, 8, 8).is_empty());
    }
}
