//! Foliage placement over a square height field.
//!
//! A jittered grid: one candidate per `min_dist` cell, kept when the terrain
//! height is in the vegetated band and a two-octave moisture field is wet
//! enough.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::noise::PermutationNoise;

/// Heights strictly inside this band can hold foliage.
const VEGETATION_BAND: (f32, f32) = (0.15, 0.70);
/// World scale of the moisture detail octave.
const DETAIL_SCALE: f32 = 10.0;
const DETAIL_WEIGHT: f64 = 0.3;

/// Forest placement settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Grid spacing; at most one point per cell. Must be positive.
    pub min_dist: f32,
    /// Scale of the moisture field. 0 is treated as 1.
    pub density_scale: f32,
    /// Moisture in `[0, 1]` a point needs to exceed.
    pub moisture_threshold: f32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            min_dist: 4.0,
            density_scale: 8.0,
            moisture_threshold: 0.5,
        }
    }
}

/// A placed plant in height-field coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoliagePoint {
    pub x: f32,
    pub z: f32,
}

/// Place foliage on a `size` x `size` row-major height field in `[0, 1]`.
///
/// Returns nothing when the field is shorter than `size * size` or
/// `min_dist` is not positive.
pub fn place_foliage(
    size: usize,
    heights: &[f32],
    config: &ForestConfig,
    seed: i64,
) -> Vec<FoliagePoint> {
    if size == 0 || heights.len() < size * size {
        tracing::warn!(
            "foliage field has {} heights, need {}",
            heights.len(),
            size * size
        );
        return Vec::new();
    }
    if !(config.min_dist > 0.0) {
        tracing::warn!("foliage min_dist {} is not positive", config.min_dist);
        return Vec::new();
    }
    let density_scale = if config.density_scale == 0.0 {
        1.0
    } else {
        config.density_scale
    };

    let moisture = PermutationNoise::new(seed.wrapping_add(1));
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);

    let extent = size as f32;
    let cells = (extent / config.min_dist).ceil() as usize;
    let mut points = Vec::with_capacity(size);

    for j in 0..cells {
        let y = j as f32 * config.min_dist;
        for i in 0..cells {
            let x = i as f32 * config.min_dist;
            let rx = x + rng.random::<f32>() * config.min_dist;
            let rz = y + rng.random::<f32>() * config.min_dist;
            if rx >= extent || rz >= extent {
                continue;
            }

            let h = heights[rz as usize * size + rx as usize];
            if h <= VEGETATION_BAND.0 || h >= VEGETATION_BAND.1 {
                continue;
            }

            let wet = moisture.sample(
                f64::from(rx / density_scale),
                f64::from(rz / density_scale),
                0.0,
            );
            let detail = moisture.sample(
                f64::from(rx / DETAIL_SCALE),
                f64::from(rz / DETAIL_SCALE),
                1.0,
            ) * DETAIL_WEIGHT;
            let level = (wet + detail + 1.0) / 2.0;
            if level > f64::from(config.moisture_threshold) {
                points.push(FoliagePoint { x: rx, z: rz });
            }
        }
    }

    tracing::debug!(count = points.len(), "placed foliage");
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: usize = 128;

    /// A gentle slope that stays inside the vegetation band.
    fn slope() -> Vec<f32> {
        (0..SIZE * SIZE)
            .map(|i| 0.2 + 0.4 * (i % SIZE) as f32 / (SIZE - 1) as f32)
            .collect()
    }

    #[test]
    fn test_density_stable_across_seeds() {
        let field = slope();
        let config = ForestConfig::default();
        let counts: Vec<usize> = (1..=20)
            .map(|seed| place_foliage(SIZE, &field, &config, seed).len())
            .collect();
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        // 32x32 candidates, about half of them wet.
        assert!((350.0..=670.0).contains(&mean), "mean {mean}");
        for (seed, &count) in counts.iter().enumerate() {
            let ratio = count as f64 / mean;
            assert!(
                (0.85..=1.15).contains(&ratio),
                "seed {} placed {count} against mean {mean}",
                seed + 1
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let field = slope();
        let config = ForestConfig::default();
        assert_eq!(
            place_foliage(SIZE, &field, &config, 9),
            place_foliage(SIZE, &field, &config, 9)
        );
    }

    #[test]
    fn test_points_stay_in_their_cell() {
        let field = slope();
        let config = ForestConfig::default();
        for p in place_foliage(SIZE, &field, &config, 3) {
            assert!((0.0..SIZE as f32).contains(&p.x));
            assert!((0.0..SIZE as f32).contains(&p.z));
        }
    }

    #[test]
    fn test_dry_threshold_keeps_every_candidate() {
        let config = ForestConfig {
            moisture_threshold: -1.0,
            ..ForestConfig::default()
        };
        let points = place_foliage(SIZE, &slope(), &config, 5);
        assert_eq!(points.len(), 32 * 32);
    }

    #[test]
    fn test_outside_band_is_bare() {
        let config = ForestConfig {
            moisture_threshold: -1.0,
            ..ForestConfig::default()
        };
        let water = vec![0.1_f32; SIZE * SIZE];
        let peaks = vec![0.8_f32; SIZE * SIZE];
        assert!(place_foliage(SIZE, &water, &config, 1).is_empty());
        assert!(place_foliage(SIZE, &peaks, &config, 1).is_empty());
    }

    #[test]
    fn test_zero_density_scale_means_one() {
        let field = slope();
        let zero = ForestConfig {
            density_scale: 0.0,
            ..ForestConfig::default()
        };
        let one = ForestConfig {
            density_scale: 1.0,
            ..ForestConfig::default()
        };
        assert_eq!(
            place_foliage(SIZE, &field, &zero, 4),
            place_foliage(SIZE, &field, &one, 4)
        );
    }

    #[test]
    fn test_bad_input_is_empty() {
        let config = ForestConfig::default();
        assert!(place_foliage(SIZE, &[0.4; 100], &config, 1).is_empty());
        let flat = ForestConfig {
            min_dist: 0.0,
            ..ForestConfig::default()
        };
        assert!(place_foliage(SIZE, &slope(), &flat, 1).is_empty());
        assert!(place_foliage(0, &[], &config, 1).is_empty());
    }
}
