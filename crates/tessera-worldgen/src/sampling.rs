//! Point queries on square `f32` height fields.
//!
//! Fields are row-major with `size * size` samples; `x` runs along a row and
//! `z` down the columns. Queries return `None` when the field is too short
//! or the point falls outside it.

use crate::tile::HeightTile;

fn field_ok(field: &[f32], size: usize) -> bool {
    size > 0 && field.len() >= size * size
}

/// Bilinear height at `(x, z)` inside `[0, size)²`.
pub fn bilinear_height(field: &[f32], size: usize, x: f32, z: f32) -> Option<f32> {
    if !field_ok(field, size) {
        return None;
    }
    let extent = size as f32;
    if !(0.0..extent).contains(&x) || !(0.0..extent).contains(&z) {
        return None;
    }

    let x0 = x.floor();
    let z0 = z.floor();
    let tx = x - x0;
    let tz = z - z0;
    let (ix0, iz0) = (x0 as usize, z0 as usize);
    let ix1 = (ix0 + 1).min(size - 1);
    let iz1 = (iz0 + 1).min(size - 1);

    let h00 = field[iz0 * size + ix0];
    let h10 = field[iz0 * size + ix1];
    let h01 = field[iz1 * size + ix0];
    let h11 = field[iz1 * size + ix1];

    let row0 = h00 + tx * (h10 - h00);
    let row1 = h01 + tx * (h11 - h01);
    Some(row0 + tz * (row1 - row0))
}

/// Gaussian-weighted mean of the samples within `radius` of `(x, z)`.
///
/// Each sample is weighted by `exp(-alpha * d²)`. A non-positive radius
/// returns the nearest sample.
pub fn weighted_average_height(
    field: &[f32],
    size: usize,
    x: f32,
    z: f32,
    radius: f32,
    alpha: f32,
) -> Option<f32> {
    if !field_ok(field, size) {
        return None;
    }
    let in_field = |ix: i64, iz: i64| {
        (0..size as i64).contains(&ix) && (0..size as i64).contains(&iz)
    };
    let cx = x.round() as i64;
    let cz = z.round() as i64;

    if radius <= 0.0 {
        return in_field(cx, cz).then(|| field[cz as usize * size + cx as usize]);
    }

    let r = radius.ceil() as i64;
    let mut sum = 0.0_f32;
    let mut total = 0.0_f32;
    for nz in cz - r..=cz + r {
        for nx in cx - r..=cx + r {
            if !in_field(nx, nz) {
                continue;
            }
            let dx = nx as f32 - x;
            let dz = nz as f32 - z;
            let w = (-alpha * (dx * dx + dz * dz)).exp();
            sum += field[nz as usize * size + nx as usize] * w;
            total += w;
        }
    }
    (total > 0.0).then(|| sum / total)
}

/// A radial bowl, `t² + 0.2` where `t` is the distance from the centre over
/// the centre-to-corner distance. Low in the middle, rising to 1.2 at the
/// corners.
pub fn bowl_map(size: usize) -> Vec<f32> {
    let center = size as f32 / 2.0;
    let max_dist = (center * center * 2.0).sqrt();
    let mut out = Vec::with_capacity(size * size);
    for z in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dz = z as f32 - center;
            let t = (dx * dx + dz * dz).sqrt() / max_dist;
            out.push(t * t + 0.2);
        }
    }
    out
}

/// The red channel of a heightmap scaled to `[0, 1]`.
pub fn normalized_heights(tile: &HeightTile) -> Vec<f32> {
    tile.pixels()
        .iter()
        .map(|p| f32::from(p.r) / 255.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Rgba;

    fn ramp(size: usize) -> Vec<f32> {
        (0..size * size).map(|i| (i % size) as f32).collect()
    }

    #[test]
    fn test_bilinear_interpolates() {
        let field = ramp(8);
        assert_eq!(bilinear_height(&field, 8, 2.0, 3.0), Some(2.0));
        let h = bilinear_height(&field, 8, 2.25, 5.5).unwrap();
        assert!((h - 2.25).abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_clamps_last_row() {
        let field = ramp(4);
        let h = bilinear_height(&field, 4, 3.5, 3.5).unwrap();
        assert!((h - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_rejects_outside() {
        let field = ramp(4);
        assert_eq!(bilinear_height(&field, 4, -0.1, 1.0), None);
        assert_eq!(bilinear_height(&field, 4, 1.0, 4.0), None);
        assert_eq!(bilinear_height(&field[..10], 4, 1.0, 1.0), None);
    }

    #[test]
    fn test_weighted_average_nearest_fallback() {
        let field = ramp(8);
        assert_eq!(weighted_average_height(&field, 8, 2.6, 1.2, 0.0, 1.0), Some(3.0));
        assert_eq!(weighted_average_height(&field, 8, 8.4, 1.0, 0.0, 1.0), None);
    }

    #[test]
    fn test_weighted_average_flat_field() {
        let field = vec![0.5; 64];
        let h = weighted_average_height(&field, 8, 3.3, 4.7, 2.0, 0.5).unwrap();
        assert!((h - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_average_symmetric_on_ramp() {
        // Centred on a column away from the edges, the ramp averages out.
        let field = ramp(16);
        let h = weighted_average_height(&field, 16, 8.0, 8.0, 3.0, 0.3).unwrap();
        assert!((h - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_weighted_average_outside_has_no_samples() {
        let field = ramp(4);
        assert_eq!(weighted_average_height(&field, 4, 20.0, 20.0, 1.0, 1.0), None);
    }

    #[test]
    fn test_bowl_map() {
        let bowl = bowl_map(16);
        assert_eq!(bowl.len(), 256);
        assert!((bowl[8 * 16 + 8] - 0.2).abs() < 1e-6);
        assert!((bowl[0] - 1.2).abs() < 1e-5);
        assert!(bowl[0] > bowl[4 * 16 + 4]);
        assert!(bowl_map(0).is_empty());
    }

    #[test]
    fn test_normalized_heights() {
        let mut tile = HeightTile::filled(2, 1, Rgba::grey(0));
        tile.set(1, 0, Rgba::grey(255));
        assert_eq!(normalized_heights(&tile), vec![0.0, 1.0]);
    }
}
