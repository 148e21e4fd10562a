//! Stateless hash and gradient noise primitives.
//!
//! Every function here is a pure function of `(x, y, seed)`. Generators build
//! on these so that a sample at a world coordinate never depends on which
//! tile asked for it.

use ::noise::NoiseFn;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seed stride between successive FBM octaves. Prime, so octave seeds never
/// alias for small seed offsets.
pub const OCTAVE_SEED_STRIDE: i64 = 99_991;

const INV_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// 4 axis-aligned and 4 diagonal unit gradients.
const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (INV_SQRT_2, INV_SQRT_2),
    (-INV_SQRT_2, INV_SQRT_2),
    (INV_SQRT_2, -INV_SQRT_2),
    (-INV_SQRT_2, -INV_SQRT_2),
];

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// 32-bit avalanche finaliser (lowbias32).
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Hash an integer lattice coordinate together with a 64-bit seed.
///
/// Each input is multiplied by its own odd constant before mixing, which
/// keeps `(a, b)` and `(b, a)` apart and breaks axis-aligned correlation.
#[inline]
pub fn hash_2d(ix: i64, iy: i64, seed: i64) -> u32 {
    let s = seed as u64;
    let folded = (s ^ (s >> 32)) as u32;
    let h = (ix as u32).wrapping_mul(0x8da6_b343)
        ^ (iy as u32).wrapping_mul(0xd816_3841)
        ^ folded.wrapping_mul(0xcb1a_b31f);
    hash_u32(h)
}

/// Hash a lattice coordinate to a float in `[0, 1]` (24-bit resolution).
#[inline]
pub fn hash_01(ix: i64, iy: i64, seed: i64) -> f64 {
    f64::from(hash_2d(ix, iy, seed) & 0x00FF_FFFF) / f64::from(0x00FF_FFFF_u32)
}

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

/// Quintic smootherstep `6t^5 - 15t^4 + 10t^3`.
#[inline]
pub fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Linear interpolation from `a` to `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp to `[0, 1]`.
#[inline]
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Cubic Hermite step between `edge0` and `edge1`.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = clamp01((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

// ---------------------------------------------------------------------------
// Lattice noise
// ---------------------------------------------------------------------------

/// Improved Perlin gradient noise, approximately in `[-1, 1]`.
pub fn perlin_2d(x: f64, y: f64, seed: i64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let ix = x0 as i64;
    let iy = y0 as i64;
    let fx = x - x0;
    let fy = y - y0;

    let corner = |cx: i64, cy: i64, dx: f64, dy: f64| {
        let (gx, gy) = GRADIENTS[(hash_2d(cx, cy, seed) & 7) as usize];
        gx * dx + gy * dy
    };

    let n00 = corner(ix, iy, fx, fy);
    let n10 = corner(ix + 1, iy, fx - 1.0, fy);
    let n01 = corner(ix, iy + 1, fx, fy - 1.0);
    let n11 = corner(ix + 1, iy + 1, fx - 1.0, fy - 1.0);

    let u = fade(fx);
    let v = fade(fy);
    // Unit gradients peak at 1/sqrt(2); rescale to roughly [-1, 1].
    lerp(lerp(n00, n10, u), lerp(n01, n11, u), v) * std::f64::consts::SQRT_2
}

/// Value noise: hashed corner scalars in `[-1, 1]`, quintic interpolation.
pub fn value_noise_2d(x: f64, y: f64, seed: i64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let ix = x0 as i64;
    let iy = y0 as i64;

    let u = fade(x - x0);
    let v = fade(y - y0);

    let corner = |cx: i64, cy: i64| hash_01(cx, cy, seed) * 2.0 - 1.0;

    let a = lerp(corner(ix, iy), corner(ix + 1, iy), u);
    let b = lerp(corner(ix, iy + 1), corner(ix + 1, iy + 1), u);
    lerp(a, b, v)
}

/// Which lattice noise a [`Fractal`] accumulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Basis {
    /// [`perlin_2d`].
    Perlin,
    /// [`value_noise_2d`].
    Value,
}

impl Basis {
    /// Sample the basis noise at `(x, y)`.
    #[inline]
    pub fn sample(self, x: f64, y: f64, seed: i64) -> f64 {
        match self {
            Basis::Perlin => perlin_2d(x, y, seed),
            Basis::Value => value_noise_2d(x, y, seed),
        }
    }
}

// ---------------------------------------------------------------------------
// Fractal sums
// ---------------------------------------------------------------------------

/// Multi-octave fractal sum over a lattice noise basis.
///
/// Octave `i` is sampled at `freq = lacunarity^i` with seed
/// `seed + i * OCTAVE_SEED_STRIDE` and weight `gain^i`; the sum is normalised
/// by the total weight. With a band limit set, the loop stops before the
/// first octave whose frequency multiplier exceeds it (the first octave is
/// always kept so a coarse sampling never collapses to a constant).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fractal {
    basis: Basis,
    seed: i64,
    octaves: u32,
    lacunarity: f64,
    gain: f64,
    max_freq_mult: Option<f64>,
}

impl Fractal {
    /// Create a fractal with 1 octave, lacunarity 2 and gain 0.5.
    pub fn new(basis: Basis, seed: i64) -> Self {
        Self {
            basis,
            seed,
            octaves: 1,
            lacunarity: 2.0,
            gain: 0.5,
            max_freq_mult: None,
        }
    }

    /// Set the number of octaves.
    #[must_use]
    pub fn octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Set the frequency multiplier between octaves.
    #[must_use]
    pub fn lacunarity(mut self, lacunarity: f64) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    /// Set the amplitude multiplier between octaves.
    #[must_use]
    pub fn gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Drop octaves whose frequency multiplier exceeds `max_freq_mult`.
    #[must_use]
    pub fn band_limited(mut self, max_freq_mult: f64) -> Self {
        self.max_freq_mult = Some(max_freq_mult);
        self
    }

    /// The seed of the first octave.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Normalised fractal Brownian motion, approximately in `[-1, 1]`.
    pub fn fbm(&self, x: f64, y: f64) -> f64 {
        self.accumulate(x, y, |n| n)
    }

    /// Ridged fractal: each octave contributes `(1 - |n|)^2`. Range `[0, 1]`.
    pub fn ridged(&self, x: f64, y: f64) -> f64 {
        self.accumulate(x, y, |n| {
            let r = 1.0 - n.abs().min(1.0);
            r * r
        })
    }

    fn accumulate(&self, x: f64, y: f64, shape: impl Fn(f64) -> f64) -> f64 {
        let mut sum = 0.0;
        let mut norm = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;

        for i in 0..self.octaves {
            if i > 0
                && let Some(limit) = self.max_freq_mult
                && freq > limit
            {
                break;
            }
            let octave_seed = self
                .seed
                .wrapping_add(i64::from(i).wrapping_mul(OCTAVE_SEED_STRIDE));
            let n = self.basis.sample(x * freq, y * freq, octave_seed);
            sum += amp * shape(n);
            norm += amp;
            amp *= self.gain;
            freq *= self.lacunarity;
        }

        if norm > 0.0 { sum / norm } else { 0.0 }
    }
}

impl NoiseFn<f64, 2> for Fractal {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.fbm(point[0], point[1])
    }
}

/// Map a `[-1, 1]` noise sample to `[0, 1]` without clamping.
#[inline]
pub fn to_unit(n: f64) -> f64 {
    n * 0.5 + 0.5
}

// ---------------------------------------------------------------------------
// Permutation-table Perlin
// ---------------------------------------------------------------------------

/// Classic 3D improved Perlin noise over a shuffled permutation table.
///
/// The 256 entries are Fisher-Yates shuffled by a `ChaCha8Rng` seeded once at
/// construction and stored twice so lookups never wrap. Output is roughly in
/// `[-1, 1]`; lattice points evaluate to exactly 0.
#[derive(Clone)]
pub struct PermutationNoise {
    perm: [u8; 512],
}

impl PermutationNoise {
    /// Build the permutation table for `seed`.
    pub fn new(seed: i64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let mut source: [u8; 256] = std::array::from_fn(|i| i as u8);
        source.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&source);
        perm[256..].copy_from_slice(&source);
        Self { perm }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        usize::from(self.perm[i & 511])
    }

    fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
        let h = hash & 15;
        let u = if h < 8 { x } else { y };
        let v = if h < 4 {
            y
        } else if h == 12 || h == 14 {
            x
        } else {
            z
        };
        let u = if h & 1 == 0 { u } else { -u };
        let v = if h & 2 == 0 { v } else { -v };
        u + v
    }

    /// Sample the noise at `(x, y, z)`.
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let zf = z.floor();

        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let zi = (zf as i64 & 255) as usize;

        let x = x - xf;
        let y = y - yf;
        let z = z - zf;

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let g = |i: usize, dx: f64, dy: f64, dz: f64| Self::grad(self.p(i), dx, dy, dz);

        lerp(
            lerp(
                lerp(g(aa, x, y, z), g(ba, x - 1.0, y, z), u),
                lerp(g(ab, x, y - 1.0, z), g(bb, x - 1.0, y - 1.0, z), u),
                v,
            ),
            lerp(
                lerp(g(aa + 1, x, y, z - 1.0), g(ba + 1, x - 1.0, y, z - 1.0), u),
                lerp(
                    g(ab + 1, x, y - 1.0, z - 1.0),
                    g(bb + 1, x - 1.0, y - 1.0, z - 1.0),
                    u,
                ),
                v,
            ),
            w,
        )
    }
}

impl NoiseFn<f64, 3> for PermutationNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.sample(point[0], point[1], point[2])
    }
}
