//! Sample generation and warping.
//!
//! Samplers turn an integer sample index into a 1D value or a 2D point in
//! [0, 1). The R2 sequences are stateless and restartable at any index; the
//! jittered and random samplers draw from their own seeded stream.
//!
//! Warps map unit-square points onto the disk, hemisphere and sphere.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use lumen_math::{Vec2, Vec3, EPSILON};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// One 2D draw.
pub type Sample2 = Vec2;

/// 1 / golden ratio.
pub const R2_G0: f32 = (1.0 / 1.618_033_988_749_895_f64) as f32;
/// 1 / plastic number.
pub const R2_G1: f32 = (1.0 / 1.324_717_957_244_746_f64) as f32;

const R2_DELTA: f32 = 0.76;
const R2_I0: f32 = 0.3;
const SQRT_PI: f32 = 1.772_453_9;

/// Golden ratio conjugate used by [`golden_set`].
const GOLDEN_STEP: f32 = 0.618_033_988_749_894;

/// Uniform f32 in [0, 1) from any random stream.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// A source of 1D and 2D samples indexed by sample number.
pub trait Sampler {
    /// 1D sample in [0, 1).
    fn generate(&mut self, n: u32) -> f32;

    /// 2D sample in [0, 1)^2.
    fn generate2(&mut self, n: u32) -> Sample2;
}

/// Independent pseudo-random samples; the index is ignored.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for RandomSampler {
    fn generate(&mut self, _n: u32) -> f32 {
        self.rng.gen()
    }

    fn generate2(&mut self, _n: u32) -> Sample2 {
        Sample2::new(self.rng.gen(), self.rng.gen())
    }
}

/// The R2 additive-recurrence sequence.
///
/// See "The Unreasonable Effectiveness of Quasirandom Sequences" (Roberts 2018).
#[derive(Debug, Clone, Copy, Default)]
pub struct R2Sampler;

impl R2Sampler {
    /// `fract(0.5 + n / phi)`.
    #[inline]
    pub fn sample(n: u32) -> f32 {
        wrap(0.5 + R2_G0 * n as f32)
    }

    /// `fract(0.5 + n * (1/p, 1/p^2))` with p the plastic number.
    #[inline]
    pub fn sample2(n: u32) -> Sample2 {
        let fn_ = n as f32;
        Sample2::new(
            wrap(0.5 + R2_G1 * fn_),
            wrap(0.5 + R2_G1 * R2_G1 * fn_),
        )
    }
}

impl Sampler for R2Sampler {
    fn generate(&mut self, n: u32) -> f32 {
        Self::sample(n)
    }

    fn generate2(&mut self, n: u32) -> Sample2 {
        Self::sample2(n)
    }
}

/// R2 with a random offset whose amplitude decays as `1/sqrt(n + 0.3)`.
pub struct JitteredR2Sampler {
    lambda: f32,
    rng: StdRng,
}

impl JitteredR2Sampler {
    /// `lambda` scales the jitter; zero reproduces plain R2.
    pub fn new(lambda: f32, seed: u64) -> Self {
        Self {
            lambda,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn amplitude(&self, n: u32) -> f32 {
        self.lambda * R2_DELTA * SQRT_PI / (4.0 * (n as f32 + R2_I0).sqrt())
    }
}

impl Sampler for JitteredR2Sampler {
    fn generate(&mut self, n: u32) -> f32 {
        let k = self.amplitude(n);
        let u: f32 = self.rng.gen();
        wrap(R2Sampler::sample(n) + k * u)
    }

    fn generate2(&mut self, n: u32) -> Sample2 {
        let k = self.amplitude(n);
        let p = R2Sampler::sample2(n);
        let u = Sample2::new(self.rng.gen(), self.rng.gen());
        Sample2::new(wrap(p.x + k * u.x), wrap(p.y + k * u.y))
    }
}

#[inline]
fn wrap(x: f32) -> f32 {
    let w = x - x.floor();
    // fract can round up to exactly 1.0 for tiny negatives
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// Seed of the `stream`-th independent random stream derived from `seed`.
///
/// SplitMix64 over `seed` advanced `stream + 1` steps, so neighbouring
/// streams and nearby render seeds decorrelate.
pub fn stream_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed.wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// `count` independent uniform points.
pub fn random_set(count: usize, rng: &mut dyn RngCore) -> Vec<Sample2> {
    (0..count)
        .map(|_| Sample2::new(gen_f32(rng), gen_f32(rng)))
        .collect()
}

/// The first `count` points of a sampler.
pub fn sampler_set(count: usize, sampler: &mut dyn Sampler) -> Vec<Sample2> {
    (0..count as u32).map(|i| sampler.generate2(i)).collect()
}

/// Golden ratio point set of exactly `count` points.
///
/// Schretter, Kobbelt, Dehaye, "Golden Ratio Sequences for Low-Discrepancy
/// Sampling", JGT 2012. The points are correlated as a whole; they cannot be
/// generated one index at a time.
pub fn golden_set(count: usize, rng: &mut dyn RngCore) -> Vec<Sample2> {
    if count == 0 {
        return Vec::new();
    }

    // 1D golden sequence, remembering where its minimum lands
    let mut sequence = Vec::with_capacity(count);
    let mut x = gen_f32(rng);
    let mut min = x;
    let mut index = 0;
    for i in 0..count {
        sequence.push(x);
        if x < min {
            min = x;
            index = i;
        }
        x = step_golden(x);
    }

    // Consecutive Fibonacci numbers bounding the count give the permutation steps
    let (mut f, mut fp) = (1usize, 1usize);
    let mut parity = 0;
    while f + fp < count {
        let tmp = f;
        f += fp;
        fp = tmp;
        parity += 1;
    }
    let (inc, dec) = if parity & 1 != 0 { (f, fp) } else { (fp, f) };

    let mut points = Vec::with_capacity(count);
    points.push(sequence[index]);
    for _ in 1..count {
        if index < dec {
            index += inc;
            if index >= count {
                index -= dec;
            }
        } else {
            index -= dec;
        }
        points.push(sequence[index]);
    }

    let mut y = gen_f32(rng);
    points
        .into_iter()
        .map(|px| {
            let p = Sample2::new(px, y);
            y = step_golden(y);
            p
        })
        .collect()
}

#[inline]
fn step_golden(x: f32) -> f32 {
    let next = x + GOLDEN_STEP;
    if next >= 1.0 {
        next - 1.0
    } else {
        next
    }
}

// =============================================================================
// Warps
// =============================================================================

/// Concentric square-to-disk mapping (Shirley-Chiu, branch-reduced form).
pub fn random_on_disk(x0: f32, x1: f32) -> Sample2 {
    let r0 = 2.0 * x0 - 1.0;
    let r1 = 2.0 * x1 - 1.0;

    let (r, phi) = if r0.abs() <= EPSILON && r1.abs() <= EPSILON {
        return Sample2::ZERO;
    } else if r1.abs() < r0.abs() {
        (r0, FRAC_PI_4 * (r1 / r0))
    } else {
        (r1, FRAC_PI_2 - (r0 / r1) * FRAC_PI_4)
    };

    Sample2::new(r * phi.cos(), r * phi.sin())
}

/// Uniform direction on the +z hemisphere.
pub fn random_on_hemisphere(x0: f32, x1: f32) -> Vec3 {
    let z = x0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * x1;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Cosine-weighted direction on the +z hemisphere (Malley's method).
pub fn random_on_cosine_hemisphere(x0: f32, x1: f32) -> Vec3 {
    let p = random_on_disk(x0, x1);
    let z = (1.0 - p.x * p.x - p.y * p.y).max(EPSILON).sqrt().max(EPSILON);
    Vec3::new(p.x, p.y, z)
}

/// Uniform direction on the hemisphere around `n`.
pub fn random_on_hemisphere_around(x0: f32, x1: f32, n: Vec3) -> Vec3 {
    let h = random_on_hemisphere(x0, x1);
    let (b0, b1) = basis_around(n);
    (h.x * b0 + h.y * b1 + h.z * n).normalize()
}

/// Uniform direction on the unit sphere.
pub fn random_on_sphere(x0: f32, x1: f32) -> Vec3 {
    let z = 2.0 * x0 - 1.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * x1;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform point in the unit ball; `x2` drives the radius.
pub fn random_in_sphere(x0: f32, x1: f32, x2: f32) -> Vec3 {
    random_on_sphere(x0, x1) * x2.cbrt()
}

/// Uniform direction inside a cone around +z with the given cosine cutoff.
pub fn random_cone(x0: f32, x1: f32, cos_cutoff: f32) -> Vec3 {
    let cos_theta = (1.0 - x0) + x0 * cos_cutoff;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(EPSILON).sqrt();
    let phi = 2.0 * PI * x1;
    Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

/// Two tangents completing `n` to a right-handed basis, using a fixed up
/// vector that is swapped out when `n` is nearly parallel to it.
pub fn basis_around(n: Vec3) -> (Vec3, Vec3) {
    let up = if n.z.abs() < 0.999 { Vec3::Z } else { Vec3::X };
    let b0 = up.cross(n).normalize();
    let b1 = n.cross(b0);
    (b0, b1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r2_is_deterministic_and_in_range() {
        let mut a = R2Sampler;
        for n in 0..10_000 {
            let x = a.generate(n);
            let p = a.generate2(n);
            assert!((0.0..1.0).contains(&x));
            assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));
            assert_eq!(p, R2Sampler::sample2(n));
        }
        assert_eq!(R2Sampler::sample(0), 0.5);
    }

    #[test]
    fn test_r2_covers_unit_square_evenly() {
        // Every cell of a 4x4 grid gets its share of 1600 points
        let mut counts = [0u32; 16];
        for n in 0..1600 {
            let p = R2Sampler::sample2(n);
            let cell = (p.x * 4.0) as usize + 4 * (p.y * 4.0) as usize;
            counts[cell] += 1;
        }
        for c in counts {
            assert!((85..=115).contains(&c), "cell count {c}");
        }
    }

    #[test]
    fn test_jittered_r2_stays_in_range_and_close_to_r2() {
        let mut jittered = JitteredR2Sampler::new(0.05, 11);
        for n in 0..1000 {
            let p = jittered.generate2(n);
            assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));
        }
        // Jitter shrinks with n
        let base = R2Sampler::sample(5000);
        let x = jittered.generate(5000);
        let d = (x - base).abs();
        assert!(d.min(1.0 - d) < 0.001);
    }

    #[test]
    fn test_jittered_zero_lambda_matches_r2() {
        let mut jittered = JitteredR2Sampler::new(0.0, 3);
        for n in 0..100 {
            assert_eq!(jittered.generate2(n), R2Sampler::sample2(n));
        }
    }

    #[test]
    fn test_golden_set() {
        let mut rng = StdRng::seed_from_u64(42);
        for count in [0usize, 1, 2, 3, 16, 100, 512] {
            let points = golden_set(count, &mut rng);
            assert_eq!(points.len(), count);
            for p in &points {
                assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));
            }
        }
    }

    #[test]
    fn test_golden_set_x_is_permutation_of_sequence() {
        let mut rng = StdRng::seed_from_u64(5);
        let points = golden_set(64, &mut rng);
        let mut xs: Vec<f32> = points.iter().map(|p| p.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        xs.dedup();
        // All 64 golden values are distinct, so the permutation hits each once
        assert_eq!(xs.len(), 64);
        // and they are spread over [0, 1): no gap wider than a few cells
        let max_gap = xs.windows(2).map(|w| w[1] - w[0]).fold(0.0, f32::max);
        assert!(max_gap < 3.0 / 64.0);
    }

    #[test]
    fn test_sampler_set_matches_sampler() {
        let points = sampler_set(8, &mut R2Sampler);
        assert_eq!(points[3], R2Sampler::sample2(3));
    }

    #[test]
    fn test_stream_seeds_are_distinct() {
        let mut seeds: Vec<u64> = (0..1000).map(|i| stream_seed(1, i)).collect();
        seeds.push(1);
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), 1001);
        assert_eq!(stream_seed(7, 3), stream_seed(7, 3));
        assert_ne!(stream_seed(7, 3), stream_seed(8, 3));
    }

    #[test]
    fn test_random_set() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = random_set(32, &mut rng);
        assert_eq!(points.len(), 32);
    }

    #[test]
    fn test_disk_stays_in_unit_disk() {
        for i in 0..=64 {
            for j in 0..=64 {
                let p = random_on_disk(i as f32 / 64.0, j as f32 / 64.0);
                assert!(p.length_squared() <= 1.0 + 1e-5);
            }
        }
        assert_eq!(random_on_disk(0.5, 0.5), Sample2::ZERO);
    }

    #[test]
    fn test_hemisphere_warps_are_unit_and_upper() {
        for n in 0..256 {
            let s = R2Sampler::sample2(n);
            let h = random_on_hemisphere(s.x, s.y);
            let c = random_on_cosine_hemisphere(s.x, s.y);
            assert!((h.length() - 1.0).abs() < 1e-4);
            assert!((c.length() - 1.0).abs() < 1e-3);
            assert!(h.z >= 0.0);
            assert!(c.z > 0.0);
        }
    }

    #[test]
    fn test_cosine_hemisphere_mean_z() {
        // E[cos] under a cosine-weighted distribution is 2/3
        let n = 4096;
        let mean: f32 = (0..n)
            .map(|i| {
                let s = R2Sampler::sample2(i);
                random_on_cosine_hemisphere(s.x, s.y).z
            })
            .sum::<f32>()
            / n as f32;
        assert!((mean - 2.0 / 3.0).abs() < 0.01, "mean {mean}");
    }

    #[test]
    fn test_hemisphere_around_normal() {
        let n = Vec3::new(0.5, -0.5, 0.5).normalize();
        for i in 0..256 {
            let s = R2Sampler::sample2(i);
            let d = random_on_hemisphere_around(s.x, s.y, n);
            assert!((d.length() - 1.0).abs() < 1e-4);
            assert!(d.dot(n) >= -1e-5);
        }
    }

    #[test]
    fn test_basis_around_pole() {
        for n in [Vec3::Z, Vec3::NEG_Z, Vec3::Y] {
            let (b0, b1) = basis_around(n);
            assert!(b0.dot(n).abs() < 1e-5 && b1.dot(n).abs() < 1e-5);
            assert!((b0.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ball_is_uniform() {
        let mut rng = StdRng::seed_from_u64(9);
        let n = 20_000;
        let mut inner = 0;
        for _ in 0..n {
            let p = random_in_sphere(gen_f32(&mut rng), gen_f32(&mut rng), gen_f32(&mut rng));
            assert!(p.length() <= 1.0 + 1e-5);
            if p.length() < 0.5 {
                inner += 1;
            }
        }
        // The inner half radius holds an eighth of the volume
        let fraction = inner as f32 / n as f32;
        assert!((fraction - 0.125).abs() < 0.01, "{}", fraction);
    }

    #[test]
    fn test_cone() {
        let d = random_cone(0.7, 0.2, 0.9);
        assert!(d.z >= 0.9 - 1e-5);
    }
}
