//! Path integrators.
//!
//! Both integrators are iterative: a running throughput is multiplied by the
//! weight of every bounce and the environment is added once the path escapes.
//! [`PathTracer::radiance`] importance samples each material in its local
//! frame; [`PathTracer::scatter_radiance`] follows the simpler world-space
//! scatter contract.

use lumen_math::{Interval, Ray, EPSILON};
use rand::RngCore;

use crate::color::luminance;
use crate::envmap::SphereMap;
use crate::frame::Frame;
use crate::hittable::Scene;
use crate::material::Color;
use crate::sampling::gen_f32;

/// Closest distance at which a ray may hit a surface.
pub const RAY_EPSILON: f32 = 0.001;

/// Depth at which Russian roulette starts.
pub const DEFAULT_RR_DEPTH: u32 = 6;

/// Highest survival probability Russian roulette allows.
const MAX_SURVIVAL: f32 = 0.9;

/// Decide whether a path survives Russian roulette given a uniform `u`.
///
/// Survivors come back divided by their survival probability so the
/// estimator stays unbiased.
#[inline]
pub fn russian_roulette(throughput: Color, u: f32) -> Option<Color> {
    let p = luminance(throughput).min(MAX_SURVIVAL);
    if u >= p {
        return None;
    }
    Some(throughput / p)
}

/// Monte Carlo estimator of the radiance along camera rays.
#[derive(Debug, Clone, Copy)]
pub struct PathTracer {
    max_depth: u32,
    rr_depth: u32,
}

impl PathTracer {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            rr_depth: DEFAULT_RR_DEPTH,
        }
    }

    /// Start Russian roulette at `depth` instead of the default.
    pub fn with_russian_roulette_depth(mut self, depth: u32) -> Self {
        self.rr_depth = depth;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// One radiance estimate with importance-sampled materials.
    pub fn radiance(
        &self,
        ray: &Ray,
        scene: &Scene,
        env: &SphereMap,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut li = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut ray = *ray;

        for depth in 0..self.max_depth {
            let Some(rec) = scene.hit(&ray, Interval::from_min(RAY_EPSILON)) else {
                li += throughput * env.sample(ray.direction().normalize());
                break;
            };

            let frame = Frame::new(rec.normal);
            let wo = frame.world_to_local(-ray.direction());
            let u0 = gen_f32(rng);
            let u1 = gen_f32(rng);
            let sample = rec.material.sample(wo, u0, u1);

            if sample.is_valid() {
                throughput *= sample.weight;
                ray = Ray::new(rec.p, frame.local_to_world(sample.direction).normalize());
            } else {
                // Degenerate sample: step past the hit along the same direction
                ray = Ray::new(rec.p + EPSILON * ray.direction(), ray.direction());
            }

            if depth >= self.rr_depth {
                match russian_roulette(throughput, gen_f32(rng)) {
                    Some(survivor) => throughput = survivor,
                    None => break,
                }
            }
        }

        li
    }

    /// One radiance estimate following each material's scatter contract.
    pub fn scatter_radiance(
        &self,
        ray: &Ray,
        scene: &Scene,
        env: &SphereMap,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut li = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut ray = *ray;

        for depth in 0..self.max_depth {
            let Some(rec) = scene.hit(&ray, Interval::from_min(RAY_EPSILON)) else {
                li += throughput * env.sample(ray.direction().normalize());
                break;
            };

            // Absorbed
            let Some(result) = rec.material.scatter(&ray, &rec, rng) else {
                break;
            };
            throughput *= result.attenuation;
            ray = result.scattered;

            if depth >= self.rr_depth {
                match russian_roulette(throughput, gen_f32(rng)) {
                    Some(survivor) => throughput = survivor,
                    None => break,
                }
            }
        }

        li
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn diffuse_ball(albedo: f32) -> Scene {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::diffuse(Color::splat(albedo)));
        scene.add_sphere(Vec3::ZERO, 1.0, material);
        scene
    }

    fn mean<F: FnMut(&mut StdRng) -> Color>(n: usize, seed: u64, mut f: F) -> Color {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut total = Color::ZERO;
        for _ in 0..n {
            total += f(&mut rng);
        }
        total / n as f32
    }

    #[test]
    fn test_russian_roulette() {
        let t = Color::splat(0.5);
        assert_eq!(russian_roulette(t, 0.3), Some(Color::ONE));
        assert_eq!(russian_roulette(t, 0.6), None);

        // Bright paths still face a 10% chance of termination
        let bright = Color::splat(2.0);
        assert!(russian_roulette(bright, 0.95).is_none());
        let survivor = russian_roulette(bright, 0.5).unwrap();
        assert!((survivor.x - 2.0 / 0.9).abs() < 1e-5);

        // Dead paths always stop
        assert!(russian_roulette(Color::ZERO, 0.0).is_none());
    }

    #[test]
    fn test_russian_roulette_is_unbiased() {
        let t = Color::new(0.3, 0.2, 0.1);
        let n = 100_000;
        let mut rng = StdRng::seed_from_u64(3);
        let mut total = Color::ZERO;
        for _ in 0..n {
            total += russian_roulette(t, gen_f32(&mut rng)).unwrap_or(Color::ZERO);
        }
        let estimate = total / n as f32;
        assert!((estimate - t).length() < 0.01, "{}", estimate);
    }

    #[test]
    fn test_miss_returns_environment() {
        let scene = Scene::new();
        let env = SphereMap::constant(Color::splat(0.7));
        let tracer = PathTracer::new(8);
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, -0.2, 1.0));
        assert_eq!(tracer.radiance(&ray, &scene, &env, &mut rng), Color::splat(0.7));
        assert_eq!(tracer.scatter_radiance(&ray, &scene, &env, &mut rng), Color::splat(0.7));
    }

    #[test]
    fn test_zero_depth_is_black() {
        let scene = Scene::new();
        let env = SphereMap::constant(Color::ONE);
        let tracer = PathTracer::new(0);
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(tracer.radiance(&ray, &scene, &env, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_convex_diffuse_closed_form() {
        // A single bounce off a convex diffuse ball always escapes, so every
        // estimate is albedo * L exactly
        let scene = diffuse_ball(0.6);
        let env = SphereMap::constant(Color::splat(2.0));
        let tracer = PathTracer::new(16);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let c = tracer.radiance(&ray, &scene, &env, &mut rng);
            assert!((c - Color::splat(1.2)).length() < 1e-5, "{}", c);
        }
    }

    #[test]
    fn test_degenerate_sample_steps_through() {
        // From inside a diffuse ball the view direction is below the horizon,
        // so the sample is rejected and the ray carries on unchanged
        let scene = diffuse_ball(0.6);
        let env = SphereMap::constant(Color::splat(0.8));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let mut rng = StdRng::seed_from_u64(4);

        let tracer = PathTracer::new(4);
        for _ in 0..10 {
            let c = tracer.radiance(&ray, &scene, &env, &mut rng);
            assert!((c - Color::splat(0.8)).length() < 1e-6, "{}", c);
        }

        // The step spends the only bounce
        let tracer = PathTracer::new(1);
        assert_eq!(tracer.radiance(&ray, &scene, &env, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_roulette_from_first_bounce_converges() {
        let scene = diffuse_ball(0.5);
        let env = SphereMap::constant(Color::splat(2.0));
        let tracer = PathTracer::new(16).with_russian_roulette_depth(0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        let estimate = mean(20_000, 4, |rng| tracer.radiance(&ray, &scene, &env, rng));
        assert!((estimate.x - 1.0).abs() < 0.03, "{}", estimate);
    }

    #[test]
    fn test_scatter_integrator_converges() {
        // Uniform hemisphere sampling with weight albedo * 2cos averages to albedo
        let scene = diffuse_ball(0.5);
        let env = SphereMap::constant(Color::splat(2.0));
        let tracer = PathTracer::new(16);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        let estimate = mean(20_000, 5, |rng| tracer.scatter_radiance(&ray, &scene, &env, rng));
        assert!((estimate.x - 1.0).abs() < 0.03, "{}", estimate);
    }

    #[test]
    fn test_glass_ball_passes_light() {
        let mut scene = Scene::new();
        let glass = scene.add_material(Material::dielectric(Color::ONE, 1.5));
        scene.add_sphere(Vec3::ZERO, 1.0, glass);
        let env = SphereMap::constant(Color::ONE);
        let tracer = PathTracer::new(32);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        // Clear glass neither absorbs nor amplifies a constant environment
        // until roulette kicks in
        let estimate = mean(2_000, 6, |rng| tracer.radiance(&ray, &scene, &env, rng));
        assert!((estimate.x - 1.0).abs() < 0.05, "{}", estimate);
    }
}
