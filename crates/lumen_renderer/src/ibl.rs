//! Image-based lighting precomputation.
//!
//! From one light probe this builds the three tables the shading evaluator
//! reads: a diffuse irradiance map, a chain of GGX pre-filtered specular maps
//! (one per roughness level) and the split-sum BRDF lookup table. All three
//! sample the pure R2 sequence, so the output is deterministic.

use std::time::Instant;

use lumen_core::IblSettings;
use lumen_math::{reflect, Vec2, Vec3, EPSILON};

use crate::envmap::{texel_step, SphereMap};
use crate::material::Color;
use crate::microfacet::{geometry_smith_ibl, importance_sample_ggx, schlick_weight};
use crate::sampling::{random_on_hemisphere_around, R2Sampler};

/// Cosine-weighted irradiance for every direction of the output map.
pub fn irradiance_map(env: &SphereMap, size: u32, samples: u32) -> SphereMap {
    let samples = samples.max(1);
    let scale = std::f32::consts::PI / samples as f32;
    let (step_x, step_y) = (texel_step(size), texel_step(size));

    SphereMap::from_fn(size, size, |x, y| {
        let n = SphereMap::direction_at(x as f32 * step_x, y as f32 * step_y);
        let mut total = Color::ZERO;
        for s in 0..samples {
            let u = R2Sampler::sample2(s);
            let direction = random_on_hemisphere_around(u.x, u.y, n);
            total += direction.dot(n) * env.sample(direction);
        }
        total * scale
    })
}

/// One pre-filtered specular map at the given roughness.
///
/// GGX half vectors around the texel direction stand in for light
/// directions (view = normal), weighted by N.L.
pub fn specular_map(env: &SphereMap, size: u32, roughness: f32, samples: u32) -> SphereMap {
    let samples = samples.max(1);
    let (step_x, step_y) = (texel_step(size), texel_step(size));

    SphereMap::from_fn(size, size, |x, y| {
        let n = SphereMap::direction_at(x as f32 * step_x, y as f32 * step_y);
        let mut total = Color::ZERO;
        let mut total_weight = 0.0;
        for s in 0..samples {
            let u = R2Sampler::sample2(s);
            let direction = importance_sample_ggx(u.x, u.y, roughness, n);
            let weight = direction.dot(n).max(0.0);
            total += weight * env.sample(direction);
            total_weight += weight;
        }
        if total_weight > EPSILON {
            total / total_weight
        } else {
            Color::ZERO
        }
    })
}

/// Specular maps for roughness `i / (levels - 1)`, each level half the size
/// of the one before.
pub fn specular_chain(env: &SphereMap, size: u32, levels: u32, samples: u32) -> Vec<SphereMap> {
    let levels = levels.max(1);
    let mut size = size;
    let mut chain = Vec::with_capacity(levels as usize);
    for level in 0..levels {
        let roughness = if levels > 1 {
            level as f32 / (levels - 1) as f32
        } else {
            0.0
        };
        chain.push(specular_map(env, size.max(1), roughness, samples));
        size /= 2;
    }
    chain
}

/// Split-sum scale (x) and bias (y) indexed by roughness along x and N.V
/// along y. The z channel is unused.
pub fn brdf_lut(size: u32, samples: u32) -> SphereMap {
    let samples = samples.max(1);
    let step = texel_step(size);

    SphereMap::from_fn(size, size, |x, y| {
        let roughness = x as f32 * step;
        let n_dot_v = (y as f32 * step).max(1e-3);
        let v = Vec3::new((1.0 - n_dot_v * n_dot_v).max(0.0).sqrt(), 0.0, n_dot_v);

        let mut total = Vec2::ZERO;
        for s in 0..samples {
            let u = R2Sampler::sample2(s);
            let h = importance_sample_ggx(u.x, u.y, roughness, Vec3::Z);
            let l = reflect(-v, h).normalize();

            let n_dot_l = l.z.max(0.0);
            let n_dot_h = h.z.max(0.0);
            let v_dot_h = v.dot(h).max(0.0);
            if n_dot_l > 0.0 && n_dot_h > 0.0 {
                let g = geometry_smith_ibl(n_dot_v, n_dot_l, roughness);
                let g_vis = g * v_dot_h / (n_dot_h * n_dot_v);
                let fc = schlick_weight(v_dot_h);
                total += Vec2::new((1.0 - fc) * g_vis, fc * g_vis);
            }
        }
        let total = total / samples as f32;
        Color::new(total.x, total.y, 0.0)
    })
}

/// The precomputed lighting tables for one light probe.
#[derive(Debug, Clone)]
pub struct IblMaps {
    pub irradiance: SphereMap,
    /// Sharpest first
    pub specular: Vec<SphereMap>,
    pub brdf: SphereMap,
}

impl IblMaps {
    /// Run every precomputation stage.
    pub fn generate(env: &SphereMap, settings: &IblSettings) -> Self {
        let start = Instant::now();
        let irradiance = irradiance_map(env, settings.irradiance_size, settings.irradiance_samples);
        log::info!(
            "Irradiance map {}x{} ({} ms)",
            irradiance.width(),
            irradiance.height(),
            start.elapsed().as_millis()
        );

        let start = Instant::now();
        let specular = specular_chain(
            env,
            settings.specular_size,
            settings.specular_levels,
            settings.specular_samples,
        );
        log::info!(
            "Specular chain of {} levels ({} ms)",
            specular.len(),
            start.elapsed().as_millis()
        );

        let start = Instant::now();
        let brdf = brdf_lut(settings.brdf_size, settings.brdf_samples);
        log::info!(
            "BRDF lookup {}x{} ({} ms)",
            brdf.width(),
            brdf.height(),
            start.elapsed().as_millis()
        );

        Self {
            irradiance,
            specular,
            brdf,
        }
    }

    /// Pre-filtered radiance along `direction`, interpolated between the two
    /// mip levels nearest `roughness`.
    pub fn prefiltered(&self, direction: Vec3, roughness: f32) -> Color {
        let levels = self.specular.len();
        let Some(last) = levels.checked_sub(1) else {
            return Color::ZERO;
        };
        let r = last as f32 * roughness.clamp(0.0, 1.0);
        let l0 = (r as usize).min(last);
        let l1 = (l0 + 1).min(last);
        let d = if l0 == l1 { 0.0 } else { r - l0 as f32 };

        let c0 = self.specular[l0].sample(direction);
        let c1 = self.specular[l1].sample(direction);
        c0.lerp(c1, d)
    }

    /// Stand-in irradiance read from the third-blurriest specular level, or
    /// the blurriest one if the chain is shorter than that.
    pub fn pseudo_irradiance(&self, normal: Vec3) -> Color {
        let levels = self.specular.len();
        let level = if levels >= 3 { levels - 3 } else { levels.saturating_sub(1) };
        self.specular
            .get(level)
            .map_or(Color::ZERO, |map| map.sample(normal))
    }

    /// Diffuse irradiance around `normal`.
    pub fn irradiance(&self, normal: Vec3) -> Color {
        self.irradiance.sample(normal)
    }

    /// Split-sum (scale, bias) for a roughness and N.V in [0, 1].
    pub fn brdf(&self, roughness: f32, n_dot_v: f32) -> Vec2 {
        let x = roughness.clamp(0.0, 1.0) * (self.brdf.width() - 1) as f32;
        let y = n_dot_v.clamp(0.0, 1.0) * (self.brdf.height() - 1) as f32;
        let c = self.brdf.pixel(x, y);
        Vec2::new(c.x, c.y)
    }
}
