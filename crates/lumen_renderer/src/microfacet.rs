//! GGX microfacet terms.
//!
//! Two families live here. The `ggx_*` functions work in a local shading
//! frame (z = normal) and take `alpha2`, the squared GGX width; the path
//! integrator's metal uses them together with visible-normal sampling.
//! The `distribution_*`/`geometry_*`/`fresnel_*` functions take perceptual
//! roughness and serve the split-sum precomputation and the shading
//! evaluator.

use std::f32::consts::PI;

use lumen_math::{Vec3, EPSILON};

use crate::sampling::basis_around;

/// Schlick weight `(1 - cos)^5`.
#[inline]
pub fn schlick_weight(cos_theta: f32) -> f32 {
    let x = (1.0 - cos_theta).clamp(0.0, 1.0);
    let x2 = x * x;
    x2 * x2 * x
}

// =============================================================================
// Local-frame GGX (alpha2 parameterisation)
// =============================================================================

/// GGX normal distribution for a local microfacet normal.
#[inline]
pub fn ggx_ndf(m: Vec3, alpha2: f32) -> f32 {
    let d = m.z;
    let denom = d * d * (alpha2 - 1.0) + 1.0;
    alpha2 / (PI * denom * denom)
}

/// Smith masking for one local direction.
#[inline]
pub fn ggx_g1(v: Vec3, alpha2: f32) -> f32 {
    let n_dot_v = v.z;
    let denom = (alpha2 + (1.0 - alpha2) * n_dot_v * n_dot_v).sqrt() + n_dot_v;
    2.0 * n_dot_v / denom
}

/// Height-correlated Smith masking-shadowing for a pair of local directions.
#[inline]
pub fn ggx_g2(wi: Vec3, wo: Vec3, alpha2: f32) -> f32 {
    let n_dot_i = wi.z;
    let n_dot_o = wo.z;
    let denom_i = n_dot_o * (alpha2 + (1.0 - alpha2) * n_dot_i * n_dot_i).sqrt();
    let denom_o = n_dot_i * (alpha2 + (1.0 - alpha2) * n_dot_o * n_dot_o).sqrt();
    2.0 * n_dot_i * n_dot_o / (denom_i + denom_o)
}

/// Sample a microfacet normal from the GGX distribution of visible normals.
///
/// Heitz, "Sampling the GGX Distribution of Visible Normals", JCGT 2018.
/// `wo` is the local view direction and `roughness` the GGX width.
pub fn sample_ggx_vndf(wo: Vec3, roughness: f32, u0: f32, u1: f32) -> Vec3 {
    // Stretch into the hemisphere configuration
    let v = Vec3::new(roughness * wo.x, roughness * wo.y, wo.z).normalize();

    let t1 = if v.z < 0.999 {
        v.cross(Vec3::Z).normalize()
    } else {
        Vec3::X
    };
    let t2 = t1.cross(v);

    // Projected-area parameterisation
    let r = u0.sqrt();
    let phi = 2.0 * PI * u1;
    let p1 = r * phi.cos();
    let a = 0.5 * (1.0 + v.z);
    let p2 = (1.0 - a) * (1.0 - p1 * p1).max(0.0).sqrt() + a * r * phi.sin();

    let n = p1 * t1 + p2 * t2 + (1.0 - p1 * p1 - p2 * p2).max(0.0).sqrt() * v;

    // Back to the ellipsoid configuration
    let m = Vec3::new(roughness * n.x, roughness * n.y, n.z.max(0.0));
    if m.length_squared() <= EPSILON {
        Vec3::Z
    } else {
        m.normalize()
    }
}

// =============================================================================
// Roughness parameterisation (split-sum and analytic light)
// =============================================================================

/// Importance-sample a GGX half vector around `n` with `a = roughness^2`.
pub fn importance_sample_ggx(x: f32, y: f32, roughness: f32, n: Vec3) -> Vec3 {
    let a = roughness * roughness;
    let phi = 2.0 * PI * x;
    let cos_theta = ((1.0 - y) / (1.0 + (a * a - 1.0) * y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let (b0, b1) = basis_around(n);
    (b0 * (phi.cos() * sin_theta) + b1 * (phi.sin() * sin_theta) + n * cos_theta).normalize()
}

/// GGX/Trowbridge-Reitz distribution with `a = roughness^2`.
#[inline]
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    // A perfect mirror has no finite density
    a2 / (PI * denom * denom).max(EPSILON)
}

/// Schlick-GGX geometry term with `k = roughness^2 / 2` (image-based lighting).
#[inline]
pub fn geometry_schlick_ggx_ibl(n_dot_v: f32, roughness: f32) -> f32 {
    let k = roughness * roughness * 0.5;
    n_dot_v / (n_dot_v * (1.0 - k) + k)
}

/// Smith geometry built from [`geometry_schlick_ggx_ibl`].
#[inline]
pub fn geometry_smith_ibl(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx_ibl(n_dot_v.max(0.0), roughness)
        * geometry_schlick_ggx_ibl(n_dot_l.max(0.0), roughness)
}

/// Schlick-GGX geometry term with `k = (roughness + 1)^2 / 8` (analytic lights).
#[inline]
pub fn geometry_schlick_ggx_direct(n_dot_v: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    n_dot_v / (n_dot_v * (1.0 - k) + k)
}

/// Smith geometry built from [`geometry_schlick_ggx_direct`].
#[inline]
pub fn geometry_smith_direct(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx_direct(n_dot_v, roughness) * geometry_schlick_ggx_direct(n_dot_l, roughness)
}

/// Fresnel-Schlick with a coloured F0.
#[inline]
pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * schlick_weight(cos_theta)
}

/// Fresnel-Schlick whose grazing value is clamped to `max(1 - roughness, F0)`.
#[inline]
pub fn fresnel_schlick_roughness(cos_theta: f32, roughness: f32, f0: Vec3) -> Vec3 {
    let grazing = Vec3::splat(1.0 - roughness).max(f0);
    f0 + (grazing - f0) * schlick_weight(cos_theta)
}

/// Normal-incidence reflectance: 4% for dielectrics, albedo for metals.
#[inline]
pub fn base_reflectance(albedo: Vec3, metallic: f32) -> Vec3 {
    Vec3::splat(0.04).lerp(albedo, metallic)
}
