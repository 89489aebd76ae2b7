//! Scalar helpers and the small optics kernel shared by materials and IBL.

use crate::Vec3;

/// Tolerance used by every epsilon guard in the renderer.
pub const EPSILON: f32 = 1.0e-6;

/// Approximate equality within [`EPSILON`].
#[inline]
pub fn equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}

/// True when every component is within [`EPSILON`] of zero.
#[inline]
pub fn is_zero(v: Vec3) -> bool {
    v.abs().max_element() <= EPSILON
}

/// Clamp to [0, 1].
#[inline]
pub fn saturate(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Schlick's approximation of Fresnel reflectance for a refractive index.
#[inline]
pub fn schlick(cosine: f32, ref_index: f32) -> f32 {
    let r0 = (1.0 - ref_index) / (1.0 + ref_index);
    let r0 = r0 * r0;
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `v` through a surface with normal `n` (facing against `v`).
///
/// Returns `None` on total internal reflection.
#[inline]
pub fn refract(v: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let dt = v.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ni_over_nt * (v - dt * n) - discriminant.sqrt() * n)
    } else {
        None
    }
}
