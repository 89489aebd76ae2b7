//! Angular-map light probes.
//!
//! A [`SphereMap`] stores radiance over the full sphere of directions in the
//! angular ("light probe") projection. Let `(u, v)` be normalised image
//! coordinates with `u` running left to right and `v` top to bottom, and
//! `U = 2u - 1`, `V = 1 - 2v`, `rho = sqrt(U^2 + V^2)`. Then
//!
//! ```text
//! direction = (sin(pi*rho) * U/rho, sin(pi*rho) * V/rho, cos(pi*rho))
//! ```
//!
//! The image centre looks along +z and the rim of the inscribed disk along
//! -z. [`SphereMap::sample`] applies the inverse and reads the texel at
//! `(u*(W-1), v*(H-1))` with bilinear filtering, so a texel centre and the
//! direction [`SphereMap::direction_at`] returns for it agree exactly.

use std::f32::consts::PI;

use lumen_core::{ImageIoResult, RadianceImage};
use lumen_math::{Vec3, EPSILON};
use rayon::prelude::*;

use crate::material::Color;

/// A radiance image addressed by direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMap {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl SphereMap {
    /// Wrap a decoded radiance image.
    pub fn from_image(image: RadianceImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            pixels: image.pixels,
        }
    }

    /// The same radiance from every direction.
    pub fn constant(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    /// Build a map by evaluating `f(x, y)` for every texel, rows in parallel.
    /// Zero sizes are raised to one.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> Color + Sync,
    {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = vec![Color::ZERO; width as usize * height as usize];
        pixels
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, texel) in row.iter_mut().enumerate() {
                    *texel = f(x as u32, y as u32);
                }
            });
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Texel at integer coordinates, clamped to the edges.
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> Color {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Bilinear lookup at texel coordinates. Integer coordinates land
    /// exactly on texel centres; out-of-range coordinates clamp to the edge.
    pub fn pixel(&self, x: f32, y: f32) -> Color {
        let fx = x.floor();
        let fy = y.floor();
        let ix = fx as i64;
        let iy = fy as i64;
        let dx = (x - fx).clamp(0.0, 1.0);
        let dy = (y - fy).clamp(0.0, 1.0);

        let c00 = self.texel(ix, iy);
        let c01 = self.texel(ix + 1, iy);
        let c10 = self.texel(ix, iy + 1);
        let c11 = self.texel(ix + 1, iy + 1);

        let c0 = c00 * (1.0 - dx) + c01 * dx;
        let c1 = c10 * (1.0 - dx) + c11 * dx;
        c0 * (1.0 - dy) + c1 * dy
    }

    /// Radiance arriving from unit direction `n`.
    pub fn sample(&self, n: Vec3) -> Color {
        let (u, v) = direction_to_uv(n);
        self.pixel(
            u * (self.width - 1) as f32,
            v * (self.height - 1) as f32,
        )
    }

    /// Direction seen through normalised coordinates `(x, y)` in [0, 1]^2.
    /// Points outside the inscribed disk map onto its rim.
    pub fn direction_at(x: f32, y: f32) -> Vec3 {
        let u = 2.0 * x - 1.0;
        let v = 1.0 - 2.0 * y;
        let rho = (u * u + v * v).sqrt();
        if rho <= EPSILON {
            return Vec3::Z;
        }
        let angle = PI * rho.min(1.0);
        let s = angle.sin() / rho;
        Vec3::new(s * u, s * v, angle.cos()).normalize()
    }

    /// Direction through the centre of texel `(x, y)` of a map of this size.
    pub fn texel_direction(&self, x: u32, y: u32) -> Vec3 {
        Self::direction_at(
            x as f32 * texel_step(self.width),
            y as f32 * texel_step(self.height),
        )
    }

    /// Copy out as a radiance image for export.
    pub fn to_image(&self) -> ImageIoResult<RadianceImage> {
        RadianceImage::new(self.width, self.height, self.pixels.clone())
    }

    pub fn save_hdr(&self, path: impl AsRef<std::path::Path>) -> ImageIoResult<()> {
        self.to_image()?.save_hdr(path)
    }

    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> ImageIoResult<()> {
        self.to_image()?.save_png(path)
    }
}

/// Spacing in normalised coordinates between neighbouring texel centres.
#[inline]
pub fn texel_step(resolution: u32) -> f32 {
    if resolution > 1 {
        1.0 / (resolution - 1) as f32
    } else {
        0.0
    }
}

/// Normalised image coordinates of a unit direction.
fn direction_to_uv(n: Vec3) -> (f32, f32) {
    let d = (n.x * n.x + n.y * n.y).sqrt();
    if d < EPSILON {
        // Straight ahead is the centre, straight behind is the rim
        return if n.z > 0.0 { (0.5, 0.5) } else { (0.5, 1.0) };
    }
    let r = n.z.clamp(-1.0, 1.0).acos() / (PI * d);
    ((n.x * r + 1.0) * 0.5, (1.0 - n.y * r) * 0.5)
}
