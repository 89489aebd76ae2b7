//! Thin-lens camera for ray generation.

use lumen_core::CameraSettings;
use lumen_math::{Ray, Vec3};

use crate::sampling::{random_on_disk, Sample2};

/// Camera for generating rays into the scene.
///
/// Rays start on a lens disk around the eye and pass through the image plane
/// one unit along `forward`; there is no separate focus distance.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    width: u32,
    height: u32,

    // Half extents of the image plane: tan(vfov / 2) * aspect, tan(vfov / 2)
    dx: f32,
    dy: f32,

    // Basis
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,

    lens_radius: f32,
}

impl Camera {
    /// Create a camera at the origin looking down -Z.
    ///
    /// - `vfov`: vertical field of view in degrees
    /// - `aperture`: lens diameter, zero for a pinhole
    pub fn new(width: u32, height: u32, vfov: f32, aperture: f32) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        let dy = (0.5 * vfov.to_radians()).tan();
        Self {
            width,
            height,
            dx: dy * aspect,
            dy,
            origin: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            lens_radius: aperture * 0.5,
        }
    }

    /// Build from render settings.
    pub fn from_settings(settings: &CameraSettings, width: u32, height: u32) -> Self {
        Self::new(width, height, settings.vfov_degrees, settings.aperture).with_position(
            Vec3::from_array(settings.eye),
            Vec3::from_array(settings.look_at),
            Vec3::from_array(settings.up),
        )
    }

    /// Set camera position.
    pub fn with_position(mut self, eye: Vec3, at: Vec3, up: Vec3) -> Self {
        self.look_at(eye, at, up);
        self
    }

    /// Place the camera at `eye` looking towards `at`.
    pub fn look_at(&mut self, eye: Vec3, at: Vec3, up: Vec3) {
        let forward = (at - eye).normalize();
        // Swap in another up vector when the requested one is parallel
        let up = if forward.dot(up).abs() > 0.999 {
            Vec3::new(forward.z, forward.x, forward.y)
        } else {
            up
        };
        let right = forward.cross(up).normalize();

        self.origin = eye;
        self.forward = forward;
        self.right = right;
        self.up = right.cross(forward).normalize();
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Generate a ray for pixel (x, y) from one screen and one lens sample,
    /// both in [0, 1)^2. Row 0 is the bottom of the image.
    pub fn generate_ray(&self, x: u32, y: u32, screen: Sample2, lens: Sample2) -> Ray {
        let lens = random_on_disk(lens.x, lens.y) * self.lens_radius;
        let origin = self.origin + lens.x * self.up + lens.y * self.right;

        let dx = self.dx * screen_to_ndc(x, self.width, screen.x - 0.499);
        let dy = self.dy * screen_to_ndc(y, self.height, screen.y - 0.499);
        let direction = (dx * self.right + dy * self.up + self.forward).normalize();

        Ray::new(origin, direction)
    }
}

/// Pixel index plus sub-pixel jitter to normalized device coordinates in
/// [-1, 1].
#[inline]
pub fn screen_to_ndc(x: u32, resolution: u32, jitter: f32) -> f32 {
    2.0 * ((x as f32 + 0.5 + jitter) / resolution as f32) - 1.0
}
