//! Sphere primitive for ray tracing.

use lumen_math::{Interval, Ray, Vec3};

/// A sphere referencing a material in its scene's material arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: usize,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: usize) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Index of the material in the owning scene.
    pub fn material(&self) -> usize {
        self.material
    }

    /// Nearest ray parameter strictly inside `ray_t`, if any.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<f32> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let root = (h - sqrtd) / a;
        if ray_t.surrounds(root) {
            return Some(root);
        }
        let root = (h + sqrtd) / a;
        ray_t.surrounds(root).then_some(root)
    }

    /// Unit outward normal at a point on the surface.
    #[inline]
    pub fn outward_normal(&self, p: Vec3) -> Vec3 {
        (p - self.center) / self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::ZERO, 0.5, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);

        let t = sphere.intersect(&ray, Interval::new(0.0, 1.0)).unwrap();
        assert!((t - 0.5).abs() < 1e-6);
        assert!((sphere.outward_normal(ray.at(t)) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::ZERO, 0.5, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.51, 1.0), Vec3::NEG_Z);
        assert!(sphere.intersect(&ray, Interval::new(0.0, 1.0)).is_none());

        // Just inside the silhouette
        let grazing = Ray::new(Vec3::new(0.0, 0.499, 1.0), Vec3::NEG_Z);
        assert!(sphere.intersect(&grazing, Interval::new(0.0, 1.0)).is_some());

        // Ray pointing away from sphere
        let away = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        assert!(sphere.intersect(&away, Interval::from_min(0.001)).is_none());
    }

    #[test]
    fn test_far_root_from_inside() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = sphere.intersect(&ray, Interval::from_min(0.001)).unwrap();
        assert!((t - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_interval_excludes_endpoints() {
        let sphere = Sphere::new(Vec3::ZERO, 0.5, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
        // Both roots (0.5 and 1.5) fall outside the open interval
        assert!(sphere.intersect(&ray, Interval::new(0.5, 1.5)).is_none());
    }
}
