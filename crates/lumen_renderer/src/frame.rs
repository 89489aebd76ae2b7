//! Local shading frame.

use lumen_math::Vec3;

/// Orthonormal basis anchored at a shading point, with `normal` as local +z.
///
/// Built with the branchless revision of Frisvad's method (Duff et al.,
/// "Building an Orthonormal Basis, Revisited", JCGT 2017), which stays
/// accurate in f32 over the whole sphere.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub normal: Vec3,
    pub binormal0: Vec3,
    pub binormal1: Vec3,
}

impl Frame {
    /// Build a frame around a unit normal.
    pub fn new(normal: Vec3) -> Self {
        let sign = 1.0_f32.copysign(normal.z);
        let a = -1.0 / (sign + normal.z);
        let b = normal.x * normal.y * a;
        Self {
            normal,
            binormal0: Vec3::new(1.0 + sign * normal.x * normal.x * a, sign * b, -sign * normal.x),
            binormal1: Vec3::new(b, sign + normal.y * normal.y * a, -normal.y),
        }
    }

    /// Express a world direction in the local frame.
    #[inline]
    pub fn world_to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.binormal0), v.dot(self.binormal1), v.dot(self.normal))
    }

    /// Express a local direction in world space.
    #[inline]
    pub fn local_to_world(&self, v: Vec3) -> Vec3 {
        self.binormal0 * v.x + self.binormal1 * v.y + self.normal * v.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{random_on_hemisphere, random_on_sphere};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_unit(rng: &mut StdRng) -> Vec3 {
        random_on_sphere(rng.gen(), rng.gen())
    }

    #[test]
    fn test_frame_is_orthonormal() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut normals: Vec<Vec3> = (0..500).map(|_| random_unit(&mut rng)).collect();
        normals.extend([Vec3::Z, Vec3::NEG_Z, Vec3::X, Vec3::Y]);

        for n in normals {
            let f = Frame::new(n);
            assert!(f.normal.dot(f.binormal0).abs() < 1e-3, "n={n}");
            assert!(f.normal.dot(f.binormal1).abs() < 1e-3, "n={n}");
            assert!(f.binormal0.dot(f.binormal1).abs() < 1e-3, "n={n}");
            assert!((f.binormal0.length() - 1.0).abs() < 1e-3, "n={n}");
            assert!((f.binormal1.length() - 1.0).abs() < 1e-3, "n={n}");
            assert_eq!(f.normal, n);
        }
    }

    #[test]
    fn test_frame_near_south_pole() {
        for i in 1..=200 {
            let e = 1e-3 * i as f32 / 200.0;
            for k in 0..16 {
                let phi = k as f32 * std::f32::consts::TAU / 16.0;
                let n = Vec3::new(e * phi.cos(), e * phi.sin(), -1.0).normalize();
                let f = Frame::new(n);
                assert!(f.normal.dot(f.binormal0).abs() < 1e-5, "n={n}");
                assert!(f.normal.dot(f.binormal1).abs() < 1e-5, "n={n}");
                assert!(f.binormal0.dot(f.binormal1).abs() < 1e-5, "n={n}");
                assert!((f.binormal0.length() - 1.0).abs() < 1e-5, "n={n}");
                assert!((f.binormal1.length() - 1.0).abs() < 1e-5, "n={n}");
                assert!((f.world_to_local(n) - Vec3::Z).length() < 1e-5, "n={n}");
            }
        }
    }

    #[test]
    fn test_frame_is_right_handed() {
        for n in [Vec3::Z, Vec3::NEG_Z, Vec3::new(0.3, -0.4, -0.866).normalize()] {
            let f = Frame::new(n);
            assert!((f.binormal0.cross(f.binormal1) - n).length() < 1e-5, "n={n}");
        }
    }

    #[test]
    fn test_normal_maps_to_local_z() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..500 {
            let n = random_unit(&mut rng);
            let local = Frame::new(n).world_to_local(n);
            assert!((local - Vec3::Z).length() < 1e-3, "n={n} local={local}");
        }
    }

    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let f = Frame::new(random_unit(&mut rng));
            let v = random_unit(&mut rng);
            let back = f.world_to_local(f.local_to_world(v));
            assert!((back - v).length() < 1e-3);
        }
    }

    #[test]
    fn test_hemisphere_sample_stays_around_normal() {
        let n = Vec3::new(0.5, -0.5, 0.5).normalize();
        let f = Frame::new(n);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let w = f.local_to_world(random_on_hemisphere(rng.gen(), rng.gen()));
            assert!((w.length() - 1.0).abs() < 1e-4);
            assert!(w.dot(n) >= -1e-6);
        }
    }
}
