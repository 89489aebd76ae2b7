//! Scene container and HitRecord for ray-object intersection.

use lumen_core::SceneDescription;
use lumen_math::{Interval, Ray, Vec3};

use crate::material::Material;
use crate::sphere::Sphere;

/// Record of a ray-object intersection.
#[derive(Debug, Clone)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Unit outward surface normal
    pub normal: Vec3,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Material at the intersection point, borrowed from the scene
    pub material: &'a Material,
}

impl HitRecord<'_> {
    /// The normal flipped to point against the incoming ray.
    #[inline]
    pub fn facing_normal(&self) -> Vec3 {
        if self.front_face {
            self.normal
        } else {
            -self.normal
        }
    }
}

/// Geometric primitives the scene can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
}

impl Primitive {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<f32> {
        match self {
            Primitive::Sphere(s) => s.intersect(ray, ray_t),
        }
    }

    fn outward_normal(&self, p: Vec3) -> Vec3 {
        match self {
            Primitive::Sphere(s) => s.outward_normal(p),
        }
    }

    fn material(&self) -> usize {
        match self {
            Primitive::Sphere(s) => s.material(),
        }
    }
}

/// A flat list of primitives plus the materials they share.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    materials: Vec<Material>,
    primitives: Vec<Primitive>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a validated description.
    pub fn from_description(desc: &SceneDescription) -> Self {
        let mut scene = Self::new();
        for material in &desc.materials {
            scene.add_material(Material::from(material));
        }
        for sphere in &desc.spheres {
            scene.add_sphere(Vec3::from_array(sphere.center), sphere.radius, sphere.material);
        }
        log::debug!(
            "Built scene with {} materials, {} primitives",
            scene.materials.len(),
            scene.primitives.len()
        );
        scene
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a sphere. Indices past the end of the arena are ignored.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32, material: usize) {
        if material >= self.materials.len() {
            log::warn!("Dropping sphere at {center}: no material {material}");
            return;
        }
        self.primitives
            .push(Primitive::Sphere(Sphere::new(center, radius, material)));
    }

    /// Get the number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Nearest hit strictly inside `ray_t`. Equidistant hits go to the
    /// primitive added first.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest: Option<(f32, &Primitive)> = None;
        let mut closest_so_far = ray_t.max;

        for primitive in &self.primitives {
            if let Some(t) = primitive.intersect(ray, ray_t.with_max(closest_so_far)) {
                closest_so_far = t;
                closest = Some((t, primitive));
            }
        }

        let (t, primitive) = closest?;
        let p = ray.at(t);
        let normal = primitive.outward_normal(p);
        Some(HitRecord {
            t,
            p,
            normal,
            front_face: ray.direction().dot(normal) < 0.0,
            material: &self.materials[primitive.material()],
        })
    }
}
