//! Surface materials.
//!
//! Every material answers two questions. [`Material::sample`] works in the
//! local shading frame and returns a weight that is already divided by the
//! sampling pdf; the path integrator multiplies it straight into its
//! throughput. [`Material::scatter`] is the simpler world-space contract of
//! the scatter integrator. The scalar accessors feed the shading evaluator.

use lumen_core::MaterialDesc;
use lumen_math::{is_zero, reflect, refract, schlick, Ray, Vec3, EPSILON};
use rand::RngCore;

use crate::frame::Frame;
use crate::hittable::HitRecord;
use crate::microfacet::{ggx_g1, ggx_g2, sample_ggx_vndf};
use crate::sampling::{gen_f32, random_on_cosine_hemisphere, random_on_hemisphere};

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Outcome of importance sampling a material in its local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSample {
    /// False when the sample is degenerate and `direction` must not be used
    pub continues: bool,
    /// BSDF * cos / pdf
    pub weight: Color,
    /// Sampled light direction in the local frame
    pub direction: Vec3,
}

impl MaterialSample {
    fn absorbed() -> Self {
        Self {
            continues: false,
            weight: Color::ZERO,
            direction: Vec3::ZERO,
        }
    }

    fn towards(direction: Vec3, weight: Color) -> Self {
        Self {
            continues: true,
            weight,
            direction,
        }
    }

    /// True if the sample carries energy along a usable direction.
    pub fn is_valid(&self) -> bool {
        self.continues && !is_zero(self.weight)
    }
}

/// Result of the world-space scatter contract.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    fn sample(&self, wo: Vec3, u0: f32, u1: f32) -> MaterialSample {
        if wo.z <= EPSILON {
            return MaterialSample::absorbed();
        }
        // cos/pi cancels against the cosine-hemisphere pdf
        MaterialSample::towards(random_on_cosine_hemisphere(u0, u1), self.albedo)
    }

    fn scatter(&self, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let frame = Frame::new(rec.facing_normal());
        let local = random_on_hemisphere(gen_f32(rng), gen_f32(rng));
        // Uniform hemisphere: albedo/pi * cos / (1/2pi)
        Some(ScatterResult {
            attenuation: self.albedo * (2.0 * local.z),
            scattered: Ray::new(rec.p, frame.local_to_world(local).normalize()),
        })
    }
}

/// GGX microfacet metal.
///
/// `ref_index` is the refractive index fed to Schlick's Fresnel and
/// `metallic` only matters to the shading evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Metal {
    albedo: Color,
    roughness: f32,
    metallic: f32,
    ref_index: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `roughness`: GGX width, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, roughness: f32, metallic: f32, ref_index: f32) -> Self {
        Self {
            albedo,
            roughness: roughness.clamp(0.0, 1.0),
            metallic: metallic.clamp(0.0, 1.0),
            ref_index,
        }
    }

    fn sample(&self, wo: Vec3, u0: f32, u1: f32) -> MaterialSample {
        if wo.z <= EPSILON {
            return MaterialSample::absorbed();
        }
        let m = sample_ggx_vndf(wo, self.roughness, u0, u1);
        let wi = 2.0 * wo.dot(m) * m - wo;
        if wi.z <= 0.0 {
            return MaterialSample::absorbed();
        }

        let alpha2 = self.roughness * self.roughness;
        let fresnel = schlick(wi.dot(m), self.ref_index);
        let masking = ggx_g2(wi, wo, alpha2) / ggx_g1(wo, alpha2);
        MaterialSample::towards(wi, self.albedo * (fresnel * masking))
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction(), rec.normal).normalize();
        // Only scatter if the reflected ray leaves the surface
        if reflected.dot(rec.normal) > 1e-4 {
            Some(ScatterResult {
                attenuation: self.albedo,
                scattered: Ray::new(rec.p, reflected),
            })
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, PartialEq)]
pub struct Dielectric {
    /// Tint applied on every interaction
    albedo: Color,
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(albedo: Color, ior: f32) -> Self {
        Self { albedo, ior }
    }

    /// Pick reflection or refraction of `direction` at a surface with
    /// outward normal `outward`. `u` drives the Fresnel choice.
    fn choose(&self, direction: Vec3, outward: Vec3, u: f32) -> Vec3 {
        let reflected = reflect(direction, outward).normalize();
        let d_dot_n = direction.dot(outward);
        let (normal, ni_over_nt, cosine) = if d_dot_n > 0.0 {
            // Leaving the medium
            (-outward, self.ior, self.ior * d_dot_n)
        } else {
            (outward, 1.0 / self.ior, -d_dot_n)
        };

        match refract(direction, normal, ni_over_nt) {
            Some(refracted) if u >= schlick(cosine, self.ior) => refracted.normalize(),
            _ => reflected,
        }
    }

    fn sample(&self, wo: Vec3, u0: f32) -> MaterialSample {
        MaterialSample::towards(self.choose(-wo, Vec3::Z, u0), self.albedo)
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let direction = self.choose(ray_in.direction(), rec.normal, gen_f32(rng));
        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// The closed set of surface materials.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Diffuse(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
}

impl Material {
    pub fn diffuse(albedo: Color) -> Self {
        Material::Diffuse(Lambertian::new(albedo))
    }

    pub fn metal(albedo: Color, roughness: f32, metallic: f32, ref_index: f32) -> Self {
        Material::Metal(Metal::new(albedo, roughness, metallic, ref_index))
    }

    pub fn dielectric(albedo: Color, ior: f32) -> Self {
        Material::Dielectric(Dielectric::new(albedo, ior))
    }

    /// Importance-sample a light direction for the local view direction `wo`
    /// (z = normal) using two independent uniforms.
    pub fn sample(&self, wo: Vec3, u0: f32, u1: f32) -> MaterialSample {
        match self {
            Material::Diffuse(m) => m.sample(wo, u0, u1),
            Material::Metal(m) => m.sample(wo, u0, u1),
            Material::Dielectric(m) => m.sample(wo, u0),
        }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns None if the ray is absorbed.
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        match self {
            Material::Diffuse(m) => m.scatter(rec, rng),
            Material::Metal(m) => m.scatter(ray_in, rec),
            Material::Dielectric(m) => m.scatter(ray_in, rec, rng),
        }
    }

    pub fn roughness(&self) -> f32 {
        match self {
            Material::Diffuse(_) => 1.0,
            Material::Metal(m) => m.roughness,
            Material::Dielectric(_) => 0.0,
        }
    }

    pub fn metallic(&self) -> f32 {
        match self {
            Material::Metal(m) => m.metallic,
            Material::Diffuse(_) | Material::Dielectric(_) => 0.0,
        }
    }

    pub fn albedo(&self) -> Color {
        match self {
            Material::Diffuse(m) => m.albedo,
            Material::Metal(m) => m.albedo,
            Material::Dielectric(m) => m.albedo,
        }
    }
}

impl From<&MaterialDesc> for Material {
    fn from(desc: &MaterialDesc) -> Self {
        match *desc {
            MaterialDesc::Diffuse { albedo } => Material::diffuse(Vec3::from_array(albedo)),
            MaterialDesc::Metal {
                albedo,
                roughness,
                metallic,
                ref_index,
            } => Material::metal(Vec3::from_array(albedo), roughness, metallic, ref_index),
            MaterialDesc::Dielectric { albedo, ref_index } => {
                Material::dielectric(Vec3::from_array(albedo), ref_index)
            }
        }
    }
}
