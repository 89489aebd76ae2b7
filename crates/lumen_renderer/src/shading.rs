//! Direct plus image-based ambient shading.
//!
//! A non-stochastic evaluator: the first hit along a camera ray is lit by one
//! directional light (Cook-Torrance specular over Lambertian diffuse) and by
//! the precomputed [`IblMaps`] through the split-sum approximation.

use std::f32::consts::PI;

use lumen_core::{AmbientSource, ShadingSettings};
use lumen_math::{reflect, Interval, Ray, Vec3};

use crate::envmap::SphereMap;
use crate::hittable::{HitRecord, Scene};
use crate::ibl::IblMaps;
use crate::integrator::RAY_EPSILON;
use crate::material::Color;
use crate::microfacet::{
    base_reflectance, distribution_ggx, fresnel_schlick, fresnel_schlick_roughness,
    geometry_smith_direct,
};

/// Keeps the specular denominator away from zero at grazing angles.
const SPECULAR_BIAS: f32 = 1e-4;

/// Shading evaluator for the `ibl` render modes.
#[derive(Debug, Clone)]
pub struct IblShader {
    /// Unit direction towards the light
    light_direction: Vec3,
    light_intensity: f32,
    ambient_scale: f32,
    ambient_source: AmbientSource,
}

impl IblShader {
    pub fn new(settings: &ShadingSettings) -> Self {
        let light_direction = Vec3::from_array(settings.light_direction).normalize_or_zero();
        let light_direction = if light_direction == Vec3::ZERO {
            log::warn!("Light direction has zero length, lighting from +Y");
            Vec3::Y
        } else {
            light_direction
        };
        Self {
            light_direction,
            light_intensity: settings.light_intensity,
            ambient_scale: settings.ambient_scale,
            ambient_source: settings.ambient_source,
        }
    }

    /// Use another ambient source, keeping the light.
    pub fn with_ambient_source(mut self, source: AmbientSource) -> Self {
        self.ambient_source = source;
        self
    }

    /// Radiance seen along `ray`: the environment on a miss, otherwise the
    /// shaded first hit.
    pub fn radiance(&self, ray: &Ray, scene: &Scene, env: &SphereMap, maps: &IblMaps) -> Color {
        match scene.hit(ray, Interval::from_min(RAY_EPSILON)) {
            Some(rec) => self.shade(ray.origin(), &rec, maps),
            None => env.sample(ray.direction().normalize()),
        }
    }

    /// Shade a hit seen from `eye`.
    pub fn shade(&self, eye: Vec3, rec: &HitRecord, maps: &IblMaps) -> Color {
        let l = self.light_direction;
        let v = (eye - rec.p).normalize();
        let n = rec.normal;
        let h = (v + l).normalize_or_zero();
        let r = reflect(-v, n);

        let n_dot_l = n.dot(l).max(0.0);
        let n_dot_v = n.dot(v).max(0.0);
        let h_dot_v = h.dot(v).max(0.0);
        let n_dot_h = n.dot(h).max(0.0);

        let material = rec.material;
        let roughness = material.roughness();
        let metallic = material.metallic();
        let albedo = material.albedo();
        let f0 = base_reflectance(albedo, metallic);

        // Directional light
        let ndf = distribution_ggx(n_dot_h, roughness);
        let g = geometry_smith_direct(n_dot_v, n_dot_l, roughness);
        let f = fresnel_schlick(h_dot_v, f0);
        let k_d = (Color::ONE - f) * (1.0 - metallic);
        let specular = ndf * g * f / (4.0 * n_dot_v * n_dot_l + SPECULAR_BIAS);
        let direct = (k_d * albedo / PI + specular) * n_dot_l * self.light_intensity;

        // Ambient from the precomputed maps
        let env_f = fresnel_schlick_roughness(n_dot_v, roughness, f0);
        let a_d = (Color::ONE - env_f) * (1.0 - metallic);
        let irradiance = match self.ambient_source {
            AmbientSource::Irradiance => maps.irradiance(n),
            AmbientSource::SpecularMip => maps.pseudo_irradiance(n),
        };
        let reflection = maps.prefiltered(r, roughness);
        let brdf = maps.brdf(roughness, n_dot_v);
        let ambient = a_d * irradiance * albedo + reflection * (env_f * brdf.x + brdf.y);

        direct + ambient * self.ambient_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    fn flat_maps(irradiance: f32, specular: f32, brdf: (f32, f32)) -> IblMaps {
        IblMaps {
            irradiance: SphereMap::constant(Color::splat(irradiance)),
            specular: vec![
                SphereMap::constant(Color::splat(specular)),
                SphereMap::constant(Color::splat(specular)),
                SphereMap::constant(Color::splat(specular)),
            ],
            brdf: SphereMap::constant(Color::new(brdf.0, brdf.1, 0.0)),
        }
    }

    fn ball(material: Material) -> Scene {
        let mut scene = Scene::new();
        let index = scene.add_material(material);
        scene.add_sphere(Vec3::ZERO, 1.0, index);
        scene
    }

    fn settings(intensity: f32, ambient: f32) -> ShadingSettings {
        ShadingSettings {
            light_direction: [0.0, 1.0, 0.0],
            light_intensity: intensity,
            ambient_scale: ambient,
            ambient_source: AmbientSource::Irradiance,
        }
    }

    fn from_above() -> Ray {
        Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y)
    }

    #[test]
    fn test_miss_shows_environment() {
        let shader = IblShader::new(&ShadingSettings::default());
        let env = SphereMap::constant(Color::new(0.1, 0.2, 0.3));
        let c = shader.radiance(&from_above(), &Scene::new(), &env, &flat_maps(1.0, 1.0, (1.0, 0.0)));
        assert_eq!(c, Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_direct_light_head_on() {
        let scene = ball(Material::diffuse(Color::splat(0.5)));
        let shader = IblShader::new(&settings(1.0, 0.0));
        let env = SphereMap::constant(Color::ZERO);
        let c = shader.radiance(&from_above(), &scene, &env, &flat_maps(1.0, 1.0, (1.0, 0.0)));

        // Roughness 1: D = 1/pi, G = 1, F = 0.04 when N = V = L = H
        let expected = 0.96 * 0.5 / PI + 0.04 / (PI * (4.0 + SPECULAR_BIAS));
        assert!((c.x - expected).abs() < 1e-5, "{} vs {}", c.x, expected);
    }

    #[test]
    fn test_light_below_horizon_is_dark() {
        let scene = ball(Material::diffuse(Color::ONE));
        let mut s = settings(1.0, 0.0);
        s.light_direction = [0.0, -1.0, 0.0];
        let shader = IblShader::new(&s);
        let c = shader.radiance(&from_above(), &scene, &SphereMap::constant(Color::ZERO), &flat_maps(1.0, 1.0, (1.0, 0.0)));
        assert_eq!(c, Color::ZERO);
    }

    #[test]
    fn test_mirror_ambient_is_split_sum() {
        let albedo = Color::new(0.9, 0.6, 0.3);
        let scene = ball(Material::metal(albedo, 0.0, 1.0, 1.5));
        let shader = IblShader::new(&settings(0.0, 0.5));
        let maps = flat_maps(7.0, 2.0, (0.75, 0.125));
        let c = shader.radiance(&from_above(), &scene, &SphereMap::constant(Color::ZERO), &maps);

        // Fully metallic: no diffuse ambient, F0 = albedo
        let expected = 0.5 * 2.0 * (albedo * 0.75 + Color::splat(0.125));
        assert!((c - expected).length() < 1e-5, "{} vs {}", c, expected);
    }

    #[test]
    fn test_ambient_sources() {
        let scene = ball(Material::diffuse(Color::splat(0.5)));
        // Irradiance map reads 4, the blurry specular level reads 2
        let maps = flat_maps(4.0, 2.0, (0.0, 0.0));
        let env = SphereMap::constant(Color::ZERO);

        let shader = IblShader::new(&settings(0.0, 1.0));
        let from_map = shader.radiance(&from_above(), &scene, &env, &maps);
        assert!((from_map.x - 0.96 * 4.0 * 0.5).abs() < 1e-5, "{}", from_map);

        let pseudo = shader.with_ambient_source(AmbientSource::SpecularMip);
        let from_mip = pseudo.radiance(&from_above(), &scene, &env, &maps);
        assert!((from_mip.x - 0.96 * 2.0 * 0.5).abs() < 1e-5, "{}", from_mip);
    }

    #[test]
    fn test_zero_light_direction_falls_back() {
        let mut s = settings(1.0, 0.0);
        s.light_direction = [0.0, 0.0, 0.0];
        let shader = IblShader::new(&s);
        assert_eq!(shader.light_direction, Vec3::Y);
    }
}
