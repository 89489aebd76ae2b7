//! Lumen Renderer - CPU path tracing and image-based lighting
//!
//! A Monte Carlo path tracer lit by an angular light probe, plus the
//! precomputation pipeline (irradiance, pre-filtered specular, split-sum
//! BRDF lookup) behind a non-stochastic direct+ambient evaluator.
//!
//! # Example
//!
//! ```ignore
//! use lumen_renderer::{Camera, PathTracer, RenderConfig, Renderer, Scene, SphereMap, Technique};
//!
//! let env = SphereMap::from_image(lumen_core::load_radiance("probe.hdr")?);
//! let scene = Scene::from_description(&lumen_core::SceneDescription::demo_metals(7));
//! let config = RenderConfig::default();
//! let camera = Camera::new(400, 300, 45.0, 0.01);
//! let technique = Technique::Path(PathTracer::new(config.max_depth));
//! let image = Renderer::new(camera, &scene, &env, technique, &config).render("metals");
//! image.save_png("metals.png")?;
//! ```

pub mod sampling;
mod frame;
pub mod microfacet;
mod material;
mod sphere;
mod hittable;
mod camera;
mod color;
mod envmap;
mod ibl;
mod integrator;
mod shading;
mod renderer;
mod bucket;

pub use frame::Frame;
pub use material::{Color, Dielectric, Lambertian, Material, MaterialSample, Metal, ScatterResult};
pub use sphere::Sphere;
pub use hittable::{HitRecord, Primitive, Scene};
pub use camera::Camera;
pub use color::{color_to_rgba, linear_to_srgb, luminance, srgb_to_linear};
pub use envmap::SphereMap;
pub use ibl::{brdf_lut, irradiance_map, specular_chain, specular_map, IblMaps};
pub use integrator::{russian_roulette, PathTracer, DEFAULT_RR_DEPTH, RAY_EPSILON};
pub use shading::IblShader;
pub use renderer::{GaussianFilter, ImageBuffer, RenderConfig, Renderer, Technique};
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Interval, Ray, Vec3};
