//! Scene description types for Lumen.
//!
//! A renderer-agnostic list of materials and spheres. Spheres refer to
//! materials by index so one material can be shared by many primitives.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Sphere {sphere} references material {material}, but only {count} exist")]
    MissingMaterial {
        sphere: usize,
        material: usize,
        count: usize,
    },

    #[error("Sphere {0} has a non-positive radius")]
    BadRadius(usize),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A material definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDesc {
    Diffuse {
        albedo: [f32; 3],
    },
    Metal {
        albedo: [f32; 3],
        roughness: f32,
        metallic: f32,
        /// Refractive index fed to Schlick's Fresnel
        ref_index: f32,
    },
    Dielectric {
        albedo: [f32; 3],
        ref_index: f32,
    },
}

/// A sphere referencing a material by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereDesc {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: usize,
}

/// A complete scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub materials: Vec<MaterialDesc>,
    pub spheres: Vec<SphereDesc>,
}

impl SceneDescription {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: MaterialDesc) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a sphere using an existing material index.
    pub fn add_sphere(&mut self, center: [f32; 3], radius: f32, material: usize) {
        self.spheres.push(SphereDesc {
            center,
            radius,
            material,
        });
    }

    /// Load a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let scene = Self::from_json(&text)?;
        log::info!(
            "Loaded scene {} ({} materials, {} spheres)",
            path.as_ref().display(),
            scene.materials.len(),
            scene.spheres.len()
        );
        Ok(scene)
    }

    /// Parse a scene from JSON and validate it.
    pub fn from_json(text: &str) -> SceneResult<Self> {
        let scene: Self = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check material references and radii.
    pub fn validate(&self) -> SceneResult<()> {
        for (i, sphere) in self.spheres.iter().enumerate() {
            if sphere.material >= self.materials.len() {
                return Err(SceneError::MissingMaterial {
                    sphere: i,
                    material: sphere.material,
                    count: self.materials.len(),
                });
            }
            if !(sphere.radius > 0.0) {
                return Err(SceneError::BadRadius(i));
            }
        }
        Ok(())
    }

    /// Grid of small metal spheres with random albedo, roughness and
    /// metallic weight around one large brushed-metal sphere.
    pub fn demo_metals(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = Self::new();

        for_each_grid_center(&mut rng, |rng, center| {
            let material = scene.add_material(MaterialDesc::Metal {
                albedo: rng.gen(),
                roughness: rng.gen::<f32>() * 0.9 + 0.01,
                metallic: rng.gen::<f32>() * 0.9 + 0.01,
                ref_index: 20.0,
            });
            scene.add_sphere(center, 0.2, material);
        });

        let big = scene.add_material(MaterialDesc::Metal {
            albedo: [0.7, 0.6, 0.5],
            roughness: 0.05,
            metallic: 0.5,
            ref_index: 20.0,
        });
        scene.add_sphere([4.0, 1.0, 0.0], 1.0, big);
        scene
    }

    /// Same grid with a mix of diffuse, metal and glass spheres plus one
    /// large sphere of each kind.
    pub fn demo_mixed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = Self::new();

        for_each_grid_center(&mut rng, |rng, center| {
            let albedo: [f32; 3] = rng.gen();
            let selection: f32 = rng.gen();
            let material = if selection < 0.4 {
                MaterialDesc::Diffuse { albedo }
            } else if selection < 0.8 {
                MaterialDesc::Metal {
                    albedo,
                    roughness: rng.gen::<f32>() * 0.5 + 0.1,
                    metallic: 1.0,
                    ref_index: 20.0,
                }
            } else {
                MaterialDesc::Dielectric {
                    albedo: [1.0, 1.0, 1.0],
                    ref_index: 1.5,
                }
            };
            let index = scene.add_material(material);
            scene.add_sphere(center, 0.2, index);
        });

        let glass = scene.add_material(MaterialDesc::Dielectric {
            albedo: [1.0, 1.0, 1.0],
            ref_index: 1.5,
        });
        let clay = scene.add_material(MaterialDesc::Diffuse {
            albedo: [0.4, 0.2, 0.1],
        });
        let metal = scene.add_material(MaterialDesc::Metal {
            albedo: [0.7, 0.6, 0.5],
            roughness: 0.05,
            metallic: 1.0,
            ref_index: 20.0,
        });
        scene.add_sphere([0.0, 1.0, 0.0], 1.0, glass);
        scene.add_sphere([-4.0, 1.0, 0.0], 1.0, clay);
        scene.add_sphere([4.0, 1.0, 0.0], 1.0, metal);
        scene
    }
}

/// Jittered 22x22 grid of small-sphere centres, skipping the spot taken by
/// the large sphere at (4, 1, 0).
fn for_each_grid_center(rng: &mut StdRng, mut f: impl FnMut(&mut StdRng, [f32; 3])) {
    for a in -11..11 {
        for b in -11..11 {
            let center = [
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            ];
            let dx = center[0] - 4.0;
            let dz = center[2];
            if (dx * dx + dz * dz).sqrt() <= 0.9 {
                continue;
            }
            f(rng, center);
        }
    }
}
