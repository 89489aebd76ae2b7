//! Render settings.
//!
//! Everything the renderer needs from the outside world arrives as plain
//! values in a [`RenderSettings`]. Defaults give the demo renders; a
//! JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Camera placement and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub eye: [f32; 3],
    pub look_at: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub vfov_degrees: f32,
    /// Lens diameter; zero gives a pinhole
    pub aperture: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: [9.0, 1.2, 2.5],
            look_at: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            vfov_degrees: 45.0,
            aperture: 0.01,
        }
    }
}

/// Resolutions and sample counts of the IBL precomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IblSettings {
    pub irradiance_size: u32,
    pub irradiance_samples: u32,
    pub specular_size: u32,
    pub specular_levels: u32,
    pub specular_samples: u32,
    pub brdf_size: u32,
    pub brdf_samples: u32,
}

impl Default for IblSettings {
    fn default() -> Self {
        Self {
            irradiance_size: 128,
            irradiance_samples: 4096,
            specular_size: 128,
            specular_levels: 6,
            specular_samples: 4096,
            brdf_size: 256,
            brdf_samples: 1024,
        }
    }
}

/// Where the diffuse ambient term of the shading evaluator comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientSource {
    /// The convolved irradiance map
    #[default]
    Irradiance,
    /// A blurry level of the specular chain standing in for irradiance
    SpecularMip,
}

/// Direct light and ambient weights for the shading evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingSettings {
    /// Direction towards the light
    pub light_direction: [f32; 3],
    pub light_intensity: f32,
    pub ambient_scale: f32,
    pub ambient_source: AmbientSource,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            light_direction: [0.0, 1.0, 0.0],
            light_intensity: 0.1,
            ambient_scale: 0.9,
            ambient_source: AmbientSource::Irradiance,
        }
    }
}

/// Top-level render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    /// Seed for every random stream of the render
    pub seed: u64,
    pub camera: CameraSettings,
    pub ibl: IblSettings,
    pub shading: ShadingSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            samples_per_pixel: 512,
            max_depth: 16,
            seed: 1,
            camera: CameraSettings::default(),
            ibl: IblSettings::default(),
            shading: ShadingSettings::default(),
        }
    }
}

impl RenderSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&text)?;
        log::debug!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Parse settings from a JSON string and validate them.
    pub fn from_json(text: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every size and count is usable.
    pub fn validate(&self) -> SettingsResult<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("samples_per_pixel", self.samples_per_pixel),
            ("max_depth", self.max_depth),
            ("ibl.irradiance_size", self.ibl.irradiance_size),
            ("ibl.irradiance_samples", self.ibl.irradiance_samples),
            ("ibl.specular_size", self.ibl.specular_size),
            ("ibl.specular_levels", self.ibl.specular_levels),
            ("ibl.specular_samples", self.ibl.specular_samples),
            ("ibl.brdf_size", self.ibl.brdf_size),
            ("ibl.brdf_samples", self.ibl.brdf_samples),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let fov = self.camera.vfov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(SettingsError::Invalid {
                field: "camera.vfov_degrees",
                reason: format!("{fov} is outside (0, 180)"),
            });
        }
        if self.camera.aperture < 0.0 {
            return Err(SettingsError::Invalid {
                field: "camera.aperture",
                reason: "must not be negative".to_string(),
            });
        }
        if self.camera.eye == self.camera.look_at {
            return Err(SettingsError::Invalid {
                field: "camera.look_at",
                reason: "coincides with camera.eye".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ibl.specular_levels, 6);
        assert_eq!(settings.shading.ambient_source, AmbientSource::Irradiance);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = RenderSettings::from_json(
            r#"{ "width": 64, "camera": { "aperture": 0.0 }, "shading": { "ambient_source": "specular_mip" } }"#,
        )
        .unwrap();

        assert_eq!(settings.width, 64);
        assert_eq!(settings.height, 300);
        assert_eq!(settings.camera.aperture, 0.0);
        assert_eq!(settings.camera.vfov_degrees, 45.0);
        assert_eq!(settings.shading.ambient_source, AmbientSource::SpecularMip);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = RenderSettings::from_json(r#"{ "ibl": { "specular_levels": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid { field: "ibl.specular_levels", .. }
        ));
    }

    #[test]
    fn test_bad_fov_rejected() {
        let mut settings = RenderSettings::default();
        settings.camera.vfov_degrees = 180.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = RenderSettings::from_json("{ width: ").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
