//! Lumen Core - I/O, settings and scene description for the Lumen renderer.
//!
//! This crate provides:
//!
//! - **Radiance images**: HDR light probe loading, HDR/PNG export
//! - **Render settings**: serde-loadable configuration with reference defaults
//! - **Scene description**: materials and spheres, JSON or procedural
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{load_radiance, RenderSettings, SceneDescription};
//!
//! let probe = load_radiance("uffizi_probe.hdr")?;
//! let settings = RenderSettings::default();
//! let scene = SceneDescription::demo_metals(7);
//! ```

pub mod image_io;
pub mod scene;
pub mod settings;

// Re-export commonly used types
pub use image_io::{load_radiance, save_rgba_png, ImageIoError, ImageIoResult, RadianceImage};
pub use scene::{MaterialDesc, SceneDescription, SceneError, SceneResult, SphereDesc};
pub use settings::{
    AmbientSource, CameraSettings, IblSettings, RenderSettings, SettingsError, SettingsResult,
    ShadingSettings,
};
