//! Image rendering.
//!
//! Implements the per-pixel estimator with:
//! - One screen and one lens sample set shared by every pixel
//! - Gaussian-weighted reconstruction of the samples
//! - Buckets rendered in parallel on the rayon pool
//!
//! Reusing the same sample sets for every pixel correlates the noise between
//! neighbouring pixels.

use std::path::Path;
use std::time::Instant;

use lumen_core::{save_rgba_png, ImageIoResult, RadianceImage, RenderSettings};
use lumen_math::EPSILON;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::camera::Camera;
use crate::color::color_to_rgba;
use crate::envmap::SphereMap;
use crate::hittable::Scene;
use crate::ibl::IblMaps;
use crate::integrator::PathTracer;
use crate::material::Color;
use crate::sampling::{golden_set, sampler_set, stream_seed, JitteredR2Sampler, Sample2};
use crate::shading::IblShader;

// Random stream ids under the render seed; bucket `i` uses `BUCKET_STREAM + i`
const SCREEN_STREAM: u64 = 0;
const LENS_STREAM: u64 = 1;
const BUCKET_STREAM: u64 = 2;

/// Jitter strength of the lens sample set.
const LENS_JITTER: f32 = 0.05;

/// Width of the Gaussian pixel filter in screen-sample units.
const FILTER_SIGMA: f32 = 0.5;

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Samples per pixel for the stochastic techniques
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    /// Seeds the sample sets and every bucket's stream
    pub seed: u64,
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}

impl RenderConfig {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            samples_per_pixel: settings.samples_per_pixel,
            max_depth: settings.max_depth,
            seed: settings.seed,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

/// How the radiance of a camera ray is estimated.
#[derive(Debug, Clone)]
pub enum Technique<'a> {
    /// Importance-sampled path tracing
    Path(PathTracer),
    /// Path tracing through each material's scatter contract
    Scatter(PathTracer),
    /// Direct light plus image-based ambient, one centred ray per pixel
    Ibl {
        shader: IblShader,
        maps: &'a IblMaps,
    },
}

impl Technique<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Technique::Path(_) => "path",
            Technique::Scatter(_) => "scatter",
            Technique::Ibl { .. } => "ibl",
        }
    }

    fn is_stochastic(&self) -> bool {
        !matches!(self, Technique::Ibl { .. })
    }
}

/// Gaussian reconstruction weight of a screen sample in [0, 1)^2.
#[derive(Debug, Clone, Copy)]
pub struct GaussianFilter {
    scale: f32,
    falloff: f32,
}

impl GaussianFilter {
    pub fn new(sigma: f32) -> Self {
        let variance = sigma * sigma;
        Self {
            scale: 1.0 / (2.0 * std::f32::consts::PI * variance).sqrt(),
            falloff: -1.0 / (2.0 * variance),
        }
    }

    /// Weight of a sample, measured from the pixel centre in [-1, 1]^2.
    #[inline]
    pub fn weight(&self, sample: Sample2) -> f32 {
        let d = 2.0 * sample - Sample2::ONE;
        self.scale * (self.falloff * d.length_squared()).exp()
    }
}

/// Everything one render reads, immutable once built.
pub struct Renderer<'a> {
    camera: Camera,
    scene: &'a Scene,
    env: &'a SphereMap,
    technique: Technique<'a>,
    filter: GaussianFilter,
    screen_samples: Vec<Sample2>,
    lens_samples: Vec<Sample2>,
    seed: u64,
    bucket_size: u32,
}

impl<'a> Renderer<'a> {
    pub fn new(
        camera: Camera,
        scene: &'a Scene,
        env: &'a SphereMap,
        technique: Technique<'a>,
        config: &RenderConfig,
    ) -> Self {
        let (screen_samples, lens_samples) = if technique.is_stochastic() {
            let count = config.samples_per_pixel.max(1) as usize;
            let mut rng = StdRng::seed_from_u64(stream_seed(config.seed, SCREEN_STREAM));
            let mut lens =
                JitteredR2Sampler::new(LENS_JITTER, stream_seed(config.seed, LENS_STREAM));
            (golden_set(count, &mut rng), sampler_set(count, &mut lens))
        } else {
            // One ray through the pixel centre and the lens centre
            (vec![Sample2::splat(0.499)], vec![Sample2::splat(0.5)])
        };

        Self {
            camera,
            scene,
            env,
            technique,
            filter: GaussianFilter::new(FILTER_SIGMA),
            screen_samples,
            lens_samples,
            seed: config.seed,
            bucket_size: config.bucket_size,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.screen_samples.len()
    }

    /// Linear radiance of pixel (x, y); row 0 is the bottom of the image.
    pub fn render_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
        let mut color = Color::ZERO;
        let mut weight = 0.0;

        for (screen, lens) in self.screen_samples.iter().zip(&self.lens_samples) {
            let ray = self.camera.generate_ray(x, y, *screen, *lens);
            let radiance = match &self.technique {
                Technique::Path(tracer) => tracer.radiance(&ray, self.scene, self.env, rng),
                Technique::Scatter(tracer) => {
                    tracer.scatter_radiance(&ray, self.scene, self.env, rng)
                }
                Technique::Ibl { shader, maps } => {
                    shader.radiance(&ray, self.scene, self.env, maps)
                }
            };
            let w = self.filter.weight(*screen);
            color += w * radiance;
            weight += w;
        }

        if weight > EPSILON {
            color / weight
        } else {
            color
        }
    }

    /// Render the whole image. `name` only labels the log lines.
    pub fn render(&self, name: &str) -> ImageBuffer {
        let width = self.camera.width();
        let height = self.camera.height();
        log::info!(
            "start render {} ({}, {}x{}, {} spp) ...",
            name,
            self.technique.name(),
            width,
            height,
            self.samples_per_pixel()
        );
        let start = Instant::now();

        let buckets = generate_buckets(width, height, self.bucket_size);
        let results: Vec<BucketResult> = buckets
            .par_iter()
            .map(|bucket| {
                let mut rng = StdRng::seed_from_u64(bucket_seed(self.seed, bucket.index));
                BucketResult::new(*bucket, render_bucket(bucket, self, &mut rng))
            })
            .collect();

        let mut image = ImageBuffer::new(width, height);
        for result in &results {
            image.write_bucket(result);
        }

        log::info!("done ({} ms)", start.elapsed().as_millis());
        image
    }
}

/// Seed of one bucket's path stream.
fn bucket_seed(seed: u64, index: usize) -> u64 {
    stream_seed(seed, BUCKET_STREAM + index as u64)
}

/// Linear radiance per pixel, row 0 at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (i, color) in result.pixels.iter().enumerate() {
            let x = bucket.x + i as u32 % bucket.width;
            let y = bucket.y + i as u32 / bucket.width;
            self.set(x, y, *color);
        }
    }

    /// sRGB-encoded RGBA bytes, top row first.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                bytes.extend_from_slice(&color_to_rgba(self.get(x, y)));
            }
        }
        bytes
    }

    /// Linear radiance, top row first.
    pub fn to_radiance_image(&self) -> ImageIoResult<RadianceImage> {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                pixels.push(self.get(x, y));
            }
        }
        RadianceImage::new(self.width, self.height, pixels)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> ImageIoResult<()> {
        save_rgba_png(path, self.width, self.height, self.to_rgba())
    }

    pub fn save_hdr(&self, path: impl AsRef<Path>) -> ImageIoResult<()> {
        self.to_radiance_image()?.save_hdr(path)
    }
}
