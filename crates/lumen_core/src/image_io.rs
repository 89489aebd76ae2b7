//! Radiance image loading and saving.
//!
//! Light probes come in as Radiance HDR (or anything the `image` crate can
//! decode to float RGB). Renders and debug maps go out as PNG or HDR.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::codecs::hdr::{HdrDecoder, HdrEncoder};
use image::{Rgb, RgbaImage};
use lumen_math::Vec3;
use thiserror::Error;

/// Errors that can occur while reading or writing images.
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Pixel buffer holds {actual} values, expected {expected} for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Image has zero size: {0}x{1}")]
    Empty(u32, u32),
}

pub type ImageIoResult<T> = Result<T, ImageIoError>;

/// A dense grid of linear radiance values, row-major, top row first.
#[derive(Clone, Debug)]
pub struct RadianceImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl RadianceImage {
    /// Wrap an existing pixel buffer, checking its size.
    pub fn new(width: u32, height: u32, pixels: Vec<Vec3>) -> ImageIoResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImageIoError::Empty(width, height));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ImageIoError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Write as Radiance HDR.
    pub fn save_hdr(&self, path: impl AsRef<Path>) -> ImageIoResult<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        let data: Vec<Rgb<f32>> = self.pixels.iter().map(|p| Rgb([p.x, p.y, p.z])).collect();
        HdrEncoder::new(writer).encode(&data, self.width as usize, self.height as usize)?;
        log::debug!("Wrote HDR {}", path.as_ref().display());
        Ok(())
    }

    /// Write as 8-bit PNG, clamping linear values without tone mapping.
    pub fn save_png(&self, path: impl AsRef<Path>) -> ImageIoResult<()> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            bytes.extend_from_slice(&[quantize(p.x), quantize(p.y), quantize(p.z), 255]);
        }
        save_rgba_png(path, self.width, self.height, bytes)
    }
}

/// Load a radiance image from disk.
///
/// `.hdr` files are decoded straight to float radiance; other formats go
/// through the generic loader and are treated as linear values in [0, 1].
pub fn load_radiance(path: impl AsRef<Path>) -> ImageIoResult<RadianceImage> {
    let path = path.as_ref();
    let load_error = |source| ImageIoError::Load {
        path: path.display().to_string(),
        source,
    };

    let is_hdr = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("hdr"));
    let (width, height, pixels) = if is_hdr {
        decode_hdr(path).map_err(load_error)?
    } else {
        let rgb = image::open(path).map_err(load_error)?.into_rgb32f();
        let (width, height) = rgb.dimensions();
        let pixels = rgb.pixels().map(|p| Vec3::new(p[0], p[1], p[2])).collect();
        (width, height, pixels)
    };

    log::info!("Loaded radiance image {} ({}x{})", path.display(), width, height);
    RadianceImage::new(width, height, pixels)
}

/// Decode Radiance RGBE without the generic loader's conversion to LDR.
fn decode_hdr(path: &Path) -> image::ImageResult<(u32, u32, Vec<Vec3>)> {
    let reader = BufReader::new(File::open(path).map_err(image::ImageError::IoError)?);
    let decoder = HdrDecoder::new(reader)?;
    let meta = decoder.metadata();
    let pixels = decoder
        .read_image_hdr()?
        .into_iter()
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    Ok((meta.width, meta.height, pixels))
}

/// Write 8-bit RGBA bytes as PNG.
pub fn save_rgba_png(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
) -> ImageIoResult<()> {
    let actual = bytes.len();
    let img = RgbaImage::from_raw(width, height, bytes).ok_or(ImageIoError::BufferSize {
        width,
        height,
        expected: width as usize * height as usize * 4,
        actual,
    })?;
    img.save(path.as_ref())?;
    log::debug!("Wrote PNG {}", path.as_ref().display());
    Ok(())
}

/// Linear value to byte, clamped.
fn quantize(x: f32) -> u8 {
    (x * 255.99).clamp(0.0, 255.0) as u8
}
