//! Color helpers: luminance and the sRGB transfer curve.

use lumen_math::saturate;

use crate::material::Color;

/// Luminance of a color (Rec. 709).
#[inline]
pub fn luminance(c: Color) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

/// Encode one linear channel with the sRGB curve. Values above one pass
/// through unchanged and are clamped later.
#[inline]
pub fn linear_to_srgb_channel(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else if x <= 0.003_130_8 {
        x * 12.92
    } else if x <= 1.0 {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    } else {
        x
    }
}

/// Decode one sRGB channel to linear.
#[inline]
pub fn srgb_to_linear_channel(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else if x <= 0.040_45 {
        x / 12.92
    } else if x <= 1.0 {
        ((x + 0.055) / 1.055).powf(2.4)
    } else {
        x
    }
}

pub fn linear_to_srgb(c: Color) -> Color {
    Color::new(
        linear_to_srgb_channel(c.x),
        linear_to_srgb_channel(c.y),
        linear_to_srgb_channel(c.z),
    )
}

pub fn srgb_to_linear(c: Color) -> Color {
    Color::new(
        srgb_to_linear_channel(c.x),
        srgb_to_linear_channel(c.y),
        srgb_to_linear_channel(c.z),
    )
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let c = linear_to_srgb(color);
    [quantize(c.x), quantize(c.y), quantize(c.z), 255]
}

#[inline]
fn quantize(x: f32) -> u8 {
    (255.99 * saturate(x)) as u8
}
