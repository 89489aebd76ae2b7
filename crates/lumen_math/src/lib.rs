// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod interval;
mod ray;
mod scalar;

pub use interval::Interval;
pub use ray::Ray;
pub use scalar::{equal, is_zero, reflect, refract, saturate, schlick, EPSILON};
