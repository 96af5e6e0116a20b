//! CPU rasterization: surfaces, beams and the phosphor glow stage.

pub mod beam;
pub mod blur;
pub mod color;
pub mod glow;
pub mod raster;
pub mod surface;

pub use glow::GlowCompositor;
pub use surface::{BlendMode, Rgb, Rgba8, Surface};
