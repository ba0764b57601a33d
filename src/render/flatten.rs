use crate::foundation::core::clamp_unit;
use crate::raster::buffer::{Channels, PixelBuffer};

/// Opaque white, the usual preview backdrop.
pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Composite straight-alpha pixels over a solid color and drop alpha.
///
/// RGB input is already opaque and is returned as is. Raw RGBA renders stay lossless; call
/// this only where a consumer wants an opaque preview.
pub fn flatten_onto(img: &PixelBuffer, background: [f32; 3]) -> PixelBuffer {
    if img.channels() == Channels::Rgb {
        return img.clone();
    }
    let bg = background.map(clamp_unit);
    let mut rgb = Vec::with_capacity(img.samples().len() / 4 * 3);
    for px in img.samples().chunks_exact(4) {
        let a = px[3];
        for i in 0..3 {
            rgb.push(clamp_unit(px[i] * a + bg[i] * (1.0 - a)));
        }
    }
    PixelBuffer::from_parts(img.width(), img.height(), Channels::Rgb, rgb)
}

/// [`flatten_onto`] a white background.
pub fn flatten_over_white(img: &PixelBuffer) -> PixelBuffer {
    flatten_onto(img, WHITE)
}

#[cfg(test)]
#[path = "../../tests/unit/render/flatten.rs"]
mod tests;
