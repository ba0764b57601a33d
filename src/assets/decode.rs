use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::StrataResult;
use crate::raster::buffer::{Channels, PixelBuffer};

/// Decode an encoded image (PNG, JPEG, ...) into a pixel buffer.
///
/// Images with an alpha channel decode to RGBA, everything else to RGB.
pub fn decode_image(bytes: &[u8]) -> StrataResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    PixelBuffer::from_dynamic_image(&dyn_img)
}

/// Encode a buffer as PNG, keeping its channel layout.
pub fn encode_png(buf: &PixelBuffer) -> StrataResult<Vec<u8>> {
    let img = match buf.channels() {
        Channels::Rgba => image::DynamicImage::ImageRgba8(buf.to_rgba_image()?),
        Channels::Rgb => image::DynamicImage::ImageRgb8(buf.to_rgb_image()?),
    };
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
