//! Conversions between [`PixelBuffer`] and external encodings.
//!
//! Producers hand the core either 8-bit bytes, NHWC/HWC float tensors (the layout image
//! generation pipelines emit), or decoded `image` crate values. One-channel input is expanded to
//! RGB here so that the rest of the crate only ever sees 3 or 4 channels.

use anyhow::Context as _;

use crate::foundation::core::{u8_to_unit, unit_to_u8};
use crate::foundation::error::{StrataError, StrataResult};
use crate::raster::buffer::{Channels, PixelBuffer};

impl PixelBuffer {
    /// Build a buffer from 8-bit samples with 1 (gray), 3 (RGB) or 4 (RGBA) channels.
    pub fn from_bytes(width: u32, height: u32, channels: usize, bytes: &[u8]) -> StrataResult<Self> {
        let samples: Vec<f32> = bytes.iter().map(|&b| u8_to_unit(b)).collect();
        Self::from_samples_any(width, height, channels, samples)
    }

    /// Build a buffer from straight RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> StrataResult<Self> {
        Self::from_bytes(width, height, 4, bytes)
    }

    /// Build a buffer from RGB8 bytes.
    pub fn from_rgb8(width: u32, height: u32, bytes: &[u8]) -> StrataResult<Self> {
        Self::from_bytes(width, height, 3, bytes)
    }

    /// Build a buffer from an `[h, w, c]` or `[1, h, w, c]` float tensor.
    pub fn from_hwc(shape: &[usize], data: &[f32]) -> StrataResult<Self> {
        let (h, w, c) = match *shape {
            [h, w, c] => (h, w, c),
            [1, h, w, c] => (h, w, c),
            [n, _, _, _] => {
                return Err(StrataError::malformed_image(format!(
                    "tensor batch of {n} images, expected exactly one"
                )));
            }
            _ => {
                return Err(StrataError::malformed_image(format!(
                    "tensor shape {shape:?} is not HWC or NHWC"
                )));
            }
        };
        let width = u32::try_from(w)
            .map_err(|_| StrataError::invalid_geometry(format!("tensor width {w} too large")))?;
        let height = u32::try_from(h)
            .map_err(|_| StrataError::invalid_geometry(format!("tensor height {h} too large")))?;
        Self::from_samples_any(width, height, c, data.to_vec())
    }

    /// Export as a `[1, h, w, c]` tensor.
    pub fn to_nhwc(&self) -> ([usize; 4], Vec<f32>) {
        (
            [
                1,
                self.height() as usize,
                self.width() as usize,
                self.channels().count(),
            ],
            self.samples().to_vec(),
        )
    }

    /// Straight RGBA8 bytes; RGB buffers are exported with opaque alpha.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.to_rgba().samples().iter().map(|&s| unit_to_u8(s)).collect()
    }

    /// RGB8 bytes. Only valid for RGB buffers; flatten RGBA buffers first.
    pub fn to_rgb8(&self) -> StrataResult<Vec<u8>> {
        if self.channels() != Channels::Rgb {
            return Err(StrataError::malformed_image(
                "RGB export of an RGBA buffer would discard alpha; flatten it first",
            ));
        }
        Ok(self.samples().iter().map(|&s| unit_to_u8(s)).collect())
    }

    /// Convert a decoded image, keeping alpha when the source has it.
    pub fn from_dynamic_image(img: &image::DynamicImage) -> StrataResult<Self> {
        if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            Self::from_rgba8(w, h, rgba.as_raw())
        } else {
            let rgb = img.to_rgb8();
            let (w, h) = rgb.dimensions();
            Self::from_rgb8(w, h, rgb.as_raw())
        }
    }

    /// Convert to an `image` crate RGBA8 image.
    pub fn to_rgba_image(&self) -> StrataResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width(), self.height(), self.to_rgba8())
            .context("assemble rgba8 image")
            .map_err(StrataError::from)
    }

    /// Convert an RGB buffer to an `image` crate RGB8 image.
    pub fn to_rgb_image(&self) -> StrataResult<image::RgbImage> {
        image::RgbImage::from_raw(self.width(), self.height(), self.to_rgb8()?)
            .context("assemble rgb8 image")
            .map_err(StrataError::from)
    }

    fn from_samples_any(
        width: u32,
        height: u32,
        channels: usize,
        samples: Vec<f32>,
    ) -> StrataResult<Self> {
        if channels == 1 {
            let mut rgb = Vec::with_capacity(samples.len() * 3);
            for &v in &samples {
                rgb.extend_from_slice(&[v, v, v]);
            }
            return Self::new(width, height, Channels::Rgb, rgb);
        }
        Self::new(width, height, Channels::from_count(channels)?, samples)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/convert.rs"]
mod tests;
