use std::sync::Arc;

use crate::foundation::core::clamp_unit;
use crate::foundation::error::{StrataError, StrataResult};

/// Channel layout of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Channels {
    /// Three color channels, alpha implicitly opaque.
    Rgb,
    /// Three color channels plus straight (non-premultiplied) alpha.
    Rgba,
}

impl Channels {
    /// Number of samples per pixel.
    pub fn count(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Map a sample count to a layout. Only 3 and 4 are valid buffer layouts.
    pub fn from_count(n: usize) -> StrataResult<Self> {
        match n {
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            _ => Err(StrataError::malformed_image(format!(
                "unsupported channel count {n} (expected 3 or 4)"
            ))),
        }
    }
}

/// Normalized image buffer: row-major, tightly packed `f32` samples in `[0, 1]`.
///
/// Samples are shared behind an [`Arc`]; cloning is cheap and writes go through
/// copy-on-write, so compositing into a clone never changes a buffer another holder sees.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: Channels,
    samples: Arc<Vec<f32>>,
}

impl PixelBuffer {
    /// Wrap raw samples, validating the length and clamping every sample into `[0, 1]`.
    pub fn new(
        width: u32,
        height: u32,
        channels: Channels,
        mut samples: Vec<f32>,
    ) -> StrataResult<Self> {
        let expected = sample_len(width, height, channels)?;
        if samples.len() != expected {
            return Err(StrataError::malformed_image(format!(
                "{width}x{height} {channels:?} buffer needs {expected} samples, got {}",
                samples.len()
            )));
        }
        for s in &mut samples {
            *s = clamp_unit(*s);
        }
        Ok(Self {
            width,
            height,
            channels,
            samples: Arc::new(samples),
        })
    }

    /// Wrap samples the caller already produced in range and with the right length.
    pub(crate) fn from_parts(width: u32, height: u32, channels: Channels, samples: Vec<f32>) -> Self {
        debug_assert_eq!(
            Some(samples.len()),
            sample_len(width, height, channels).ok()
        );
        Self {
            width,
            height,
            channels,
            samples: Arc::new(samples),
        }
    }

    /// Fully transparent RGBA buffer.
    ///
    /// Sizes above [`MAX_SAMPLES`] yield an empty `0x0` buffer; use
    /// [`PixelBuffer::try_transparent`] to get the error instead.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; 4])
    }

    /// RGBA buffer where every pixel is `rgba`.
    ///
    /// Sizes above [`MAX_SAMPLES`] yield an empty `0x0` buffer; use
    /// [`PixelBuffer::try_filled`] to get the error instead.
    pub fn filled(width: u32, height: u32, rgba: [f32; 4]) -> Self {
        Self::try_filled(width, height, rgba).unwrap_or_else(|error| {
            tracing::warn!(%error, "pixel buffer too large, using an empty buffer");
            Self::from_parts(0, 0, Channels::Rgba, Vec::new())
        })
    }

    /// Fully transparent RGBA buffer, or [`StrataError::InvalidGeometry`] when the size
    /// exceeds [`MAX_SAMPLES`].
    pub fn try_transparent(width: u32, height: u32) -> StrataResult<Self> {
        Self::try_filled(width, height, [0.0; 4])
    }

    /// RGBA buffer where every pixel is `rgba`, or [`StrataError::InvalidGeometry`] when the
    /// size exceeds [`MAX_SAMPLES`].
    pub fn try_filled(width: u32, height: u32, rgba: [f32; 4]) -> StrataResult<Self> {
        let len = sample_len(width, height, Channels::Rgba)?;
        let px = rgba.map(clamp_unit);
        let mut samples = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            samples.extend_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            channels: Channels::Rgba,
            samples: Arc::new(samples),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channel layout.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Return `true` when the buffer covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw samples, row-major.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable samples. Detaches from other holders first if the storage is shared.
    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.samples).as_mut_slice()
    }

    /// Read one pixel as RGBA; RGB buffers report alpha `1.0`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels.count();
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * c;
        let s = &self.samples[idx..idx + c];
        Some(match self.channels {
            Channels::Rgb => [s[0], s[1], s[2], 1.0],
            Channels::Rgba => [s[0], s[1], s[2], s[3]],
        })
    }

    /// RGBA view of this buffer. RGB input gains an opaque alpha channel.
    pub fn to_rgba(&self) -> PixelBuffer {
        match self.channels {
            Channels::Rgba => self.clone(),
            Channels::Rgb => {
                let mut samples = Vec::with_capacity(self.samples.len() / 3 * 4);
                for px in self.samples.chunks_exact(3) {
                    samples.extend_from_slice(&[px[0], px[1], px[2], 1.0]);
                }
                Self::from_parts(self.width, self.height, Channels::Rgba, samples)
            }
        }
    }

    /// Return `true` when both buffers have equal width and height.
    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.dimensions() == other.dimensions()
    }

    pub(crate) fn require_same_size(&self, other: &PixelBuffer, what: &str) -> StrataResult<()> {
        if self.same_size(other) {
            return Ok(());
        }
        Err(StrataError::invalid_geometry(format!(
            "{what} expects equal-size buffers, got {}x{} and {}x{}",
            self.width, self.height, other.width, other.height
        )))
    }
}

/// Largest sample count a buffer may hold (4 GiB of `f32`).
pub const MAX_SAMPLES: usize = 1 << 30;

/// Sample count for a buffer, rejecting sizes above [`MAX_SAMPLES`].
pub(crate) fn sample_len(width: u32, height: u32, channels: Channels) -> StrataResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels.count()))
        .filter(|&n| n <= MAX_SAMPLES)
        .ok_or_else(|| {
            StrataError::invalid_geometry(format!(
                "{width}x{height} {channels:?} buffer exceeds {MAX_SAMPLES} samples"
            ))
        })
}

#[cfg(test)]
#[path = "../../tests/unit/raster/buffer.rs"]
mod tests;
