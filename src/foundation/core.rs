use crate::foundation::error::{StrataError, StrataResult};

pub use kurbo::{Point, Vec2};

/// Layer identity within a [`crate::Document`].
///
/// `-1` marks a layer that has not been inserted into a document yet. Once assigned, IDs are
/// unique within their document and double as z-order: lower IDs are drawn first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub i64);

impl LayerId {
    /// Marker for layers that are not part of a document.
    pub const UNASSIGNED: LayerId = LayerId(-1);

    /// Return `true` for non-negative IDs.
    pub fn is_assigned(self) -> bool {
        self.0 >= 0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document canvas dimensions in pixels.
///
/// Zero in either dimension is allowed and renders to an empty buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a canvas of `width x height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Build a canvas from signed dimensions, rejecting negative values.
    pub fn from_signed(width: i64, height: i64) -> StrataResult<Self> {
        let w = u32::try_from(width).map_err(|_| {
            StrataError::invalid_geometry(format!("canvas width {width} is out of range"))
        })?;
        let h = u32::try_from(height).map_err(|_| {
            StrataError::invalid_geometry(format!("canvas height {height} is out of range"))
        })?;
        Ok(Self::new(w, h))
    }
}

/// Clamp a normalized sample into `[0, 1]`. NaN maps to `0`.
pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Convert a normalized sample to an 8-bit channel value.
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

/// Convert an 8-bit channel value to a normalized sample.
pub(crate) fn u8_to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
