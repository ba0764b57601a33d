use crate::blend::mode::BlendMode;
use crate::document::layer::{Layer, Metadata};
use crate::foundation::core::{Point, Vec2};
use crate::raster::buffer::PixelBuffer;

/// Partial layer update. `None` fields keep the layer's current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerPatch {
    /// New name.
    pub name: Option<String>,
    /// Replacement pixels; the layer size follows the new image and RGB gains opaque alpha.
    pub image: Option<PixelBuffer>,
    /// New anchor point position.
    pub position: Option<Point>,
    /// New anchor fractions.
    pub anchor: Option<Vec2>,
    /// New opacity, stored as given.
    pub opacity: Option<f32>,
    /// New visibility.
    pub visible: Option<bool>,
    /// New blend mode.
    pub blend_mode: Option<BlendMode>,
    /// Replaces the whole metadata bag.
    pub metadata: Option<Metadata>,
}

impl LayerPatch {
    /// Return `true` when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Return a copy of `layer` with the fields present in `patch` overwritten.
///
/// The input layer is left untouched.
pub fn update_layer(layer: &Layer, patch: LayerPatch) -> Layer {
    let LayerPatch {
        name,
        image,
        position,
        anchor,
        opacity,
        visible,
        blend_mode,
        metadata,
    } = patch;

    let mut out = layer.clone();
    if let Some(name) = name {
        out = out.with_name(name);
    }
    if let Some(image) = image {
        out = out.with_image(image);
    }
    if let Some(position) = position {
        out = out.with_position(position);
    }
    if let Some(anchor) = anchor {
        out = out.with_anchor(anchor);
    }
    if let Some(opacity) = opacity {
        out = out.with_opacity(opacity);
    }
    if let Some(visible) = visible {
        out = out.with_visible(visible);
    }
    if let Some(blend_mode) = blend_mode {
        out = out.with_blend_mode(blend_mode);
    }
    if let Some(metadata) = metadata {
        out = out.with_metadata(metadata);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/document/patch.rs"]
mod tests;
